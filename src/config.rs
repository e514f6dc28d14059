use std::env;

use url::Url;

pub const DEFAULT_LISTING_URL: &str = "https://www.sungshin.ac.kr/main_kor/11095/subview.do";
pub const DEFAULT_BASE_DOMAIN: &str = "https://www.sungshin.ac.kr";
pub const DEFAULT_KEYWORD: &str = "운정교내식당";

/// Crawl and serve settings, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bulletin-board listing page where the weekly post is linked from.
    pub listing_url: Url,
    /// Base for resolving relative post hrefs.
    pub base_domain: Url,
    /// Substring that identifies the cafeteria's post among listing titles.
    pub keyword: String,
    pub host: String,
    pub port: String,
    /// Public URL prefix for preview-image links, when the deployment knows it.
    pub public_base_url: Option<String>,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        let listing_url = env::var("TARGET_URL")
            .unwrap_or_else(|_| DEFAULT_LISTING_URL.to_string())
            .parse()?;
        let base_domain = env::var("BASE_DOMAIN")
            .unwrap_or_else(|_| DEFAULT_BASE_DOMAIN.to_string())
            .parse()?;
        let keyword = env::var("CAFETERIA_KEYWORD").unwrap_or_else(|_| DEFAULT_KEYWORD.to_string());
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT").unwrap_or_else(|_| "5005".to_string());
        let public_base_url = env::var("BASE_URL")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());
        Ok(Self {
            listing_url,
            base_domain,
            keyword,
            host,
            port,
            public_base_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_urls_parse() {
        DEFAULT_LISTING_URL.parse::<Url>().unwrap();
        let base: Url = DEFAULT_BASE_DOMAIN.parse().unwrap();
        assert_eq!(base.scheme(), "https");
    }
}
