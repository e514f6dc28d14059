use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::Client;
use tracing::{instrument, Level};

pub const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// The bulletin board serves a stripped page to clients it does not
/// recognize as browsers, so we present a desktop Chrome profile.
static USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
static ACCEPT_LANGUAGE_KO: &str = "ko-KR,ko;q=0.9";

pub fn make_client() -> reqwest::Client {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_KO));
    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .gzip(true)
        .build()
        .expect("client creation should succeed")
}

/// Fetches `url` and returns the body text, retrying transient failures.
/// HTTP error statuses count as failures. After the last attempt the final
/// error is returned.
#[instrument(skip(client), level = Level::TRACE)]
pub async fn get_text(client: &Client, url: &str) -> Result<String, reqwest::Error> {
    let mut attempt = 1;
    loop {
        let start = std::time::Instant::now();
        match send(client, url).await {
            Ok(text) => {
                log::trace!("Got page text in\t{:?}", start.elapsed());
                return Ok(text);
            }
            Err(e) => {
                log::warn!("Fetch failed ({attempt}/{MAX_ATTEMPTS}) for {url}: {e}");
                if attempt >= MAX_ATTEMPTS {
                    return Err(e);
                }
                attempt += 1;
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }
}

async fn send(client: &Client, url: &str) -> Result<String, reqwest::Error> {
    let response = client.get(url).send().await?.error_for_status()?;
    response.text().await
}
