use scraper::Html;
use url::Url;

use crate::static_selector;

/// Finds the weekly menu post on the bulletin-board listing page.
///
/// Scans anchors in document order and returns the href of the first one
/// whose visible text contains `keyword`, resolved against `base`. Anchors
/// without an href are skipped.
pub fn find_post_url(document: &Html, keyword: &str, base: &Url) -> Option<Url> {
    static_selector!(ANCHOR_SELECTOR <- "a");
    for anchor in document.select(&ANCHOR_SELECTOR) {
        let text: String = anchor.text().collect();
        if !text.contains(keyword) {
            continue;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        match base.join(href) {
            Ok(url) => return Some(url),
            Err(e) => log::warn!("Ignoring malformed post link {href:?}: {e}"),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn base() -> Url {
        "https://www.sungshin.ac.kr".parse().unwrap()
    }

    #[test]
    fn test_finds_post_by_keyword() {
        let html = fs::read_to_string("./src/parse/html_examples/listing.html").unwrap();
        let document = Html::parse_document(&html);
        let url = find_post_url(&document, "운정교내식당", &base())
            .expect("the example listing should contain the post");
        assert_eq!(
            url.as_str(),
            "https://www.sungshin.ac.kr/bbs/main_kor/1095/714605/artclView.do"
        );
    }

    #[test]
    fn test_missing_keyword_yields_none() {
        let html = fs::read_to_string("./src/parse/html_examples/listing.html").unwrap();
        let document = Html::parse_document(&html);
        assert!(find_post_url(&document, "수정캠퍼스식당", &base()).is_none());
    }

    #[test]
    fn test_skips_anchor_without_href() {
        let document = Html::parse_document(
            "<body>\
             <a>운정교내식당 식단 안내</a>\
             <a href=\"/bbs/1/artclView.do\">운정교내식당 주간식단</a>\
             </body>",
        );
        let url = find_post_url(&document, "운정교내식당", &base()).unwrap();
        assert_eq!(url.path(), "/bbs/1/artclView.do");
    }

    #[test]
    fn test_keyword_split_across_child_elements() {
        let document = Html::parse_document(
            "<a href=\"/bbs/2/artclView.do\"><strong>운정교내식당</strong> 주간메뉴</a>",
        );
        assert!(find_post_url(&document, "운정교내식당", &base()).is_some());
    }
}
