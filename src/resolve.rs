use chrono::{Datelike, NaiveDate, Weekday};
use scraper::Html;

use crate::config::Config;
use crate::fetch;
use crate::holiday::HolidayCalendar;
use crate::notify::Notifier;
use crate::parse::{self, WeeklyTable};

/// Outcome of resolving one date's menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    /// Dishes served that day, in board order. Never empty.
    Items(Vec<String>),
    /// The cafeteria is known not to operate on the date.
    Closed,
    /// No usable data, distinct from a confirmed closure.
    Absent,
}

/// Composes the fetcher, post lookup and table extraction into a single
/// menu-for-date call.
#[derive(Debug, Clone)]
pub struct Resolver {
    client: reqwest::Client,
    config: Config,
    holidays: HolidayCalendar,
    notifier: Notifier,
}

impl Resolver {
    pub const fn new(
        client: reqwest::Client,
        config: Config,
        holidays: HolidayCalendar,
        notifier: Notifier,
    ) -> Self {
        Self {
            client,
            config,
            holidays,
            notifier,
        }
    }

    /// Resolves the menu for `date`.
    ///
    /// Weekends and holidays return [`MenuEntry::Closed`] without touching
    /// the network. Crawl faults are reported once through the notifier and
    /// surface as [`MenuEntry::Absent`]; this call never fails.
    pub async fn resolve(&self, date: NaiveDate) -> MenuEntry {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) || self.holidays.is_holiday(date)
        {
            return MenuEntry::Closed;
        }
        match self.crawl(date).await {
            Ok(Some(items)) => MenuEntry::Items(items),
            Ok(None) => MenuEntry::Absent,
            Err(e) => {
                self.notifier
                    .report(&format!("Menu crawl failed for {date}: {e}"));
                MenuEntry::Absent
            }
        }
    }

    /// Two-request crawl: listing page, then the located post. `Ok(None)`
    /// covers the routine misses (post not published, no menu grid, date
    /// outside the posted week, nothing left after filtering).
    async fn crawl(&self, date: NaiveDate) -> crate::Result<Option<Vec<String>>> {
        let listing = fetch::get_text(&self.client, self.config.listing_url.as_str()).await?;
        let post_url = {
            let document = Html::parse_document(&listing);
            parse::find_post_url(&document, &self.config.keyword, &self.config.base_domain)
        };
        let Some(post_url) = post_url else {
            log::warn!(
                "No post matching {:?} on the listing page",
                self.config.keyword
            );
            return Ok(None);
        };

        let post_page = fetch::get_text(&self.client, post_url.as_str()).await?;
        let menu = {
            let document = Html::parse_document(&post_page);
            let table = WeeklyTable::from_post_html(&document, date.year());
            if table.is_empty() {
                log::warn!("No weekly menu grid in post {post_url}");
                return Ok(None);
            }
            log::debug!("Parsed menu grid with {} dated columns", table.len());
            table.get(date).map(<[String]>::to_vec)
        };
        match menu {
            Some(items) if !items.is_empty() => Ok(Some(items)),
            Some(_) => {
                log::warn!("Menu for {date} is empty after filtering");
                Ok(None)
            }
            None => {
                log::warn!("Requested date {date} is not in the posted week");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::make_client;
    use std::fs;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_config(listing: &str, base: &str) -> Config {
        Config {
            listing_url: listing.parse().unwrap(),
            base_domain: base.parse().unwrap(),
            keyword: "운정교내식당".to_owned(),
            host: "127.0.0.1".to_owned(),
            port: "0".to_owned(),
            public_base_url: None,
        }
    }

    fn resolver_with(listing: &str, base: &str) -> (Resolver, std::sync::Arc<std::sync::Mutex<Vec<String>>>) {
        let (notifier, sink) = Notifier::capture();
        let resolver = Resolver::new(
            make_client(),
            test_config(listing, base),
            HolidayCalendar::korean(),
            notifier,
        );
        (resolver, sink)
    }

    // An unreachable listing URL: any attempted fetch would fail and be
    // reported, so an empty sink proves the network was never touched.
    const UNREACHABLE: &str = "http://127.0.0.1:9/subview.do";

    #[tokio::test]
    async fn test_weekend_is_closed_without_fetching() {
        let (resolver, sink) = resolver_with(UNREACHABLE, "http://127.0.0.1:9");
        assert_eq!(resolver.resolve(date(2024, 2, 24)).await, MenuEntry::Closed);
        assert_eq!(resolver.resolve(date(2024, 2, 25)).await, MenuEntry::Closed);
        assert!(sink.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_holiday_is_closed_without_fetching() {
        let (resolver, sink) = resolver_with(UNREACHABLE, "http://127.0.0.1:9");
        // 삼일절, a Friday
        assert_eq!(resolver.resolve(date(2024, 3, 1)).await, MenuEntry::Closed);
        assert!(sink.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolves_menu_from_posted_week() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/main_kor/11095/subview.do")
            .with_body(fs::read_to_string("./src/parse/html_examples/listing.html").unwrap())
            .create_async()
            .await;
        server
            .mock("GET", "/bbs/main_kor/1095/714605/artclView.do")
            .with_body(fs::read_to_string("./src/parse/html_examples/post.html").unwrap())
            .create_async()
            .await;
        let listing = format!("{}/main_kor/11095/subview.do", server.url());
        let (resolver, sink) = resolver_with(&listing, &server.url());

        let monday = resolver.resolve(date(2024, 2, 26)).await;
        assert_eq!(
            monday,
            MenuEntry::Items(vec![
                "토스트".to_owned(),
                "우유".to_owned(),
                "비빔밥".to_owned(),
                "된장국".to_owned(),
            ])
        );
        // same source page, same answer
        assert_eq!(resolver.resolve(date(2024, 2, 26)).await, monday);
        assert!(sink.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_post_is_absent_without_report() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/subview.do")
            .with_body("<html><body><a href=\"/notice/1\">등록금 납부 안내</a></body></html>")
            .create_async()
            .await;
        let listing = format!("{}/subview.do", server.url());
        let (resolver, sink) = resolver_with(&listing, &server.url());
        assert_eq!(resolver.resolve(date(2024, 2, 26)).await, MenuEntry::Absent);
        assert!(sink.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_date_outside_posted_week_is_absent() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/main_kor/11095/subview.do")
            .with_body(fs::read_to_string("./src/parse/html_examples/listing.html").unwrap())
            .create_async()
            .await;
        server
            .mock("GET", "/bbs/main_kor/1095/714605/artclView.do")
            .with_body(fs::read_to_string("./src/parse/html_examples/post.html").unwrap())
            .create_async()
            .await;
        let listing = format!("{}/main_kor/11095/subview.do", server.url());
        let (resolver, sink) = resolver_with(&listing, &server.url());
        // the Monday after the posted week
        assert_eq!(resolver.resolve(date(2024, 3, 4)).await, MenuEntry::Absent);
        assert!(sink.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filtered_out_day_is_absent_not_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/subview.do")
            .with_body("<a href=\"/bbs/9/artclView.do\">운정교내식당 주간식단</a>")
            .create_async()
            .await;
        server
            .mock("GET", "/bbs/9/artclView.do")
            .with_body(
                "<table>\
                 <tr><th>2월 26일(월)</th><th>2월 27일(화)</th><th>2월 28일(수)</th></tr>\
                 <tr><td>-</td><td>비빔밥</td><td>칼국수</td></tr>\
                 </table>",
            )
            .create_async()
            .await;
        let listing = format!("{}/subview.do", server.url());
        let (resolver, sink) = resolver_with(&listing, &server.url());
        assert_eq!(resolver.resolve(date(2024, 2, 26)).await, MenuEntry::Absent);
        assert!(sink.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_fetch_reports_exactly_once() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/main_kor/11095/subview.do")
            .with_body(fs::read_to_string("./src/parse/html_examples/listing.html").unwrap())
            .create_async()
            .await;
        let post_mock = server
            .mock("GET", "/bbs/main_kor/1095/714605/artclView.do")
            .with_status(500)
            .expect(3)
            .create_async()
            .await;
        let listing = format!("{}/main_kor/11095/subview.do", server.url());
        let (resolver, sink) = resolver_with(&listing, &server.url());

        assert_eq!(resolver.resolve(date(2024, 2, 26)).await, MenuEntry::Absent);
        post_mock.assert_async().await;
        let reports = sink.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].contains("2024-02-26"));
    }
}
