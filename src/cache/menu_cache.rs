use chrono::NaiveDate;

use super::{CachedMenu, Store};
use crate::og_image;
use crate::resolve::{MenuEntry, Resolver};

/// Cache-through front for the resolver. Each date is crawled at most
/// once per process unless the store forgets it. Clones share the store.
#[derive(Debug, Clone)]
pub struct MenuCache {
    store: Store,
    resolver: Resolver,
}

impl MenuCache {
    pub const fn new(store: Store, resolver: Resolver) -> Self {
        Self { store, resolver }
    }

    /// Menu for `date`, resolving and caching on a miss.
    ///
    /// `Absent` is never written back, so the next call crawls again.
    /// Concurrent misses may both crawl; both write the same answer.
    pub async fn menu_for(&self, date: NaiveDate) -> MenuEntry {
        match self.store.load_menu(date).await {
            // An open day with zero dishes never comes out of the
            // resolver, so an empty cached list is stale hand-written
            // data. Treat it as a miss.
            Some(CachedMenu::Items(items)) if items.is_empty() => {
                log::warn!("Discarding empty cached menu for {date}");
            }
            Some(cached) => return cached.into(),
            None => {}
        }
        let entry = self.resolver.resolve(date).await;
        if let Some(menu) = CachedMenu::from_entry(&entry) {
            self.store.save_menu(date, &menu).await;
        }
        entry
    }

    /// Preview image for `date`, rendering and caching on a miss. Cards
    /// for absent menus are rendered fresh each time instead of cached,
    /// mirroring the menu rule.
    pub async fn image_for(&self, date: NaiveDate) -> Option<Vec<u8>> {
        if let Some(png) = self.store.load_image(date).await {
            return Some(png);
        }
        let entry = self.menu_for(date).await;
        match og_image::render_png(date, &entry) {
            Ok(png) => {
                if !matches!(entry, MenuEntry::Absent) {
                    self.store.save_image(date, &png).await;
                }
                Some(png)
            }
            Err(e) => {
                log::error!("Preview image render failed for {date}: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::fetch::make_client;
    use crate::holiday::HolidayCalendar;
    use crate::notify::Notifier;
    use std::fs;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cache_for(listing: &str, base: &str) -> MenuCache {
        let (notifier, _) = Notifier::capture();
        let config = Config {
            listing_url: listing.parse().unwrap(),
            base_domain: base.parse().unwrap(),
            keyword: "운정교내식당".to_owned(),
            host: "127.0.0.1".to_owned(),
            port: "0".to_owned(),
            public_base_url: None,
        };
        let resolver = Resolver::new(make_client(), config, HolidayCalendar::korean(), notifier);
        MenuCache::new(Store::memory(), resolver)
    }

    #[tokio::test]
    async fn test_second_lookup_skips_the_crawl() {
        let mut server = mockito::Server::new_async().await;
        let listing_mock = server
            .mock("GET", "/main_kor/11095/subview.do")
            .with_body(fs::read_to_string("./src/parse/html_examples/listing.html").unwrap())
            .expect(1)
            .create_async()
            .await;
        let post_mock = server
            .mock("GET", "/bbs/main_kor/1095/714605/artclView.do")
            .with_body(fs::read_to_string("./src/parse/html_examples/post.html").unwrap())
            .expect(1)
            .create_async()
            .await;
        let listing = format!("{}/main_kor/11095/subview.do", server.url());
        let cache = cache_for(&listing, &server.url());

        let first = cache.menu_for(date(2024, 2, 26)).await;
        let second = cache.menu_for(date(2024, 2, 26)).await;
        assert_eq!(first, second);
        assert!(matches!(first, MenuEntry::Items(_)));
        listing_mock.assert_async().await;
        post_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_absent_days_are_retried() {
        let mut server = mockito::Server::new_async().await;
        let listing_mock = server
            .mock("GET", "/subview.do")
            .with_body("<html><body><a href=\"/notice/1\">공지</a></body></html>")
            .expect(2)
            .create_async()
            .await;
        let listing = format!("{}/subview.do", server.url());
        let cache = cache_for(&listing, &server.url());

        assert_eq!(cache.menu_for(date(2024, 2, 26)).await, MenuEntry::Absent);
        assert_eq!(cache.menu_for(date(2024, 2, 26)).await, MenuEntry::Absent);
        listing_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_closed_day_is_cached_with_sentinel() {
        let cache = cache_for("http://127.0.0.1:9/subview.do", "http://127.0.0.1:9");
        let saturday = date(2024, 2, 24);
        assert_eq!(cache.menu_for(saturday).await, MenuEntry::Closed);
        assert_eq!(
            cache.store.load_menu(saturday).await,
            Some(CachedMenu::Closed)
        );
    }

    #[tokio::test]
    async fn test_empty_cached_list_is_a_miss() {
        let cache = cache_for("http://127.0.0.1:9/subview.do", "http://127.0.0.1:9");
        let saturday = date(2024, 2, 24);
        cache
            .store
            .save_menu(saturday, &CachedMenu::Items(Vec::new()))
            .await;
        // the stale empty entry is ignored and the closed-day rule wins
        assert_eq!(cache.menu_for(saturday).await, MenuEntry::Closed);
    }

    #[tokio::test]
    async fn test_image_is_rendered_then_cached() {
        let cache = cache_for("http://127.0.0.1:9/subview.do", "http://127.0.0.1:9");
        let saturday = date(2024, 2, 24);
        assert!(cache.store.load_image(saturday).await.is_none());
        let png = cache.image_for(saturday).await.unwrap();
        assert!(png.starts_with(b"\x89PNG"));
        assert_eq!(cache.store.load_image(saturday).await, Some(png));
    }
}
