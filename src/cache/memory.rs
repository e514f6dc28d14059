use std::collections::HashMap;

use chrono::NaiveDate;
use futures_locks::RwLock;

use super::CachedMenu;

/// In-process store for deployments without a cache directory. Clones
/// share the same maps.
#[derive(Debug, Clone)]
pub struct MemStore {
    menus: RwLock<HashMap<NaiveDate, CachedMenu>>,
    images: RwLock<HashMap<NaiveDate, Vec<u8>>>,
}

impl MemStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            menus: RwLock::new(HashMap::new()),
            images: RwLock::new(HashMap::new()),
        }
    }

    pub async fn load_menu(&self, date: NaiveDate) -> Option<CachedMenu> {
        self.menus.read().await.get(&date).cloned()
    }

    pub async fn save_menu(&self, date: NaiveDate, menu: &CachedMenu) {
        self.menus.write().await.insert(date, menu.clone());
    }

    pub async fn load_image(&self, date: NaiveDate) -> Option<Vec<u8>> {
        self.images.read().await.get(&date).cloned()
    }

    pub async fn save_image(&self, date: NaiveDate, png: &[u8]) {
        self.images.write().await.insert(date, png.to_vec());
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_readers_and_writers() {
        let store = MemStore::new();
        let day = NaiveDate::from_ymd_opt(2024, 2, 26).unwrap();
        store
            .save_menu(day, &CachedMenu::Items(vec!["비빔밥".to_owned()]))
            .await;
        tokio_scoped::scope(|scope| {
            scope.spawn(async {
                store.save_menu(day, &CachedMenu::Closed).await;
            });
            for _ in 0..10 {
                scope.spawn(async {
                    let menu = store.load_menu(day).await;
                    assert!(menu.is_some());
                });
            }
        });
        let settled = store.load_menu(day).await;
        assert!(settled.is_some());
    }
}
