mod local;
mod memory;
mod menu_cache;

use std::fmt;
use std::path::Path;

use chrono::NaiveDate;
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::resolve::MenuEntry;

use local::FileStore;
use memory::MemStore;
pub use menu_cache::MenuCache;

/// Sentinel the store uses for a confirmed closure, kept in the wire
/// format older cache files already use.
const CLOSED_SENTINEL: &str = "휴무";

/// A cacheable day: either the dish list or a confirmed closure.
/// `Absent` days are deliberately not representable here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedMenu {
    Items(Vec<String>),
    Closed,
}

impl CachedMenu {
    fn from_entry(entry: &MenuEntry) -> Option<Self> {
        match entry {
            MenuEntry::Items(items) => Some(Self::Items(items.clone())),
            MenuEntry::Closed => Some(Self::Closed),
            MenuEntry::Absent => None,
        }
    }
}

impl From<CachedMenu> for MenuEntry {
    fn from(cached: CachedMenu) -> Self {
        match cached {
            CachedMenu::Items(items) => Self::Items(items),
            CachedMenu::Closed => Self::Closed,
        }
    }
}

// Serialized as either a JSON array of dish names or the bare closed
// sentinel string.
impl Serialize for CachedMenu {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Items(items) => items.serialize(serializer),
            Self::Closed => serializer.serialize_str(CLOSED_SENTINEL),
        }
    }
}

impl<'de> Deserialize<'de> for CachedMenu {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MenuVisitor;

        impl<'de> Visitor<'de> for MenuVisitor {
            type Value = CachedMenu;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a list of menu items or the string {CLOSED_SENTINEL:?}")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                if v == CLOSED_SENTINEL {
                    Ok(CachedMenu::Closed)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element::<String>()? {
                    items.push(item);
                }
                Ok(CachedMenu::Items(items))
            }
        }

        deserializer.deserialize_any(MenuVisitor)
    }
}

/// Where resolved menus and rendered preview images live between requests.
#[derive(Debug, Clone)]
pub enum Store {
    Local(FileStore),
    Memory(MemStore),
}

impl Store {
    #[inline]
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(MemStore::new())
    }

    #[inline]
    pub async fn local(p: impl AsRef<Path>) -> crate::Result<Self> {
        FileStore::open(p).await.map(Self::Local)
    }

    /// A failed or corrupt read is a miss; the resolver just runs again.
    pub async fn load_menu(&self, date: NaiveDate) -> Option<CachedMenu> {
        let loaded = match self {
            Self::Local(f) => f.load_menu(date).await,
            Self::Memory(m) => Ok(m.load_menu(date).await),
        };
        loaded.unwrap_or_else(|e| {
            log::warn!("Cache read failed for {date}: {e}");
            None
        })
    }

    pub async fn save_menu(&self, date: NaiveDate, menu: &CachedMenu) {
        let saved = match self {
            Self::Local(f) => f.save_menu(date, menu).await,
            Self::Memory(m) => {
                m.save_menu(date, menu).await;
                Ok(())
            }
        };
        if let Err(e) = saved {
            log::warn!("Cache write failed for {date}: {e}");
        }
    }

    pub async fn load_image(&self, date: NaiveDate) -> Option<Vec<u8>> {
        let loaded = match self {
            Self::Local(f) => f.load_image(date).await,
            Self::Memory(m) => Ok(m.load_image(date).await),
        };
        loaded.unwrap_or_else(|e| {
            log::warn!("Image cache read failed for {date}: {e}");
            None
        })
    }

    pub async fn save_image(&self, date: NaiveDate, png: &[u8]) {
        let saved = match self {
            Self::Local(f) => f.save_image(date, png).await,
            Self::Memory(m) => {
                m.save_image(date, png).await;
                Ok(())
            }
        };
        if let Err(e) = saved {
            log::warn!("Image cache write failed for {date}: {e}");
        }
    }
}
