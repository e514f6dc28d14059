use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tokio::fs;

use super::CachedMenu;

/// Per-date files under a cache directory: `menu/{date}.json` for menus,
/// `og/{date}.png` for preview images.
#[derive(Debug, Clone)]
pub struct FileStore {
    menu_dir: PathBuf,
    image_dir: PathBuf,
}

impl FileStore {
    pub async fn open(p: impl AsRef<Path>) -> crate::Result<Self> {
        let root = p.as_ref();
        let menu_dir = root.join("menu");
        let image_dir = root.join("og");
        fs::create_dir_all(&menu_dir).await?;
        fs::create_dir_all(&image_dir).await?;
        Ok(Self {
            menu_dir,
            image_dir,
        })
    }

    fn menu_path(&self, date: NaiveDate) -> PathBuf {
        self.menu_dir.join(format!("{date}.json"))
    }

    fn image_path(&self, date: NaiveDate) -> PathBuf {
        self.image_dir.join(format!("{date}.png"))
    }

    pub async fn load_menu(&self, date: NaiveDate) -> crate::Result<Option<CachedMenu>> {
        let path = self.menu_path(date);
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).await?;
        serde_json::from_str(&text).map(Some).map_err(From::from)
    }

    pub async fn save_menu(&self, date: NaiveDate, menu: &CachedMenu) -> crate::Result<()> {
        let text = serde_json::to_string(menu)?;
        fs::write(self.menu_path(date), text)
            .await
            .map_err(From::from)
    }

    pub async fn load_image(&self, date: NaiveDate) -> crate::Result<Option<Vec<u8>>> {
        let path = self.image_path(date);
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        fs::read(&path).await.map(Some).map_err(From::from)
    }

    pub async fn save_image(&self, date: NaiveDate, png: &[u8]) -> crate::Result<()> {
        fs::write(self.image_path(date), png)
            .await
            .map_err(From::from)
    }
}
