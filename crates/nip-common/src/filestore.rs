//! Local-disk storage for rendered panels and template snapshots.
//!
//! Layout under the storage root:
//!
//! ```text
//! html/au/<key>.html
//! html/us/<key>.html
//! templates/<key>-template.json
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use smol_str::SmolStr;
use tracing::{debug, info};

use crate::error::{Result, StorageError};
use crate::region::Region;

/// Storage key for a product identifier: every char outside `[A-Za-z0-9]`
/// becomes `-`, then the whole key is lowercased.
///
/// Replacement counts UTF-16 code units, so a char outside the Basic
/// Multilingual Plane becomes `--`. Distinct identifiers can map to the same
/// key; nothing detects that.
pub fn storage_key(identifier: &str) -> SmolStr {
    let mut key = String::with_capacity(identifier.len());
    for c in identifier.chars() {
        if c.is_ascii_alphanumeric() {
            key.push(c.to_ascii_lowercase());
        } else {
            key.extend(std::iter::repeat_n('-', c.len_utf16()));
        }
    }
    SmolStr::from(key)
}

/// Which regions already hold a panel for a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HtmlStatus {
    pub has_au: bool,
    pub has_us: bool,
    pub has_any: bool,
    pub filename: SmolStr,
}

impl HtmlStatus {
    pub fn has(&self, region: Region) -> bool {
        match region {
            Region::Au => self.has_au,
            Region::Us => self.has_us,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key(identifier: &str) -> Result<SmolStr> {
        let key = storage_key(identifier);
        if key.is_empty() {
            return Err(StorageError::EmptyKey(identifier.to_owned()).into());
        }
        Ok(key)
    }

    pub fn html_dir(&self, region: Region) -> PathBuf {
        self.root.join("html").join(region.dir_name())
    }

    pub fn html_path(&self, region: Region, identifier: &str) -> Result<PathBuf> {
        let key = Self::key(identifier)?;
        Ok(self.html_dir(region).join(format!("{key}.html")))
    }

    pub fn template_path(&self, identifier: &str) -> Result<PathBuf> {
        let key = Self::key(identifier)?;
        Ok(self
            .root
            .join("templates")
            .join(format!("{key}-template.json")))
    }

    pub async fn exists(&self, region: Region, identifier: &str) -> Result<bool> {
        let path = self.html_path(region, identifier)?;
        Ok(tokio::fs::try_exists(path).await?)
    }

    /// Read a stored panel.
    pub async fn read(&self, region: Region, identifier: &str) -> Result<String> {
        let path = self.html_path(region, identifier)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(html) => Ok(html),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound {
                region,
                key: storage_key(identifier).to_string(),
            }
            .into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write a panel, creating the region directory. Returns the file path.
    pub async fn write(&self, region: Region, identifier: &str, content: &str) -> Result<PathBuf> {
        let path = self.html_path(region, identifier)?;
        tokio::fs::create_dir_all(self.html_dir(region)).await?;
        tokio::fs::write(&path, content).await?;
        info!(%region, path = %path.display(), bytes = content.len(), "wrote panel");
        Ok(path)
    }

    /// Check both regions for a key.
    pub async fn status(&self, identifier: &str) -> Result<HtmlStatus> {
        let has_au = self.exists(Region::Au, identifier).await?;
        let has_us = self.exists(Region::Us, identifier).await?;
        Ok(HtmlStatus {
            has_au,
            has_us,
            has_any: has_au || has_us,
            filename: Self::key(identifier)?,
        })
    }

    /// Write a template snapshot as pretty JSON.
    pub async fn write_template<T: Serialize>(&self, identifier: &str, template: &T) -> Result<PathBuf> {
        let path = self.template_path(identifier)?;
        let json = serde_json::to_string_pretty(template)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&path, json).await?;
        info!(path = %path.display(), "wrote template");
        Ok(path)
    }

    pub async fn read_template<T: DeserializeOwned>(&self, identifier: &str) -> Result<T> {
        let path = self.template_path(identifier)?;
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::TemplateNotFound {
                    key: storage_key(identifier).to_string(),
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), "read template");
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key("Whey Protein 1kg"), "whey-protein-1kg");
        assert_eq!(
            storage_key("https://shop.example/products/Vanilla_ISO"),
            "https---shop-example-products-vanilla-iso"
        );
        assert_eq!(storage_key("Crème"), "cr-me");
        assert_eq!(storage_key("Fuel 🔥 Pack"), "fuel----pack");
        assert_eq!(storage_key(&storage_key("A b")), storage_key("A b"));
    }

    #[test]
    fn test_paths() {
        let store = FileStore::new("/data");
        assert_eq!(
            store.html_path(Region::Us, "Pre Workout").unwrap(),
            PathBuf::from("/data/html/us/pre-workout.html")
        );
        assert_eq!(
            store.template_path("Pre Workout").unwrap(),
            PathBuf::from("/data/templates/pre-workout-template.json")
        );
        assert!(store.html_path(Region::Au, "").is_err());
    }
}
