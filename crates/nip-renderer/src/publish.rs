//! Saving rendered panels and draft snapshots through a [`FileStore`].

use std::path::PathBuf;

use nip_common::{FileStore, HtmlStatus, Region, Result, StorageError};
use smol_str::SmolStr;
use tracing::{info, warn};

use crate::draft::PanelDraft;
use crate::page::render_page;
use crate::snapshot::TemplateSnapshot;

/// Where a saved panel landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedPanel {
    pub region: Region,
    pub key: SmolStr,
    pub path: PathBuf,
    /// Overwritten regions, if any.
    pub replaced: Vec<Region>,
}

impl SavedPanel {
    pub fn filename(&self) -> String {
        format!("{}.html", self.key)
    }

    /// URL path the panel is served under.
    pub fn access_url(&self) -> String {
        format!("/api/html/{}/{}", self.region.dir_name(), self.key)
    }
}

fn existing_regions(status: &HtmlStatus) -> Vec<Region> {
    Region::ALL.into_iter().filter(|r| status.has(*r)).collect()
}

/// Render the draft's page and write it under its region.
///
/// A panel for the same product in any region blocks the write unless
/// `force` is set.
pub async fn save_html(store: &FileStore, draft: &PanelDraft, force: bool) -> Result<SavedPanel> {
    let identifier = draft.product.online_store_url.as_str();
    let status = store.status(identifier).await?;
    let replaced = existing_regions(&status);

    if status.has_any {
        let regions = replaced
            .iter()
            .map(|r| r.code())
            .collect::<Vec<_>>()
            .join(", ");
        if !force {
            return Err(StorageError::AlreadyExists {
                key: status.filename.to_string(),
                regions,
            }
            .into());
        }
        warn!(key = %status.filename, %regions, "overwriting existing panel");
    }

    let html = render_page(draft);
    let path = store.write(draft.region, identifier, &html).await?;
    Ok(SavedPanel {
        region: draft.region,
        key: status.filename,
        path,
        replaced,
    })
}

/// Store a timestamped snapshot of the draft.
pub async fn save_template(store: &FileStore, draft: &PanelDraft) -> Result<PathBuf> {
    let snapshot = TemplateSnapshot::capture(draft);
    let path = store
        .write_template(&draft.product.online_store_url, &snapshot)
        .await?;
    info!(key = %draft.key(), saved_at = %snapshot.saved_at, "saved template");
    Ok(path)
}

pub async fn load_template(store: &FileStore, identifier: &str) -> Result<TemplateSnapshot> {
    store.read_template(identifier).await
}
