//! nip-renderer: panel drafts, label markup and publishing.
//!
//! - `PanelDraft` - field values, seeded from a template's defaults
//! - `render_panel` / `render_page` - HTML for the region and template layout
//! - `save_html` / `save_template` - writes through `nip_common::FileStore`

pub mod draft;
pub mod model;
pub mod page;
pub mod panel;
pub mod publish;
pub mod snapshot;

pub use draft::{FieldId, FieldSink, PanelDraft, UnknownField};
pub use model::{
    AminoAcidRow, BorderWeight, CompositionalRow, NutritionalData, Product, Region, Template,
    UnknownTemplate,
};
pub use page::{NIP_MARKER, PAGE_SHELL, render_page};
pub use panel::{Layout, render_panel, write_panel};
pub use publish::{SavedPanel, load_template, save_html, save_template};
pub use snapshot::TemplateSnapshot;
