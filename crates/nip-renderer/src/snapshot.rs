use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::draft::PanelDraft;

/// A saved draft, stamped with when it was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSnapshot {
    #[serde(flatten)]
    pub draft: PanelDraft,
    pub saved_at: DateTime<Utc>,
}

impl TemplateSnapshot {
    pub fn capture(draft: &PanelDraft) -> Self {
        Self::at(draft, Utc::now())
    }

    pub fn at(draft: &PanelDraft, saved_at: DateTime<Utc>) -> Self {
        Self {
            draft: draft.clone(),
            saved_at,
        }
    }

    pub fn into_draft(self) -> PanelDraft {
        self.draft
    }
}
