//! Paints [`ViewState`] onto the entity card.

use ed_api_types::Notice;
use ed_sync_core::{SyncPhase, SyncView, ViewState};

use crate::dom::{self, Elements};
use crate::notify;

pub const EMPTY_PLACEHOLDER: &str = "empty data";

pub struct DomView {
    els: Elements,
}

impl DomView {
    pub fn new(els: Elements) -> Self {
        Self { els }
    }
}

/// Text for the read-only panel; blank values get a placeholder.
pub fn display_text(display: Option<&str>) -> (&str, bool) {
    match display {
        Some(value) if !value.trim().is_empty() => (value, false),
        _ => (EMPTY_PLACEHOLDER, true),
    }
}

impl SyncView for DomView {
    fn render(&self, state: &ViewState) {
        let els = &self.els;
        let phase = &state.phase;
        let loading = phase.is_loading();
        let editing = phase.is_editing() || matches!(phase, SyncPhase::Submitting { .. });
        let failed = matches!(phase, SyncPhase::Failed { .. });

        let title = state.account.map(|a| a.to_string()).unwrap_or_default();
        dom::set_text(&els.account_title, &title);

        dom::toggle_class(&els.card, "card--loading", loading);
        dom::set_hidden(&els.loading, !loading);

        match phase {
            SyncPhase::Failed { reason, .. } => dom::set_text(&els.error_panel, &reason.to_string()),
            _ => dom::set_text(&els.error_panel, ""),
        }
        dom::set_hidden(&els.error_panel, !failed);

        let (text, empty) = display_text(phase.display());
        dom::set_text(&els.display, text);
        dom::toggle_class(&els.display, "entity-display--empty", empty);
        dom::set_hidden(&els.view_panel, editing || (failed && phase.display().is_none()));

        dom::set_hidden(&els.edit_panel, !editing);
        dom::set_hidden(&els.edit_btn, failed || matches!(phase, SyncPhase::Initializing));
        els.save_btn.set_disabled(!phase.is_editing());

        if let Some(draft) = phase.draft() {
            if els.draft.value() != draft {
                els.draft.set_value(draft);
            }
        }
    }

    fn notify(&self, notice: &Notice) {
        notify::show(&self.els.notice_stack, notice);
    }
}
