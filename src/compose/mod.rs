use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

mod draft;

pub use draft::ReplyDraft;

/// Where the reply composer is mounted relative to the thread.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ComposePlacement {
    #[default]
    Overlay,
    SideBySide,
    NewTab,
}

impl ComposePlacement {
    pub fn label(self) -> &'static str {
        match self {
            ComposePlacement::Overlay => "Overlay",
            ComposePlacement::SideBySide => "Side by Side",
            ComposePlacement::NewTab => "New Tab",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            ComposePlacement::Overlay => "Hover draft over conversation",
            ComposePlacement::SideBySide => "Show draft and conversation side by side",
            ComposePlacement::NewTab => "Open compose in new tab",
        }
    }

    /// Key shown next to the selector button.
    pub fn shortcut(self) -> char {
        match self {
            ComposePlacement::Overlay => '1',
            ComposePlacement::SideBySide => '2',
            ComposePlacement::NewTab => '3',
        }
    }

    pub fn from_shortcut(key: char) -> Option<Self> {
        ComposePlacement::iter().find(|mode| mode.shortcut() == key)
    }
}

/// Holds the current placement. Any mode may follow any other and nothing
/// but an explicit `set_mode` changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementController {
    mode: ComposePlacement,
}

impl PlacementController {
    pub fn new(initial: ComposePlacement) -> Self {
        Self { mode: initial }
    }

    pub fn current(&self) -> ComposePlacement {
        self.mode
    }

    /// Returns whether the mode changed. Selecting the current mode is a no-op.
    pub fn set_mode(&mut self, next: ComposePlacement) -> bool {
        if self.mode == next {
            return false;
        }
        tracing::debug!(from = %self.mode, to = %next, "compose placement changed");
        self.mode = next;
        true
    }
}
