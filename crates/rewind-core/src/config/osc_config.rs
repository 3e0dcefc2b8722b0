//! Online schema change tool configuration.

use serde::{Deserialize, Serialize};

/// Flags telling the engine that ALTER statements are carried out by an
/// online schema change tool rather than executed directly.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OscConfig {
    /// pt-online-schema-change handles ALTER TABLE. Default: false.
    pub pt_osc_enabled: Option<bool>,
    /// gh-ost handles ALTER TABLE. Default: false.
    pub gh_ost_enabled: Option<bool>,
}

impl OscConfig {
    pub fn effective_pt_osc_enabled(&self) -> bool {
        self.pt_osc_enabled.unwrap_or(false)
    }

    pub fn effective_gh_ost_enabled(&self) -> bool {
        self.gh_ost_enabled.unwrap_or(false)
    }

    /// True when either tool is active.
    pub fn any_enabled(&self) -> bool {
        self.effective_pt_osc_enabled() || self.effective_gh_ost_enabled()
    }
}
