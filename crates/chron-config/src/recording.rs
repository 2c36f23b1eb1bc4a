//! `[recording]` section.

use chron_core::VersionStrategyKind;
use serde::{Deserialize, Serialize};

const fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RecordingConfig {
    /// Process-wide switch. When `false` no history entry is ever written,
    /// whatever the per-operation context says.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// `ulid`, `incrementing`, or `timestamp`.
    #[serde(default)]
    pub version_strategy: VersionStrategyKind,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            version_strategy: VersionStrategyKind::default(),
        }
    }
}
