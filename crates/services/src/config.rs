use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_STORAGE_PREFIX: &str = "eco_v2_";
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(200);
pub const DEFAULT_SHARE_BASE_URL: &str = "http://localhost:8080/";

/// Runtime knobs for a lesson session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonConfig {
    /// Prefix of the durable slot name; the slot is `{prefix}state`.
    pub storage_prefix: String,
    /// Quiet period before journal typing is persisted.
    pub autosave_delay: Duration,
    /// Page the shareable link points at. Parsed when a link is built.
    pub share_base_url: String,
    pub export_dir: PathBuf,
}

impl Default for LessonConfig {
    fn default() -> Self {
        Self {
            storage_prefix: DEFAULT_STORAGE_PREFIX.to_owned(),
            autosave_delay: DEFAULT_AUTOSAVE_DELAY,
            share_base_url: DEFAULT_SHARE_BASE_URL.to_owned(),
            export_dir: PathBuf::from("."),
        }
    }
}

impl LessonConfig {
    #[must_use]
    pub fn state_slot(&self) -> String {
        format!("{}state", self.storage_prefix)
    }
}
