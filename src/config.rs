//! Host configuration for the failure-handling engine.

use std::path::{Path, PathBuf};

use crate::Level;

/// Engine-wide settings supplied by the host.
///
/// A `Config` is attached to a [`Scope`](crate::Scope) at construction and
/// read whenever a failure is resolved. All values have usable defaults;
/// hosts override only what they need via the `with_*` builders.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether diagnostics are collected at all. When disabled, tracking
    /// calls become no-ops and built contexts carry plain frames with no
    /// metadata, no known tags and no derived markers.
    pub enabled: bool,
    /// Channels to report on when the failure carries known-issue tags.
    pub channels_when_known: Vec<String>,
    /// Channels to report on when the failure carries no known-issue tags.
    pub channels_when_not_known: Vec<String>,
    /// The final-fallback channel list.
    pub default_channels: Vec<String>,
    /// The default reporting level.
    pub level: Level,
    /// Whether failures are reported when nothing else decides.
    pub report: Option<bool>,
    /// Whether failures are rethrown when nothing else decides.
    pub rethrow: Option<bool>,
    /// The project root used to classify frames as application code. When
    /// unset, every frame is treated as an application frame.
    pub project_root: Option<PathBuf>,
    /// The dependency directory under the project root whose frames are not
    /// application code.
    pub dependency_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            channels_when_known: Vec::new(),
            channels_when_not_known: Vec::new(),
            default_channels: vec!["default".to_string()],
            level: Level::default(),
            report: None,
            rethrow: None,
            project_root: None,
            dependency_dir: "vendor".to_string(),
        }
    }
}

impl Config {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables diagnostic collection.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Sets the channels used when the failure carries known-issue tags.
    #[must_use]
    pub fn with_channels_when_known(mut self, channels: Vec<String>) -> Self {
        self.channels_when_known = channels;
        self
    }

    /// Sets the channels used when the failure carries no known-issue tags.
    #[must_use]
    pub fn with_channels_when_not_known(mut self, channels: Vec<String>) -> Self {
        self.channels_when_not_known = channels;
        self
    }

    /// Sets the final-fallback channel list.
    #[must_use]
    pub fn with_default_channels(mut self, channels: Vec<String>) -> Self {
        self.default_channels = channels;
        self
    }

    /// Sets the default reporting level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the default report decision.
    #[must_use]
    pub fn with_report(mut self, report: bool) -> Self {
        self.report = Some(report);
        self
    }

    /// Sets the default rethrow decision.
    #[must_use]
    pub fn with_rethrow(mut self, rethrow: bool) -> Self {
        self.rethrow = Some(rethrow);
        self
    }

    /// Sets the project root used for frame classification.
    #[must_use]
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    /// Sets the dependency directory name.
    #[must_use]
    pub fn with_dependency_dir(mut self, dir: impl Into<String>) -> Self {
        self.dependency_dir = dir.into();
        self
    }

    /// Whether a path belongs to the application rather than a dependency.
    ///
    /// A path is application code when it sits under the project root but not
    /// under the dependency directory. With no project root configured, every
    /// path is application code.
    #[must_use]
    pub fn is_application_path(&self, path: &Path) -> bool {
        let Some(root) = &self.project_root else {
            return true;
        };
        path.starts_with(root) && !path.starts_with(root.join(&self.dependency_dir))
    }

    /// A path relative to the project root, for display.
    #[must_use]
    pub fn project_file(&self, path: &Path) -> PathBuf {
        match &self.project_root {
            Some(root) => path.strip_prefix(root).unwrap_or(path).to_path_buf(),
            None => path.to_path_buf(),
        }
    }
}
