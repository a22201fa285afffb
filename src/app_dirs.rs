use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "flashbrain")
    }

    pub fn settings_path() -> Option<PathBuf> {
        Self::project().map(|pd| pd.config_dir().join("settings.json"))
    }

    /// User-installed training classes.
    pub fn classes_dir() -> Option<PathBuf> {
        Self::project().map(|pd| pd.data_dir().join("classes"))
    }

    pub fn log_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("flashbrain");
            Some(state_dir.join("flashbrain.log"))
        } else {
            Self::project().map(|pd| pd.data_local_dir().join("flashbrain.log"))
        }
    }
}
