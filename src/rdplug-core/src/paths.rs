use crate::{APP_AUTHOR, APP_NAME, APP_QUALIFIER};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Per-user directories used by rdplug.
#[derive(Debug, Clone)]
pub struct AppDirs {
    config_dir: PathBuf,
    profiles_dir: PathBuf,
    log_dir: PathBuf,
}

impl AppDirs {
    pub fn discover() -> Result<Self, DirsError> {
        let dirs = ProjectDirs::from(APP_QUALIFIER, APP_AUTHOR, APP_NAME)
            .ok_or(DirsError::MissingProjectDirs)?;
        Ok(Self::rooted(dirs.config_dir(), dirs.data_dir()))
    }

    /// Lay out the directories below explicit roots instead of the
    /// platform defaults.
    pub fn rooted(config_dir: &Path, data_dir: &Path) -> Self {
        Self {
            config_dir: config_dir.to_path_buf(),
            profiles_dir: data_dir.join("profiles"),
            log_dir: data_dir.join("logs"),
        }
    }

    pub fn ensure_exists(&self) -> Result<(), DirsError> {
        for dir in [&self.config_dir, &self.profiles_dir, &self.log_dir] {
            std::fs::create_dir_all(dir).map_err(|source| DirsError::CreateDirectory {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn profiles_dir(&self) -> &Path {
        &self.profiles_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Resolve a profile argument: existing paths are used as is, bare names
    /// are looked up as `<profiles_dir>/<name>.toml`.
    pub fn profile_path(&self, name_or_path: &str) -> PathBuf {
        let candidate = PathBuf::from(name_or_path);
        if candidate.exists() || candidate.components().count() > 1 {
            return candidate;
        }
        self.profiles_dir.join(format!("{name_or_path}.toml"))
    }
}

#[derive(Debug, Error)]
pub enum DirsError {
    #[error("unable to determine project directories for rdplug")]
    MissingProjectDirs,
    #[error("failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
}
