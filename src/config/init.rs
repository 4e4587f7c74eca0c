//! Default config initialization for `toolrelay init`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

use super::defaults::{CONFIG_FILE_NAME, DEFAULT_CONFIG_TEMPLATE};
use super::ConfigInitResult;

/// Write `./toolrelay.toml` from the embedded template unless it exists.
pub fn initialize_local_config() -> Result<ConfigInitResult, ConfigError> {
    initialize_config_at_path(Path::new(CONFIG_FILE_NAME))
}

/// Create-new write: an existing file, even one created concurrently, is
/// left untouched.
pub(super) fn initialize_config_at_path(path: &Path) -> Result<ConfigInitResult, ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            file.write_all(DEFAULT_CONFIG_TEMPLATE.as_bytes())?;
            Ok(ConfigInitResult::Created {
                path: path.to_path_buf(),
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            Ok(ConfigInitResult::AlreadyInitialized {
                path: path.to_path_buf(),
            })
        }
        Err(e) => Err(ConfigError::Io(e)),
    }
}

/// Resolve the base config directory from env/home conventions.
pub fn config_root_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".config"))
        .or_else(dirs::config_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::TestTempDir;

    #[test]
    fn init_writes_template_into_fresh_path() {
        let tmp = TestTempDir::new("config-init");
        let path = tmp.child("nested/toolrelay.toml");

        let outcome = initialize_config_at_path(&path).unwrap();
        assert_eq!(outcome, ConfigInitResult::Created { path: path.clone() });
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, DEFAULT_CONFIG_TEMPLATE);
    }

    #[test]
    fn init_never_touches_an_existing_file() {
        let tmp = TestTempDir::new("config-init-existing");
        let path = tmp.write_text("toolrelay.toml", "old-config");

        let outcome = initialize_config_at_path(&path).unwrap();
        assert!(matches!(
            outcome,
            ConfigInitResult::AlreadyInitialized { path: ref p } if p == &path
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old-config");
        let entries = std::fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(entries, 1, "no backup or sibling file is written");
    }
}
