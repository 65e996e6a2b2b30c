//! Environment file loading.

use crate::error::{LegisError, Result};
use std::path::Path;

/// Load `KEY=value` pairs from an env file into the process environment.
///
/// Variables that are already set keep their values.
pub fn load_env_file(path: &Path) -> Result<()> {
    dotenvy::from_path(path)
        .map_err(|e| LegisError::Config(format!("Failed to load {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_file_sets_missing_variables_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "LEGIS_ENV_FILE_TOKEN=from-file\nLEGIS_ENV_FILE_PRESET=from-file\n",
        )
        .unwrap();
        std::env::set_var("LEGIS_ENV_FILE_PRESET", "from-shell");

        load_env_file(&path).unwrap();

        assert_eq!(std::env::var("LEGIS_ENV_FILE_TOKEN").unwrap(), "from-file");
        assert_eq!(std::env::var("LEGIS_ENV_FILE_PRESET").unwrap(), "from-shell");
    }

    #[test]
    fn test_missing_env_file_is_config_error() {
        let result = load_env_file(Path::new("/nonexistent/legis/.env"));
        assert!(matches!(result, Err(LegisError::Config(_))));
    }
}
