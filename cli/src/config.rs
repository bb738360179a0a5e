use anyhow::{Context, Result};
use directories::ProjectDirs;

use kcal_core::BackendConfig;

pub struct Config {
    pub backend: BackendConfig,
}

impl Config {
    /// Resolve the backend from `DATABASE_URL`, defaulting to an embedded
    /// database in the platform data directory.
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "kcal").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("kcal.db");
        let backend = BackendConfig::from_env(&db_path)?;

        Ok(Config { backend })
    }
}
