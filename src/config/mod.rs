use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::PlannerResult;
use crate::model::DEFAULT_SIMULATION;
use crate::utils::{app_data_dir, ensure_dir};

const CONFIG_DIR: &str = "config";
const CONFIG_FILE: &str = "config.json";
const TMP_SUFFIX: &str = "tmp";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    /// Simulation selected when the client last ran.
    pub simulation: String,
    pub request_timeout_secs: u64,
    /// `tracing` filter directive replacing the `planner_core=info` default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
    pub loading_debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5002".into(),
            simulation: DEFAULT_SIMULATION.into(),
            request_timeout_secs: 30,
            log_filter: None,
            loading_debounce_ms: 250,
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn loading_debounce(&self) -> Duration {
        Duration::from_millis(self.loading_debounce_ms)
    }
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> PlannerResult<Self> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> PlannerResult<Self> {
        let config_root = base.join(CONFIG_DIR);
        ensure_dir(&config_root)?;
        Ok(Self {
            path: config_root.join(CONFIG_FILE),
        })
    }

    /// Reads the stored configuration, or the defaults when none was saved yet.
    pub fn load(&self) -> PlannerResult<Config> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> PlannerResult<()> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_file(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        info!(path = %self.path.display(), "saved configuration");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_file(path: &Path, data: &str) -> PlannerResult<()> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config =
            serde_json::from_str(r#"{"api_base_url":"https://planner.example"}"#).unwrap();
        assert_eq!(parsed.api_base_url, "https://planner.example");
        assert_eq!(parsed.simulation, "Default");
        assert_eq!(parsed.loading_debounce(), Duration::from_millis(250));
        assert_eq!(parsed.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn tmp_path_appends_suffix() {
        let path = Path::new("/tmp/config/config.json");
        assert_eq!(tmp_path(path), PathBuf::from("/tmp/config/config.json.tmp"));
    }
}
