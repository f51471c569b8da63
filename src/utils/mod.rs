use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Once,
};

use dirs::home_dir;

const DEFAULT_DIR_NAME: &str = ".planner_core";
pub const HOME_ENV: &str = "PLANNER_CORE_HOME";
pub const DEFAULT_LOG_FILTER: &str = "planner_core=info";

static TRACING_INIT: Once = Once::new();

/// Initializes the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `filter` or `planner_core=info`.
/// Later calls are no-ops.
pub fn init_tracing(filter: Option<&str>) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let directive = filter.unwrap_or(DEFAULT_LOG_FILTER);
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

        let _ = fmt().with_env_filter(filter).try_init();
        tracing::info!(filter = directive, "Planner Core tracing initialized.");
    });
}

/// Returns the application data directory, defaulting to `~/.planner_core`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
