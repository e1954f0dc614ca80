use std::path::PathBuf;
use std::sync::OnceLock;

static CONFIG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Config directory: `$XDG_CONFIG_HOME/notescope` (or the platform
/// equivalent via the `dirs` crate). Resolved once and cached.
pub fn config_dir() -> &'static PathBuf {
    CONFIG_DIR.get_or_init(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("notescope")
    })
}

/// Config file path: `<config_dir>/config.toml`.
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
