//! Constants used throughout cellar.

/// Directory under the store root holding exported recipient public keys.
pub const PUBLIC_KEY_DIR: &str = ".public-keys";

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "CELLAR_CONFIG";

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "CELLAR_LOG";

/// Application directory name under the platform config/data dirs.
pub const APP_DIR: &str = "cellar";
