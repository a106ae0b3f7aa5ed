/// Application name shared by the binary, the config file and the log target.
pub const APP_NAME: &str = "calreader";

/// Optional TOML configuration file read from the working directory.
pub const CONFIG_FILE: &str = const_str::concat!(APP_NAME, ".toml");

/// Tracing target used by the import pipeline's default logger.
pub const IMPORT_LOG_TARGET: &str = const_str::concat!(APP_NAME, "::import");

pub const DEFAULT_DAYS_BACK: u32 = 30;
pub const DEFAULT_DAYS_AHEAD: u32 = 30;
pub const DEFAULT_TIME_ZONE: &str = "UTC";

/// Upper bound on instances produced by a single recurring event.
pub const DEFAULT_MAX_INSTANCES: u16 = 10_000;
