/// Errors raised at the edges of the engine: configuration, snapshot files and
/// time zone names. Page text itself never produces an error.
#[derive(Debug, thiserror::Error)]
pub enum SlotwatchError {
    #[error("Unknown time zone: {0}")]
    InvalidTimezone(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid page snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, SlotwatchError>;
