use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Lyrics errors
    #[error("Failed to parse TTML: {0}")]
    TtmlParse(#[from] quick_xml::Error),

    // Configuration errors
    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    ConfigEncode(#[from] toml::ser::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
