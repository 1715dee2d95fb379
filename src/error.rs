use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("invalid status '{0}', expected one of: open, working, closed, satisfied, all")]
    InvalidStatus(String),

    #[error("invalid color '{0}', expected one of: yellow, orange, red, green, all")]
    InvalidColor(String),

    #[error("invalid delay bucket '{0}', expected one of: all, <24h, 24-72h, >72h")]
    InvalidDelay(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("rate limited by backend, retry after {0} seconds")]
    RateLimited(u64),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, DeskError>;
