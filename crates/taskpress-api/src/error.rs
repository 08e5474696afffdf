use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("api: authentication is missing")]
    MissingToken,

    /// The server answered with a 4xx or 5xx status.
    #[error("api: {code} - {message}")]
    Status { code: u16, message: String },

    #[error("api: {method} {url}: {source}")]
    Request {
        method: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("api: {url} - decoding json: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("api: failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
