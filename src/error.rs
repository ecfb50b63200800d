use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// The request payload could not be encoded as JSON.
    Serialization(serde_json::Error),
    /// A credential, token or nonce is not a legal header value.
    InvalidHeader(String),
    /// The request never produced a response (DNS, TLS, connection reset, ...).
    Http(reqwest::Error),
    /// The server answered with something other than 200 OK.
    Status(u16),
    /// The response body did not match the expected envelope or result shape.
    Decode(serde_json::Error),
    /// The envelope decoded fine but carried a non-zero result code.
    Api { code: i64, message: String },
    Config(String),
    Io(std::io::Error),
}

impl Error {
    /// The vendor result code, if this is an API-level failure.
    pub fn api_code(&self) -> Option<i64> {
        match self {
            Error::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Serialization(err) => write!(f, "Failed to encode request: {}", err),
            Error::InvalidHeader(msg) => write!(f, "Invalid header value: {}", msg),
            Error::Http(err) => write!(f, "HTTP error: {}", err),
            Error::Status(status) => write!(f, "Unexpected HTTP status: {}", status),
            Error::Decode(err) => write!(f, "Malformed response: {}", err),
            Error::Api { code, message } => {
                write!(f, "Aqara API error (code {}): {}", code, message)
            }
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Serialization(err) | Error::Decode(err) => Some(err),
            Error::Http(err) => Some(err),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
