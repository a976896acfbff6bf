use std::fmt;

/// Classification shared by every error the gateway can produce.
///
/// Handlers turn a kind into a status code; the kind, not the concrete error
/// type, decides what the caller sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed request body, location, key, prefix or `If-Match` value.
    InvalidInput,
    /// Nothing matches the requested content id.
    NotFound,
    /// The backing store or object store failed.
    ServerError,
    /// Credential check failed at the boundary.
    Unauthorized,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::NotFound => "not found",
            ErrorKind::ServerError => "server error",
            ErrorKind::Unauthorized => "unauthorized",
        };
        f.write_str(name)
    }
}

/// Status answered for errors that carry no [`ErrorKind`].
pub const UNCLASSIFIED_STATUS: u16 = 520;

impl ErrorKind {
    /// HTTP status code callers see for this kind.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::InvalidInput => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::NotFound => 404,
            ErrorKind::ServerError => 500,
        }
    }
}

/// Status code for an error that may not be classified.
pub fn status_code(kind: Option<ErrorKind>) -> u16 {
    kind.map_or(UNCLASSIFIED_STATUS, ErrorKind::status_code)
}
