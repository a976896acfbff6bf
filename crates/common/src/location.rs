use std::fmt;

use url::Url;

use crate::error::ErrorKind;

/// Which family of storage backend a location addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// `s3://<bucket>`
    S3,
    /// `http(s)://host[:port][/base]`, a server speaking the directory listing API
    Generic,
}

impl BackendKind {
    fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "s3" => Some(BackendKind::S3),
            "http" | "https" => Some(BackendKind::Generic),
            _ => None,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::S3 => f.write_str("s3"),
            BackendKind::Generic => f.write_str("generic"),
        }
    }
}

/// A parsed storage location URI, e.g.
///  - `s3://example-bucket`
///  - `https://127.0.0.1:8443/v1`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
    kind: BackendKind,
}

impl Location {
    pub fn parse(raw: &str) -> Result<Self, LocationError> {
        let url = Url::parse(raw).map_err(|source| LocationError::Parse {
            raw: raw.to_string(),
            source,
        })?;
        let kind = BackendKind::from_scheme(url.scheme())
            .ok_or_else(|| LocationError::UnsupportedScheme(url.scheme().to_string()))?;

        if kind == BackendKind::S3 {
            if !url.path().is_empty() {
                return Err(LocationError::S3Path(raw.to_string()));
            }
            if url.host_str().map_or(true, str::is_empty) {
                return Err(LocationError::MissingBucket(raw.to_string()));
            }
        }

        Ok(Self { url, kind })
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Name of the bucket an `s3` location points at.
    pub fn bucket_name(&self) -> Result<&str, LocationError> {
        match (self.kind, self.url.host_str()) {
            (BackendKind::S3, Some(bucket)) if !bucket.is_empty() => Ok(bucket),
            _ => Err(LocationError::NotABucket(self.url.to_string())),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("location [{raw}] is not a valid URI: {source}")]
    Parse {
        raw: String,
        source: url::ParseError,
    },
    #[error("unsupported storage backend scheme [{0}]")]
    UnsupportedScheme(String),
    #[error("s3 location [{0}] cannot have path")]
    S3Path(String),
    #[error("s3 location [{0}] does not name a bucket")]
    MissingBucket(String),
    #[error("location [{0}] is not a bucket")]
    NotABucket(String),
}

impl LocationError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidInput
    }
}
