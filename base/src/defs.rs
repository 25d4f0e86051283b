use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    IoError,
    MalformedData,
    MalformedGeometry,
    MissingResource,
    UnsupportedFeature,
}

pub struct Error {
    pub kind: ErrorKind,
    pub description: String,
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind, description: String) -> Self {
        Self {
            kind,
            description,
            source: None,
        }
    }

    pub fn with_source<E: StdError + Send + Sync + 'static>(
        kind: ErrorKind,
        description: String,
        source: E,
    ) -> Self {
        Self {
            kind,
            description,
            source: Some(Box::new(source)),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.description)?;
        if let Some(source) = &self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| &**source as &(dyn StdError + 'static))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub trait IntoResult<T> {
    fn res<F: FnOnce() -> String>(self, describe: F) -> Result<T>;
    fn into_result<F: FnOnce() -> String>(self, describe: F) -> Result<T>;
}

impl<T, E: StdError + Send + Sync + 'static> IntoResult<T>
    for std::result::Result<T, E>
{
    fn res<F: FnOnce() -> String>(self, describe: F) -> Result<T> {
        self.map_err(|err| {
            Error::with_source(ErrorKind::IoError, describe(), err)
        })
    }

    fn into_result<F: FnOnce() -> String>(self, describe: F) -> Result<T> {
        self.res(describe)
    }
}
