use std::error;
use std::fmt::{self, Display, Formatter};
use std::io;
use std::result;

#[derive(Debug)]
pub enum Error {
    Empty,
    Full,
    InvalidArgument(String),
    Io(io::Error),
    Config(serde_yaml::Error),
}

impl Display for Error {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        match *self {
            Error::Empty => write!(formatter, "Queue is Empty"),
            Error::Full => write!(formatter, "Queue is Full"),
            Error::InvalidArgument(ref msg) => write!(formatter, "invalid argument: {}", msg),
            Error::Io(ref error) => Display::fmt(error, formatter),
            Error::Config(ref error) => write!(formatter, "config error: {}", error),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref error) => Some(error),
            Error::Config(ref error) => Some(error),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Io(error)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Error::Config(error)
    }
}

/// A rejected enqueue. Hands the element back to the caller together with
/// the reason it was not accepted.
pub struct PutError<T> {
    error: Error,
    item: T,
}

impl<T> PutError<T> {
    pub(crate) fn new(error: Error, item: T) -> Self {
        PutError { error, item }
    }
    pub fn error(&self) -> &Error {
        &self.error
    }
    pub fn into_inner(self) -> T {
        self.item
    }
}

impl<T> fmt::Debug for PutError<T> {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter
            .debug_struct("PutError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> Display for PutError<T> {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        Display::fmt(&self.error, formatter)
    }
}

impl<T> error::Error for PutError<T> {}

impl<T> From<PutError<T>> for Error {
    fn from(error: PutError<T>) -> Self {
        error.error
    }
}

pub type Result<T> = result::Result<T, Error>;
