use std::{
    error::Error as StdError,
    fmt::{self, Display, Formatter},
    io,
};

use crate::{address::AddressError, template::TemplateError, BoxError};

/// Error type for message composition and batch delivery
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Neither a `Sender` nor a `From` header is set
    MissingFrom,
    /// An address header value could not be parsed
    InvalidAddress {
        /// The raw header value
        value: String,
        source: AddressError,
    },
    /// Writing or encoding the message failed
    Io(io::Error),
    /// A body template could not be rendered
    Template(TemplateError),
    /// Missing or invalid configuration
    Config(String),
    /// The connection to the server could not be set up
    Transport(BoxError),
    /// A message of a batch could not be delivered
    Delivery {
        /// 1-based position of the message in the batch
        position: usize,
        source: BoxError,
    },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingFrom => f.write_str("invalid message, \"From\" field is absent"),
            Error::InvalidAddress { value, source } => {
                write!(f, "invalid address {value:?}: {source}")
            }
            Error::Io(e) => e.fmt(f),
            Error::Template(e) => e.fmt(f),
            Error::Config(e) => write!(f, "invalid configuration: {e}"),
            Error::Transport(e) => e.fmt(f),
            Error::Delivery { position, source } => {
                write!(f, "could not send email {position}: {source}")
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::InvalidAddress { source, .. } => Some(source),
            Error::Io(e) => Some(e),
            Error::Template(e) => Some(e),
            Error::Transport(e) => Some(&**e),
            Error::Delivery { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<TemplateError> for Error {
    fn from(err: TemplateError) -> Error {
        Error::Template(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn delivery_display() {
        let err = Error::Delivery {
            position: 2,
            source: Box::new(Error::MissingFrom),
        };
        assert_eq!(
            err.to_string(),
            "could not send email 2: invalid message, \"From\" field is absent"
        );
        assert!(err.source().is_some());
    }
}
