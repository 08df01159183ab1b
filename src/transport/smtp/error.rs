//! Error type for the SMTP session

use std::{error::Error as StdError, fmt, io};

use crate::{
    transport::smtp::response::{Code, Severity},
    BoxError,
};

/// The errors that may occur while dialing or sending over SMTP
pub struct Error {
    inner: Box<Inner>,
}

struct Inner {
    kind: Kind,
    source: Option<BoxError>,
}

impl Error {
    pub(crate) fn new<E>(kind: Kind, source: Option<E>) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            inner: Box::new(Inner {
                kind,
                source: source.map(Into::into),
            }),
        }
    }

    /// Returns true if the TCP connection could not be established
    pub fn is_connection(&self) -> bool {
        matches!(self.inner.kind, Kind::Connection)
    }

    /// Returns true if the TLS handshake or upgrade failed
    pub fn is_tls(&self) -> bool {
        matches!(self.inner.kind, Kind::Tls)
    }

    /// Returns true if the error happened while reading or writing the socket
    pub fn is_network(&self) -> bool {
        matches!(self.inner.kind, Kind::Network)
    }

    /// Returns true if a server reply could not be parsed
    pub fn is_response(&self) -> bool {
        matches!(self.inner.kind, Kind::Response)
    }

    /// Returns true if the authentication exchange failed on the client side
    pub fn is_authentication(&self) -> bool {
        matches!(self.inner.kind, Kind::Authentication)
    }

    /// Returns true if a recipient was rejected
    pub fn is_recipient(&self) -> bool {
        matches!(self.inner.kind, Kind::Recipient(_))
    }

    /// Returns true if the message could not be serialized into the data stream
    pub fn is_serialization(&self) -> bool {
        matches!(self.inner.kind, Kind::Serialization)
    }

    /// Returns true if the client was misused or misconfigured
    pub fn is_client(&self) -> bool {
        matches!(self.inner.kind, Kind::Client)
    }

    /// Returns true if the server replied with a 4xx code
    pub fn is_transient(&self) -> bool {
        self.status()
            .is_some_and(|code| code.severity() == Severity::TransientNegativeCompletion)
    }

    /// Returns true if the server replied with a 5xx code
    pub fn is_permanent(&self) -> bool {
        self.status()
            .is_some_and(|code| code.severity() == Severity::PermanentNegativeCompletion)
    }

    /// Returns true if the error is caused by a timeout
    pub fn is_timeout(&self) -> bool {
        self.io_kind() == Some(io::ErrorKind::TimedOut)
    }

    /// Returns true if the server closed the connection
    ///
    /// This is what a connection dropped by the server after an idle period
    /// looks like.
    pub fn is_eof(&self) -> bool {
        self.io_kind() == Some(io::ErrorKind::UnexpectedEof)
    }

    /// Returns the reply code, if the error was generated from a server reply
    pub fn status(&self) -> Option<Code> {
        match self.inner.kind {
            Kind::Reply(code) | Kind::Recipient(Some(code)) => Some(code),
            _ => None,
        }
    }

    fn io_kind(&self) -> Option<io::ErrorKind> {
        let mut source = StdError::source(self);

        while let Some(err) = source {
            if let Some(io_err) = err.downcast_ref::<io::Error>() {
                return Some(io_err.kind());
            }

            source = err.source();
        }

        None
    }
}

#[derive(Debug)]
pub(crate) enum Kind {
    /// Negative or unexpected reply code
    Reply(Code),
    /// Error parsing a response
    Response,
    /// Rejected recipient, with the reply code when the server sent one
    Recipient(Option<Code>),
    /// Client side failure of an authentication mechanism
    Authentication,
    /// The message could not be written into the data stream
    Serialization,
    /// Internal client error
    Client,
    /// Connection error
    Connection,
    /// Underlying network i/o error
    Network,
    /// TLS error
    Tls,
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = f.debug_struct("mailer::transport::smtp::Error");

        builder.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            builder.field("source", source);
        }

        builder.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.kind {
            Kind::Reply(code) => match code.severity() {
                Severity::TransientNegativeCompletion => write!(f, "transient error ({code})")?,
                Severity::PermanentNegativeCompletion => write!(f, "permanent error ({code})")?,
                _ => write!(f, "unexpected reply ({code})")?,
            },
            Kind::Response => f.write_str("response error")?,
            Kind::Recipient(Some(code)) => write!(f, "recipient rejected ({code})")?,
            Kind::Recipient(None) => f.write_str("recipient rejected")?,
            Kind::Authentication => f.write_str("authentication error")?,
            Kind::Serialization => f.write_str("could not write message")?,
            Kind::Client => f.write_str("internal client error")?,
            Kind::Connection => f.write_str("connection error")?,
            Kind::Network => f.write_str("network error")?,
            Kind::Tls => f.write_str("tls error")?,
        };

        if let Some(ref e) = self.inner.source {
            write!(f, ": {e}")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source.as_ref().map(|e| {
            let r: &(dyn StdError + 'static) = &**e;
            r
        })
    }
}

pub(crate) fn code(c: Code, s: Option<String>) -> Error {
    Error::new(Kind::Reply(c), s)
}

pub(crate) fn recipient(e: Error) -> Error {
    let code = e.status();
    Error::new(Kind::Recipient(code), Some(e))
}

pub(crate) fn response<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Response, Some(e))
}

pub(crate) fn authentication<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Authentication, Some(e))
}

pub(crate) fn serialization<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Serialization, Some(e))
}

pub(crate) fn client<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Client, Some(e))
}

pub(crate) fn network<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Network, Some(e))
}

pub(crate) fn connection<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Connection, Some(e))
}

pub(crate) fn tls<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Tls, Some(e))
}
