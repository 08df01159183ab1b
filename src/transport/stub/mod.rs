//! The stub sender records the envelope and content of the messages it is
//! given and answers with a fixed result. It can be useful for testing
//! purposes.
//!
//! ```rust
//! use mailer::{transport::stub::StubSender, Message};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let message = Message::new()
//!     .from("alex@example.com", "")
//!     .to(["kim@example.org"])
//!     .body("Hello", false);
//!
//! let mut sender = StubSender::new_ok();
//! mailer::send(&mut sender, &[message])?;
//! assert_eq!(sender.messages().len(), 1);
//! # Ok(())
//! # }
//! ```

use std::{
    error::Error as StdError,
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{
    transport::{SendCloser, Sender},
    Address, Envelope, Message,
};

/// Error returned by a failing [`StubSender`]
#[derive(Debug, Copy, Clone)]
pub struct Error;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("stub error")
    }
}

impl StdError for Error {}

/// This sender records messages and returns the given response
///
/// Clones share the recorded messages.
#[derive(Debug, Clone)]
pub struct StubSender {
    response: Result<(), Error>,
    messages: Arc<Mutex<Vec<(Envelope, String)>>>,
    closed: Arc<Mutex<bool>>,
}

impl StubSender {
    /// Creates a new sender that always returns the given response
    pub fn new(response: Result<(), Error>) -> StubSender {
        StubSender {
            response,
            messages: Arc::default(),
            closed: Arc::default(),
        }
    }

    /// Creates a new sender that always returns a success response
    pub fn new_ok() -> StubSender {
        StubSender::new(Ok(()))
    }

    /// Creates a new sender that always returns an error
    pub fn new_error() -> StubSender {
        StubSender::new(Err(Error))
    }

    /// Returns the envelope and formatted content of every message sent
    pub fn messages(&self) -> Vec<(Envelope, String)> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns true once [`SendCloser::close`] was called
    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Sender for StubSender {
    type Error = Error;

    fn send(&mut self, from: &Address, to: &[Address], message: &Message) -> Result<(), Error> {
        #[cfg(feature = "tracing")]
        tracing::info!(from = %from, to = ?to, "stub send");

        let content = message.formatted().map_err(|_| Error)?;
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((
                Envelope::new(from.clone(), to.to_vec()),
                String::from_utf8_lossy(&content).into_owned(),
            ));
        self.response
    }
}

impl SendCloser for StubSender {
    fn close(&mut self) -> Result<(), Error> {
        *self.closed.lock().unwrap_or_else(PoisonError::into_inner) = true;
        Ok(())
    }
}
