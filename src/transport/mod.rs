//! ### Sending messages
//!
//! A [`Sender`] delivers one message to a list of envelope recipients. The
//! following senders are available:
//!
//! * [`SmtpSender`](smtp::SmtpSender), obtained from a [`Dialer`](smtp::Dialer),
//!   sends the message over the network with the SMTP protocol.
//! * [`StubSender`](stub::StubSender) records the messages it is given. It can
//!   be used in tests.
//!
//! [`send`](crate::send) delivers a batch of messages with any of them, and
//! [`SendFn`] turns a closure into a sender.

use std::error::Error as StdError;

use crate::{Address, Message};

pub mod smtp;
pub mod stub;

/// Blocking method for sending messages
pub trait Sender {
    /// Error produced by the sender
    type Error: StdError + Send + Sync + 'static;

    /// Sends the message to the given envelope
    fn send(&mut self, from: &Address, to: &[Address], message: &Message)
        -> Result<(), Self::Error>;
}

/// A sender holding a connection
pub trait SendCloser: Sender {
    /// Ends the session
    fn close(&mut self) -> Result<(), Self::Error>;
}

/// Sends messages with a closure
///
/// ```
/// use mailer::{transport::SendFn, Address, Message};
///
/// let mut count = 0;
/// let mut sender = SendFn::new(|_: &Address, to: &[Address], _: &Message| {
///     count += to.len();
///     Ok::<_, std::io::Error>(())
/// });
/// let message = Message::new()
///     .from("alex@example.com", "")
///     .to(["kim@example.org", "sam@example.org"]);
/// mailer::send(&mut sender, &[message])?;
/// drop(sender);
/// assert_eq!(count, 2);
/// # Ok::<(), mailer::Error>(())
/// ```
pub struct SendFn<F>(F);

impl<F> SendFn<F> {
    pub fn new(f: F) -> Self {
        SendFn(f)
    }
}

impl<F, E> Sender for SendFn<F>
where
    F: FnMut(&Address, &[Address], &Message) -> Result<(), E>,
    E: StdError + Send + Sync + 'static,
{
    type Error = E;

    fn send(&mut self, from: &Address, to: &[Address], message: &Message) -> Result<(), E> {
        (self.0)(from, to, message)
    }
}

impl<F> std::fmt::Debug for SendFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SendFn")
    }
}
