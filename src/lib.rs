//! Mailer composes MIME messages and sends them over SMTP.
//!
//! ## Features
//!
//! This library provides:
//!
//! * Multipart messages with alternative bodies, attachments and embedded files
//! * RFC 2047 encoded headers, quoted-printable and base64 bodies
//! * A blocking SMTP client with STARTTLS or implicit TLS, and CRAM-MD5, LOGIN
//!   or PLAIN authentication
//! * Body templates
//!
//! ## Example
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use mailer::{
//!     message::File,
//!     transport::smtp::Dialer,
//!     MailerConfig, Message,
//! };
//!
//! let config = MailerConfig::from_env()?;
//!
//! let mut message = Message::from_config(&config)
//!     .to(["Kim <kim@example.org>"])
//!     .subject("Monthly report");
//! message.set_body("text/plain", "The report is attached.");
//! message.add_alternative("text/html", "<p>The report is <b>attached</b>.</p>");
//! message.attach(File::from_path("report.pdf"));
//!
//! Dialer::from_config(&config).dial_and_send(&[message])?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! * **tracing**: Logging with the `tracing` crate

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]
#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces,
    clippy::string_add,
    clippy::string_add_assign,
    clippy::clone_on_ref_ptr,
    clippy::verbose_file_reads,
    clippy::unnecessary_self_imports
)]

pub mod address;
pub mod config;
pub mod error;
pub mod message;
pub mod template;
pub mod transport;

use std::error::Error as StdError;

pub use crate::{
    address::{Address, Envelope},
    config::MailerConfig,
    error::Error,
    message::Message,
    template::{FileTemplates, TemplateEngine},
    transport::{smtp::Dialer, SendCloser, Sender},
};

/// Boxed error carried by [`Error::Delivery`] and [`Error::Transport`]
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Sends the messages one after the other with the given sender
///
/// The envelope of each message is read from its headers. Stops at the
/// first failure, reported with the 1-based position of the message.
///
/// ```rust
/// use mailer::{transport::stub::StubSender, Error, Message};
///
/// let ok = Message::new().from("alex@example.com", "").to(["kim@example.org"]);
/// let no_from = Message::new().to(["kim@example.org"]);
///
/// let mut sender = StubSender::new_ok();
/// let err = mailer::send(&mut sender, &[ok, no_from]).unwrap_err();
/// assert!(matches!(err, Error::Delivery { position: 2, .. }));
/// assert_eq!(sender.messages().len(), 1);
/// ```
pub fn send<S: Sender>(sender: &mut S, messages: &[Message]) -> Result<(), Error> {
    for (i, message) in messages.iter().enumerate() {
        let position = i + 1;
        let delivery = |source: BoxError| Error::Delivery { position, source };

        let from = message.from_address().map_err(|e| delivery(Box::new(e)))?;
        let to = message.recipients().map_err(|e| delivery(Box::new(e)))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(position, from = %from, recipients = to.len(), "sending message");

        sender
            .send(&from, &to, message)
            .map_err(|e| delivery(Box::new(e)))?;
    }
    Ok(())
}
