//! The SMTP sender sends messages using the SMTP protocol.
//!
//! This SMTP client follows [RFC
//! 5321](https://tools.ietf.org/html/rfc5321), and is designed to send
//! messages from an application to a relay server.
//!
//! It implements the following extensions:
//!
//! * 8BITMIME ([RFC 6152](https://tools.ietf.org/html/rfc6152))
//! * SMTPUTF8 ([RFC 6531](http://tools.ietf.org/html/rfc6531))
//! * AUTH ([RFC 4954](http://tools.ietf.org/html/rfc4954)) with CRAM-MD5, LOGIN and PLAIN mechanisms
//! * STARTTLS ([RFC 2487](http://tools.ietf.org/html/rfc2487))
//!
//! #### Simple example
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use mailer::{transport::smtp::Dialer, Message};
//!
//! let message = Message::new()
//!     .from("nobody@domain.tld", "NoBody")
//!     .to(["hei@domain.tld"])
//!     .subject("Happy new year")
//!     .body("Be happy!", false);
//!
//! Dialer::new("smtp.domain.tld", 587, "nobody", "password").dial_and_send(&[message])?;
//! # Ok(())
//! # }
//! ```
//!
//! #### Reusing a connection
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use mailer::{
//!     transport::{
//!         smtp::{authentication::Mechanism, extension::ClientId, Dialer},
//!         SendCloser,
//!     },
//!     Message,
//! };
//!
//! let dialer = Dialer::new("smtp.domain.tld", 465, "nobody", "password")
//!     // Set the name sent with EHLO, default is `localhost`
//!     .local_name(ClientId::new("my.hostname.tld"))
//!     // Do not pick the mechanism from the ones offered
//!     .authentication(Mechanism::Login);
//!
//! let mut sender = dialer.dial()?;
//! for name in ["Kim", "Sam"] {
//!     let message = Message::new()
//!         .from("nobody@domain.tld", "")
//!         .to([format!("{}@domain.tld", name.to_lowercase())])
//!         .body(format!("Hello {name}"), false);
//!     mailer::send(&mut sender, &[message])?;
//! }
//! sender.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! You can specify custom TLS settings:
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use mailer::transport::smtp::{
//!     client::{Certificate, TlsParameters, TlsVersion},
//!     Dialer,
//! };
//!
//! let pem = std::fs::read("ca.pem")?;
//! let tls = TlsParameters::builder("smtp.domain.tld".to_owned())
//!     .add_root_certificate(Certificate::from_pem(&pem)?)
//!     .set_min_tls_version(TlsVersion::Tlsv12)
//!     .build()?;
//!
//! let sender = Dialer::new("smtp.domain.tld", 587, "", "")
//!     .tls_parameters(tls)
//!     .dial()?;
//! # Ok(())
//! # }
//! ```

pub use self::{
    dialer::{Dialer, SmtpSender, DEFAULT_TIMEOUT},
    error::Error,
};

pub mod authentication;
pub mod client;
pub mod commands;
mod dialer;
mod error;
pub mod extension;
pub mod response;

/// Default smtp port
pub const SMTP_PORT: u16 = 25;
/// Default submission port
pub const SUBMISSION_PORT: u16 = 587;
/// Default submission over TLS port
///
/// Defined in [RFC8314](https://tools.ietf.org/html/rfc8314)
pub const SUBMISSIONS_PORT: u16 = 465;
