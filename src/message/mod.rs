//! Composes MIME messages
//!
//! ## Usage
//!
//! ### Plain body
//!
//! ```rust
//! use mailer::Message;
//!
//! # use std::error::Error;
//! # fn main() -> Result<(), Box<dyn Error>> {
//! let message = Message::new()
//!     .from("nobody@domain.tld", "NoBody")
//!     .to(["hei@domain.tld"])
//!     .subject("Happy new year")
//!     .body("Be happy!", false);
//!
//! let formatted = String::from_utf8(message.formatted()?)?;
//! assert!(formatted.contains("From: \"NoBody\" <nobody@domain.tld>\r\n"));
//! assert!(formatted.ends_with("\r\n\r\nBe happy!"));
//! # Ok(())
//! # }
//! ```
//!
//! Non-ASCII header values are RFC 2047 encoded. The body uses the message
//! encoding, quoted-printable unless configured otherwise.
//!
//! ### Plain and HTML body
//!
//! Alternatives are written in the order they are added, so the plain text
//! version comes first.
//!
//! ```rust
//! use mailer::{message::Encoding, Message};
//!
//! let mut message = Message::new();
//! message.set_address_header("From", "nobody@domain.tld", "NoBody");
//! message.set_header("To", ["hei@domain.tld"]);
//! message.set_subject("Happy new year");
//! message.set_body("text/plain", "Hello, world! :)");
//! message
//!     .add_alternative("text/html", "<p><b>Hello</b>, <i>world</i>! :)</p>")
//!     .set_encoding(Encoding::Base64);
//! ```
//!
//! ### Attachments and embedded files
//!
//! ```rust
//! use mailer::{message::File, Message};
//!
//! let mut message = Message::new()
//!     .from("nobody@domain.tld", "")
//!     .to(["hei@domain.tld"])
//!     .body("<img src=\"cid:logo.png\">", true);
//! message.embed(File::from_bytes("logo.png", vec![0x89, b'P', b'N', b'G']));
//! message.attach(File::from_bytes("notes.txt", "some notes"));
//! ```

use std::io::{self, Write};

use chrono::{DateTime, TimeZone};
use serde::Serialize;

pub use self::{
    header::{Encoding, Headers},
    part::{Copier, File, Part},
};
use self::{header::WordEncoder, part::copier_from_bytes, writer::MessageWriter};
use crate::{
    address::{self, Address, Envelope},
    template::{TemplateEngine, TemplateError},
    Error, MailerConfig,
};

pub mod encoder;
pub mod header;
mod part;
mod writer;

/// Charset and default body encoding of a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSettings {
    pub charset: String,
    pub encoding: Encoding,
}

impl Default for MessageSettings {
    fn default() -> Self {
        MessageSettings {
            charset: "UTF-8".to_owned(),
            encoding: Encoding::QuotedPrintable,
        }
    }
}

/// An email message
#[derive(Debug, Clone)]
pub struct Message {
    headers: Headers,
    parts: Vec<Part>,
    attachments: Vec<File>,
    embedded: Vec<File>,
    charset: String,
    encoding: Encoding,
    word_encoder: WordEncoder,
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

impl Message {
    /// Creates an empty message using UTF-8 and quoted-printable.
    pub fn new() -> Self {
        Self::with_settings(MessageSettings::default())
    }

    pub fn with_settings(settings: MessageSettings) -> Self {
        Message {
            headers: Headers::new(),
            parts: Vec::new(),
            attachments: Vec::new(),
            embedded: Vec::new(),
            word_encoder: WordEncoder::for_encoding(settings.encoding),
            charset: settings.charset,
            encoding: settings.encoding,
        }
    }

    /// Creates an empty message with `From` set to the configured sender.
    pub fn from_config(config: &MailerConfig) -> Self {
        let mut message = Self::new();
        message.set_address_header("From", &config.sender_email, &config.sender_name);
        message
    }

    /// Sets the `From` header.
    pub fn from(mut self, email: &str, name: &str) -> Self {
        self.set_address_header("From", email, name);
        self
    }

    /// Sets the `To` header.
    pub fn to<I, S>(mut self, to: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.set_recipient(to);
        self
    }

    /// Sets the `Subject` header.
    pub fn subject(mut self, subject: &str) -> Self {
        self.set_subject(subject);
        self
    }

    /// Replaces the body with a `text/html` or `text/plain` part.
    pub fn body(mut self, body: impl Into<String>, is_html: bool) -> Self {
        let content_type = if is_html { "text/html" } else { "text/plain" };
        self.set_body(content_type, body);
        self
    }

    /// Sets the values of a header field. Values are RFC 2047 encoded when
    /// needed and replace the previous values of the field.
    pub fn set_header<I, S>(&mut self, field: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let values = values
            .into_iter()
            .map(|value| self.encode_string(value.as_ref()))
            .collect();
        self.headers.set(field, values);
    }

    pub fn set_headers<I, K>(&mut self, headers: I)
    where
        I: IntoIterator<Item = (K, Vec<String>)>,
        K: Into<String>,
    {
        for (field, values) in headers {
            self.set_header(field, values);
        }
    }

    /// Sets the `To` header. Use [`Message::format_address`] to include
    /// display names.
    pub fn set_recipient<I, S>(&mut self, addresses: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.set_header("To", addresses);
    }

    pub fn set_subject(&mut self, subject: &str) {
        self.set_header("Subject", [subject]);
    }

    /// Sets an address with an optional display name, empty for none.
    pub fn set_address_header(&mut self, field: impl Into<String>, address: &str, name: &str) {
        let value = self.format_address(address, name);
        self.headers.set(field, vec![value]);
    }

    pub fn set_date_header<Tz>(&mut self, field: impl Into<String>, date: &DateTime<Tz>)
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        self.headers.set(field, vec![self.format_date(date)]);
    }

    pub fn get_header(&self, field: &str) -> Option<&[String]> {
        self.headers.get(field)
    }

    /// Formats an address as a header value, see
    /// [`header::format_address`].
    pub fn format_address(&self, address: &str, name: &str) -> String {
        header::format_address(self.word_encoder, &self.charset, address, name)
    }

    /// Formats a date as an RFC 5322 date.
    pub fn format_date<Tz>(&self, date: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        header::format_date(date)
    }

    /// Renders a template to be used as a body.
    pub fn format_html<E, T>(&self, engine: &E, path: &str, data: &T) -> Result<String, TemplateError>
    where
        E: TemplateEngine,
        T: Serialize + ?Sized,
    {
        engine.render(path, data)
    }

    /// Replaces every body part with a single one.
    pub fn set_body(&mut self, content_type: &str, body: impl Into<String>) -> &mut Part {
        self.parts.clear();
        self.add_alternative(content_type, body)
    }

    /// Appends an alternative body part. Less preferred representations
    /// must be added first.
    pub fn add_alternative(&mut self, content_type: &str, body: impl Into<String>) -> &mut Part {
        let copier = copier_from_bytes(body.into());
        self.push_part(content_type, copier)
    }

    /// Appends an alternative body part produced by `f` when the message is
    /// written.
    pub fn add_alternative_writer<F>(&mut self, content_type: &str, f: F) -> &mut Part
    where
        F: Fn(&mut dyn Write) -> io::Result<()> + Send + Sync + 'static,
    {
        self.push_part(content_type, std::sync::Arc::new(f))
    }

    fn push_part(&mut self, content_type: &str, copier: Copier) -> &mut Part {
        let index = self.parts.len();
        self.parts.push(Part {
            content_type: content_type.to_owned(),
            encoding: self.encoding,
            copier,
        });
        &mut self.parts[index]
    }

    pub fn attach(&mut self, file: File) {
        self.attachments.push(file);
    }

    /// Embeds a file, referenced from HTML parts as `cid:<name>`.
    pub fn embed(&mut self, file: File) {
        self.embedded.push(file);
    }

    /// Clears headers, parts and files. The charset and encoding are kept.
    pub fn reset(&mut self) {
        self.headers.clear();
        self.parts.clear();
        self.attachments.clear();
        self.embedded.clear();
    }

    /// The envelope sender: `Sender` if set, otherwise `From`.
    pub fn from_address(&self) -> Result<Address, Error> {
        address::sender(&self.headers)
    }

    /// The `To`, `Cc` and `Bcc` addresses without duplicates.
    pub fn recipients(&self) -> Result<Vec<Address>, Error> {
        address::recipients(&self.headers)
    }

    pub fn envelope(&self) -> Result<Envelope, Error> {
        Envelope::try_from(&self.headers)
    }

    /// Writes the message and returns the number of bytes written.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<u64> {
        MessageWriter::new(w).write_message(self)
    }

    /// The formatted message
    pub fn formatted(&self) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn attachments(&self) -> &[File] {
        &self.attachments
    }

    pub fn embedded(&self) -> &[File] {
        &self.embedded
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn encode_string(&self, value: &str) -> String {
        self.word_encoder.encode(&self.charset, value)
    }
}
