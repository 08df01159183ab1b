//! SMTP commands

use std::fmt::{self, Display, Formatter};

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::{
    transport::smtp::{authentication::Mechanism, extension::ClientId},
    Address,
};

/// EHLO command
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Ehlo {
    client_id: ClientId,
}

impl Display for Ehlo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "EHLO {}\r\n", self.client_id)
    }
}

impl Ehlo {
    pub fn new(client_id: ClientId) -> Ehlo {
        Ehlo { client_id }
    }
}

/// HELO command, for servers without ESMTP support
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Helo {
    client_id: ClientId,
}

impl Display for Helo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "HELO {}\r\n", self.client_id)
    }
}

impl Helo {
    pub fn new(client_id: ClientId) -> Helo {
        Helo { client_id }
    }
}

/// STARTTLS command
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
pub struct Starttls;

impl Display for Starttls {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("STARTTLS\r\n")
    }
}

/// MAIL command
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Mail {
    sender: Address,
    eight_bit_mime: bool,
    smtp_utf8: bool,
}

impl Display for Mail {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "MAIL FROM:<{}>", self.sender)?;
        if self.eight_bit_mime {
            f.write_str(" BODY=8BITMIME")?;
        }
        if self.smtp_utf8 {
            f.write_str(" SMTPUTF8")?;
        }
        f.write_str("\r\n")
    }
}

impl Mail {
    pub fn new(sender: Address) -> Mail {
        Mail {
            sender,
            eight_bit_mime: false,
            smtp_utf8: false,
        }
    }

    /// Adds `BODY=8BITMIME`
    pub fn eight_bit_mime(mut self, enabled: bool) -> Mail {
        self.eight_bit_mime = enabled;
        self
    }

    /// Adds `SMTPUTF8`
    pub fn smtp_utf8(mut self, enabled: bool) -> Mail {
        self.smtp_utf8 = enabled;
        self
    }
}

/// RCPT command
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Rcpt {
    recipient: Address,
}

impl Display for Rcpt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "RCPT TO:<{}>\r\n", self.recipient)
    }
}

impl Rcpt {
    pub fn new(recipient: Address) -> Rcpt {
        Rcpt { recipient }
    }
}

/// DATA command
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
pub struct Data;

impl Display for Data {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("DATA\r\n")
    }
}

/// QUIT command
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
pub struct Quit;

impl Display for Quit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("QUIT\r\n")
    }
}

/// AUTH command, with its optional initial response
#[derive(PartialEq, Eq, Clone)]
pub struct Auth {
    mechanism: Mechanism,
    response: Option<Vec<u8>>,
}

impl Display for Auth {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "AUTH {}", self.mechanism)?;
        if let Some(response) = &self.response {
            write!(f, " {}", STANDARD.encode(response))?;
        }
        f.write_str("\r\n")
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("mechanism", &self.mechanism)
            .finish_non_exhaustive()
    }
}

impl Auth {
    pub fn new(mechanism: Mechanism, initial_response: Option<Vec<u8>>) -> Auth {
        Auth {
            mechanism,
            response: initial_response,
        }
    }

    /// What can be logged of the command
    pub(crate) fn redacted(&self) -> String {
        match self.response {
            Some(_) => format!("AUTH {} <redacted>", self.mechanism),
            None => format!("AUTH {}", self.mechanism),
        }
    }
}

/// A line answering an authentication challenge
pub(crate) struct AuthResponse(pub(crate) Vec<u8>);

impl Display for AuthResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}\r\n", STANDARD.encode(&self.0))
    }
}

/// Cancels an authentication exchange
#[derive(PartialEq, Eq, Clone, Debug, Copy)]
pub(crate) struct AuthCancel;

impl Display for AuthCancel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("*\r\n")
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn display() {
        let id = ClientId::Domain("localhost".to_owned());
        let email: Address = "test@example.com".parse().unwrap();

        assert_eq!(Ehlo::new(id.clone()).to_string(), "EHLO localhost\r\n");
        assert_eq!(Helo::new(id).to_string(), "HELO localhost\r\n");
        assert_eq!(Starttls.to_string(), "STARTTLS\r\n");
        assert_eq!(
            Mail::new(email.clone()).to_string(),
            "MAIL FROM:<test@example.com>\r\n"
        );
        assert_eq!(
            Mail::new(email.clone())
                .eight_bit_mime(true)
                .smtp_utf8(true)
                .to_string(),
            "MAIL FROM:<test@example.com> BODY=8BITMIME SMTPUTF8\r\n"
        );
        assert_eq!(
            Rcpt::new(email).to_string(),
            "RCPT TO:<test@example.com>\r\n"
        );
        assert_eq!(Data.to_string(), "DATA\r\n");
        assert_eq!(Quit.to_string(), "QUIT\r\n");
        assert_eq!(AuthCancel.to_string(), "*\r\n");
    }

    #[test]
    fn auth() {
        let plain = Auth::new(Mechanism::Plain, Some(b"\0user\0password".to_vec()));
        assert_eq!(plain.to_string(), "AUTH PLAIN AHVzZXIAcGFzc3dvcmQ=\r\n");
        assert_eq!(plain.redacted(), "AUTH PLAIN <redacted>");
        assert!(!format!("{plain:?}").contains("AHVz"));

        let login = Auth::new(Mechanism::Login, None);
        assert_eq!(login.to_string(), "AUTH LOGIN\r\n");
        assert_eq!(
            AuthResponse(b"user".to_vec()).to_string(),
            "dXNlcg==\r\n"
        );
    }
}
