use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use chumsky::prelude::*;

use super::{parsers, Address, AddressError};

/// A parsed mailbox: an optional display name and an [`Address`].
///
/// Display names are kept exactly as they appear in the header value, which
/// means RFC 2047 encoded words are not decoded.
///
/// ```
/// use mailer::address::Mailbox;
///
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let mailbox: Mailbox = "\"John Smith\" <john@example.com>".parse()?;
/// assert_eq!(mailbox.name.as_deref(), Some("John Smith"));
/// assert_eq!(mailbox.email.to_string(), "john@example.com");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// The display name, if any
    pub name: Option<String>,
    /// The email address
    pub email: Address,
}

impl Mailbox {
    pub fn new(name: Option<String>, email: Address) -> Self {
        Mailbox { name, email }
    }

    /// Parses a comma separated list of mailboxes.
    pub fn parse_list(src: &str) -> Result<Vec<Mailbox>, AddressError> {
        let parsed = parsers::mailbox_list()
            .parse(src)
            .map_err(|_errs| AddressError::InvalidInput)?;

        parsed.into_iter().map(Mailbox::from_parsed).collect()
    }

    fn from_parsed((name, (user, domain)): parsers::Parsed) -> Result<Mailbox, AddressError> {
        let name = name.filter(|name| !name.is_empty());
        Ok(Mailbox::new(name, Address::new(user, domain)?))
    }
}

impl FromStr for Mailbox {
    type Err = AddressError;

    fn from_str(src: &str) -> Result<Mailbox, Self::Err> {
        if src.matches('<').count() != src.matches('>').count() {
            return Err(AddressError::Unbalanced);
        }

        let parsed = parsers::mailbox()
            .parse(src)
            .map_err(|_errs| AddressError::InvalidInput)?;
        Mailbox::from_parsed(parsed)
    }
}

impl Display for Mailbox {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.email),
            None => self.email.fmt(f),
        }
    }
}
