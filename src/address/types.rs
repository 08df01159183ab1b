//! Representation of an email address

use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
    net::IpAddr,
    str::FromStr,
};

use email_address::EmailAddress;
use idna::domain_to_ascii;

/// A validated `addr-spec` (_user@domain.tld_), as used in the SMTP envelope.
///
/// ```
/// use mailer::Address;
///
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let address = "user@email.com".parse::<Address>()?;
/// assert_eq!(address.user(), "user");
/// assert_eq!(address.domain(), "email.com");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct Address {
    serialized: String,
    /// Index of the '@' in `serialized`
    at: usize,
}

impl Address {
    /// Creates a new address from a user and a domain, validating both.
    pub fn new<U: AsRef<str>, D: AsRef<str>>(user: U, domain: D) -> Result<Self, AddressError> {
        let (user, domain) = (user.as_ref(), domain.as_ref());
        check_user(user)?;
        check_domain(domain)?;

        Ok(Address {
            serialized: format!("{user}@{domain}"),
            at: user.len(),
        })
    }

    /// The part before the '@'
    pub fn user(&self) -> &str {
        &self.serialized[..self.at]
    }

    /// The part after the '@'
    pub fn domain(&self) -> &str {
        &self.serialized[self.at + 1..]
    }

    /// Whether the address can be used without the SMTPUTF8 extension
    pub fn is_ascii(&self) -> bool {
        self.serialized.is_ascii()
    }
}

fn check_user(user: &str) -> Result<(), AddressError> {
    if EmailAddress::is_valid_local_part(user) {
        Ok(())
    } else {
        Err(AddressError::InvalidUser)
    }
}

fn check_domain(domain: &str) -> Result<(), AddressError> {
    check_domain_ascii(domain).or_else(|_| {
        domain_to_ascii(domain)
            .map_err(|_| AddressError::InvalidDomain)
            .and_then(|domain| check_domain_ascii(&domain))
    })
}

fn check_domain_ascii(domain: &str) -> Result<(), AddressError> {
    if EmailAddress::is_valid_domain(domain) {
        return Ok(());
    }

    // address literal
    let ip = domain
        .strip_prefix('[')
        .and_then(|ip| ip.strip_suffix(']'))
        .unwrap_or(domain);
    if ip.parse::<IpAddr>().is_ok() {
        return Ok(());
    }

    Err(AddressError::InvalidDomain)
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.serialized)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(val: &str) -> Result<Self, AddressError> {
        let (user, domain) = val.rsplit_once('@').ok_or(AddressError::MissingParts)?;
        if user.is_empty() || domain.is_empty() {
            return Err(AddressError::MissingParts);
        }
        Address::new(user, domain)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.serialized
    }
}

/// Errors in email addresses parsing
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[non_exhaustive]
pub enum AddressError {
    /// Missing domain or user
    MissingParts,
    /// Unbalanced angle bracket
    Unbalanced,
    /// Invalid email user
    InvalidUser,
    /// Invalid email domain
    InvalidDomain,
    /// The mailbox syntax could not be parsed
    InvalidInput,
}

impl Error for AddressError {}

impl Display for AddressError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            AddressError::MissingParts => "missing domain or user",
            AddressError::Unbalanced => "unbalanced angle bracket",
            AddressError::InvalidUser => "invalid email user",
            AddressError::InvalidDomain => "invalid email domain",
            AddressError::InvalidInput => "invalid input",
        })
    }
}
