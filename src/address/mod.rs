//! Email addresses, mailboxes and the SMTP envelope

pub use self::{
    envelope::Envelope,
    mailbox::Mailbox,
    types::{Address, AddressError},
};
pub(crate) use self::envelope::{recipients, sender};

mod envelope;
mod mailbox;
mod parsers;
mod types;
