use super::{Address, Mailbox};
use crate::{message::header::Headers, Error};

/// Simple email envelope representation
///
/// We only accept mailboxes, and do not support source routes (as per RFC).
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Envelope {
    /// The envelope recipients' addresses, deduplicated
    forward_path: Vec<Address>,
    /// The envelope sender address
    reverse_path: Address,
}

impl Envelope {
    /// Creates a new envelope. Repeated recipients are dropped, keeping the
    /// first occurrence.
    ///
    /// ```
    /// use mailer::{address::Envelope, Address};
    ///
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// let sender = "sender@email.com".parse::<Address>()?;
    /// let recipients = vec![
    ///     "to@email.com".parse::<Address>()?,
    ///     "to@email.com".parse::<Address>()?,
    /// ];
    ///
    /// let envelope = Envelope::new(sender, recipients);
    /// assert_eq!(envelope.to().len(), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(from: Address, to: Vec<Address>) -> Envelope {
        let mut forward_path: Vec<Address> = Vec::with_capacity(to.len());
        for address in to {
            if !forward_path.contains(&address) {
                forward_path.push(address);
            }
        }

        Envelope {
            forward_path,
            reverse_path: from,
        }
    }

    /// Gets the destination addresses of the envelope.
    pub fn to(&self) -> &[Address] {
        self.forward_path.as_slice()
    }

    /// Gets the sender of the envelope.
    pub fn from(&self) -> &Address {
        &self.reverse_path
    }
}

impl TryFrom<&Headers> for Envelope {
    type Error = Error;

    fn try_from(headers: &Headers) -> Result<Self, Self::Error> {
        Ok(Self::new(sender(headers)?, recipients(headers)?))
    }
}

/// The envelope sender: the first `Sender` value, else the first `From`
/// value.
pub(crate) fn sender(headers: &Headers) -> Result<Address, Error> {
    let value = ["Sender", "From"]
        .into_iter()
        .find_map(|field| headers.get(field).and_then(|values| values.first()))
        .ok_or(Error::MissingFrom)?;

    value
        .parse::<Mailbox>()
        .map(|mailbox| mailbox.email)
        .map_err(|source| Error::InvalidAddress {
            value: value.clone(),
            source,
        })
}

/// Every `To`, `Cc` and `Bcc` address in that order, without duplicates.
pub(crate) fn recipients(headers: &Headers) -> Result<Vec<Address>, Error> {
    let mut list: Vec<Address> = Vec::new();
    for field in ["To", "Cc", "Bcc"] {
        for value in headers.get(field).unwrap_or_default() {
            let mailboxes =
                Mailbox::parse_list(value).map_err(|source| Error::InvalidAddress {
                    value: value.clone(),
                    source,
                })?;
            for mailbox in mailboxes {
                if !list.contains(&mailbox.email) {
                    list.push(mailbox.email);
                }
            }
        }
    }
    Ok(list)
}
