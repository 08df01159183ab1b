use std::{
    fmt::{Display, Formatter as FmtFormatter, Result as FmtResult},
    str::FromStr,
};

use serde::Deserialize;

/// `Content-Transfer-Encoding` of a body part
///
/// Quoted-printable is the default. Header values are RFC 2047 encoded with
/// the "B" encoding when the message uses base64 and "Q" otherwise.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Encoding {
    #[default]
    QuotedPrintable,
    Base64,
    /// Raw 8bit. Headers are still encoded, the body is not.
    Unencoded,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::QuotedPrintable => "quoted-printable",
            Self::Base64 => "base64",
            Self::Unencoded => "8bit",
        }
    }
}

impl Display for Encoding {
    fn fmt(&self, f: &mut FmtFormatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quoted-printable" => Ok(Self::QuotedPrintable),
            "base64" => Ok(Self::Base64),
            "8bit" => Ok(Self::Unencoded),
            _ => Err(format!("unknown transfer encoding {s:?}")),
        }
    }
}

impl TryFrom<String> for Encoding {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod test {
    use super::Encoding;

    #[test]
    fn parse_and_display() {
        for encoding in [
            Encoding::QuotedPrintable,
            Encoding::Base64,
            Encoding::Unencoded,
        ] {
            assert_eq!(encoding.to_string().parse::<Encoding>(), Ok(encoding));
        }
        assert!("7bit".parse::<Encoding>().is_err());
    }

    #[test]
    fn deserialize() {
        let encoding: Encoding = serde_json::from_str("\"base64\"").unwrap();
        assert_eq!(encoding, Encoding::Base64);
    }
}
