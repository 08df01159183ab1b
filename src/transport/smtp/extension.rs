//! ESMTP features

use std::{
    collections::HashSet,
    fmt::{self, Display, Formatter},
    net::IpAddr,
};

use crate::transport::smtp::{
    authentication::Mechanism,
    error::{self, Error},
    response::Response,
};

/// Client identifier, the parameter to `EHLO` and `HELO`
#[derive(PartialEq, Eq, Clone, Debug)]
#[non_exhaustive]
pub enum ClientId {
    /// A fully qualified domain name
    Domain(String),
    /// An address literal
    Address(IpAddr),
}

impl ClientId {
    /// Reads an IP address as an address literal, anything else as a domain
    pub fn new(name: impl Into<String>) -> ClientId {
        let name = name.into();
        match name.parse() {
            Ok(ip) => ClientId::Address(ip),
            Err(_) => ClientId::Domain(name),
        }
    }
}

impl Default for ClientId {
    fn default() -> Self {
        ClientId::Domain("localhost".to_owned())
    }
}

impl Display for ClientId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ClientId::Domain(value) => f.write_str(value),
            ClientId::Address(IpAddr::V4(value)) => write!(f, "[{value}]"),
            ClientId::Address(IpAddr::V6(value)) => write!(f, "[IPv6:{value}]"),
        }
    }
}

/// Supported ESMTP keywords
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
#[non_exhaustive]
pub enum Extension {
    /// 8BITMIME keyword
    ///
    /// Defined in [RFC 6152](https://tools.ietf.org/html/rfc6152)
    EightBitMime,
    /// SMTPUTF8 keyword
    ///
    /// Defined in [RFC 6531](https://tools.ietf.org/html/rfc6531)
    SmtpUtfEight,
    /// STARTTLS keyword
    ///
    /// Defined in [RFC 2487](https://tools.ietf.org/html/rfc2487)
    StartTls,
    /// AUTH mechanism
    Authentication(Mechanism),
}

impl Display for Extension {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Extension::EightBitMime => f.write_str("8BITMIME"),
            Extension::SmtpUtfEight => f.write_str("SMTPUTF8"),
            Extension::StartTls => f.write_str("STARTTLS"),
            Extension::Authentication(mechanism) => write!(f, "AUTH {mechanism}"),
        }
    }
}

/// What the server announced in its `EHLO` reply
#[derive(Clone, Debug, Eq, PartialEq, Default)]
pub struct ServerInfo {
    name: String,
    features: HashSet<Extension>,
    /// Raw parameters of the `AUTH` keyword
    auth: Option<String>,
}

impl Display for ServerInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.features.is_empty() {
            write!(f, "{} with no supported features", self.name)
        } else {
            let mut features: Vec<String> =
                self.features.iter().map(ToString::to_string).collect();
            features.sort();
            write!(f, "{} with {}", self.name, features.join(", "))
        }
    }
}

impl ServerInfo {
    /// Reads the server name and keywords from an `EHLO` reply
    pub fn from_response(response: &Response) -> Result<ServerInfo, Error> {
        let name = response
            .first_word()
            .ok_or_else(|| error::response("could not read server name"))?;

        let mut features = HashSet::new();
        let mut auth = None;

        for line in response.message().skip(1) {
            let mut split = line.split_whitespace();
            let Some(keyword) = split.next() else {
                continue;
            };

            match keyword.to_ascii_uppercase().as_str() {
                "8BITMIME" => {
                    features.insert(Extension::EightBitMime);
                }
                "SMTPUTF8" => {
                    features.insert(Extension::SmtpUtfEight);
                }
                "STARTTLS" => {
                    features.insert(Extension::StartTls);
                }
                "AUTH" => {
                    let params: Vec<&str> = split.collect();
                    for mechanism in &params {
                        if let Ok(mechanism) = mechanism.parse() {
                            features.insert(Extension::Authentication(mechanism));
                        }
                    }
                    auth = Some(params.join(" "));
                }
                _ => (),
            }
        }

        Ok(ServerInfo {
            name: name.to_owned(),
            features,
            auth,
        })
    }

    /// Server info of a server answering `HELO` only
    pub(crate) fn without_extensions(name: &str) -> ServerInfo {
        ServerInfo {
            name: name.to_owned(),
            ..ServerInfo::default()
        }
    }

    pub fn supports_feature(&self, keyword: Extension) -> bool {
        self.features.contains(&keyword)
    }

    pub fn supports_auth_mechanism(&self, mechanism: Mechanism) -> bool {
        self.supports_feature(Extension::Authentication(mechanism))
    }

    /// Returns true if the server announced `AUTH`, whatever the mechanisms
    pub fn supports_auth(&self) -> bool {
        self.auth.is_some()
    }

    /// The raw `AUTH` parameters, for instance `PLAIN LOGIN`
    pub fn auth_params(&self) -> Option<&str> {
        self.auth.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
