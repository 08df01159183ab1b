//! SASL mechanisms used by the `AUTH` command

use std::{
    fmt::{self, Debug, Display, Formatter},
    str::FromStr,
};

use hmac::{Hmac, Mac};
use md5::Md5;

use crate::transport::smtp::{
    error::{self, Error},
    extension::ServerInfo,
};

/// Contains user credentials
#[derive(PartialEq, Eq, Clone, Hash)]
pub struct Credentials {
    authentication_identity: String,
    secret: String,
}

impl Credentials {
    /// Create a `Credentials` struct from username and password
    pub fn new(username: String, password: String) -> Credentials {
        Credentials {
            authentication_identity: username,
            secret: password,
        }
    }

    pub fn username(&self) -> &str {
        &self.authentication_identity
    }
}

impl<S, T> From<(S, T)> for Credentials
where
    S: Into<String>,
    T: Into<String>,
{
    fn from((username, password): (S, T)) -> Self {
        Credentials::new(username.into(), password.into())
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.authentication_identity)
            .finish_non_exhaustive()
    }
}

/// Represents authentication mechanisms
#[derive(PartialEq, Eq, Copy, Clone, Hash, Debug)]
pub enum Mechanism {
    /// CRAM-MD5 authentication mechanism, defined in
    /// [RFC 2195](https://tools.ietf.org/html/rfc2195)
    CramMd5,
    /// LOGIN authentication mechanism
    /// Obsolete but needed for some providers (like office365)
    ///
    /// Defined in [draft-murchison-sasl-login-00](https://www.ietf.org/archive/id/draft-murchison-sasl-login-00.txt).
    Login,
    /// PLAIN authentication mechanism, defined in
    /// [RFC 4616](https://tools.ietf.org/html/rfc4616)
    Plain,
}

impl Display for Mechanism {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Mechanism::CramMd5 => "CRAM-MD5",
            Mechanism::Login => "LOGIN",
            Mechanism::Plain => "PLAIN",
        })
    }
}

impl FromStr for Mechanism {
    type Err = Error;

    fn from_str(s: &str) -> Result<Mechanism, Error> {
        match s.to_ascii_uppercase().as_str() {
            "CRAM-MD5" => Ok(Mechanism::CramMd5),
            "LOGIN" => Ok(Mechanism::Login),
            "PLAIN" => Ok(Mechanism::Plain),
            _ => Err(error::client(format!("unsupported mechanism {s:?}"))),
        }
    }
}

impl Mechanism {
    /// Picks the mechanism to use with a server
    ///
    /// CRAM-MD5 when offered, else LOGIN when offered without PLAIN, else
    /// PLAIN.
    pub fn select(server: &ServerInfo) -> Mechanism {
        if server.supports_auth_mechanism(Mechanism::CramMd5) {
            Mechanism::CramMd5
        } else if server.supports_auth_mechanism(Mechanism::Login)
            && !server.supports_auth_mechanism(Mechanism::Plain)
        {
            Mechanism::Login
        } else {
            Mechanism::Plain
        }
    }
}

/// The connection an exchange is started on
#[derive(Debug, Clone, Copy)]
pub struct AuthServer<'a> {
    /// Host name the client connected to
    pub name: &'a str,
    /// Whether the connection is encrypted
    pub tls: bool,
    pub info: &'a ServerInfo,
}

/// A mechanism bound to credentials and to the expected server name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticator {
    mechanism: Mechanism,
    credentials: Credentials,
    host: String,
}

impl Authenticator {
    pub fn new(mechanism: Mechanism, credentials: Credentials, host: impl Into<String>) -> Self {
        Authenticator {
            mechanism,
            credentials,
            host: host.into(),
        }
    }

    pub fn mechanism(&self) -> Mechanism {
        self.mechanism
    }

    /// Checks the server and returns the initial response, if the mechanism
    /// sends one with the `AUTH` command.
    pub fn start(&self, server: &AuthServer<'_>) -> Result<Option<Vec<u8>>, Error> {
        match self.mechanism {
            Mechanism::CramMd5 => Ok(None),
            Mechanism::Login => {
                if !server.tls && !server.info.supports_auth_mechanism(Mechanism::Login) {
                    return Err(error::authentication("unencrypted connection"));
                }
                self.check_host(server)?;
                Ok(None)
            }
            Mechanism::Plain => {
                if !server.tls && !is_localhost(server.name) {
                    return Err(error::authentication("unencrypted connection"));
                }
                self.check_host(server)?;
                Ok(Some(
                    format!(
                        "\u{0}{}\u{0}{}",
                        self.credentials.authentication_identity, self.credentials.secret
                    )
                    .into_bytes(),
                ))
            }
        }
    }

    /// Answers a decoded server challenge
    ///
    /// `more` is false once the server accepted the exchange, no response is
    /// then expected.
    pub fn next(&self, challenge: &[u8], more: bool) -> Result<Option<Vec<u8>>, Error> {
        if !more {
            return Ok(None);
        }

        match self.mechanism {
            Mechanism::CramMd5 => {
                let mut mac = Hmac::<Md5>::new_from_slice(self.credentials.secret.as_bytes())
                    .map_err(|_| error::authentication("invalid CRAM-MD5 key"))?;
                mac.update(challenge);
                let digest = hex::encode(mac.finalize().into_bytes());

                Ok(Some(
                    format!("{} {digest}", self.credentials.authentication_identity).into_bytes(),
                ))
            }
            Mechanism::Login => match challenge {
                b"Username:" => Ok(Some(
                    self.credentials.authentication_identity.clone().into_bytes(),
                )),
                b"Password:" => Ok(Some(self.credentials.secret.clone().into_bytes())),
                _ => Err(error::authentication(format!(
                    "unexpected server challenge: {}",
                    String::from_utf8_lossy(challenge)
                ))),
            },
            Mechanism::Plain => Err(error::authentication("unexpected server challenge")),
        }
    }

    fn check_host(&self, server: &AuthServer<'_>) -> Result<(), Error> {
        if server.name != self.host {
            return Err(error::authentication("wrong host name"));
        }
        Ok(())
    }
}

fn is_localhost(name: &str) -> bool {
    matches!(name, "localhost" | "127.0.0.1" | "::1")
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::transport::smtp::response::Response;

    fn server_info(auth: &str) -> ServerInfo {
        let response: Response = format!("250-mx.example.com\r\n250 AUTH {auth}\r\n")
            .parse()
            .unwrap();
        ServerInfo::from_response(&response).unwrap()
    }

    fn authenticator(mechanism: Mechanism) -> Authenticator {
        Authenticator::new(
            mechanism,
            Credentials::from(("alice", "wonderland")),
            "smtp.example.com",
        )
    }

    #[test]
    fn select_by_priority() {
        assert_eq!(
            Mechanism::select(&server_info("PLAIN LOGIN CRAM-MD5")),
            Mechanism::CramMd5
        );
        assert_eq!(Mechanism::select(&server_info("LOGIN")), Mechanism::Login);
        assert_eq!(
            Mechanism::select(&server_info("LOGIN PLAIN")),
            Mechanism::Plain
        );
        assert_eq!(Mechanism::select(&server_info("XOAUTH2")), Mechanism::Plain);
    }

    #[test]
    fn plain() {
        let info = server_info("PLAIN");
        let auth = authenticator(Mechanism::Plain);

        let server = AuthServer {
            name: "smtp.example.com",
            tls: true,
            info: &info,
        };
        assert_eq!(
            auth.start(&server).unwrap(),
            Some(b"\0alice\0wonderland".to_vec())
        );
        assert_eq!(auth.next(b"", false).unwrap(), None);
        assert!(auth.next(b"more?", true).unwrap_err().is_authentication());

        let clear = AuthServer { tls: false, ..server };
        assert_eq!(
            auth.start(&clear).unwrap_err().to_string(),
            "authentication error: unencrypted connection"
        );

        let wrong = AuthServer {
            name: "mx.example.org",
            ..server
        };
        assert_eq!(
            auth.start(&wrong).unwrap_err().to_string(),
            "authentication error: wrong host name"
        );
    }

    #[test]
    fn plain_on_localhost_without_tls() {
        let info = server_info("PLAIN");
        let auth = Authenticator::new(Mechanism::Plain, ("u", "p").into(), "localhost");
        let server = AuthServer {
            name: "localhost",
            tls: false,
            info: &info,
        };
        assert!(auth.start(&server).is_ok());
    }

    #[test]
    fn login() {
        let auth = authenticator(Mechanism::Login);

        let advertised = server_info("LOGIN");
        let server = AuthServer {
            name: "smtp.example.com",
            tls: false,
            info: &advertised,
        };
        assert_eq!(auth.start(&server).unwrap(), None);

        let not_advertised = server_info("PLAIN");
        let clear = AuthServer {
            info: &not_advertised,
            ..server
        };
        assert!(auth.start(&clear).is_err());
        assert!(auth.start(&AuthServer { tls: true, ..clear }).is_ok());

        assert_eq!(auth.next(b"Username:", true).unwrap(), Some(b"alice".to_vec()));
        assert_eq!(
            auth.next(b"Password:", true).unwrap(),
            Some(b"wonderland".to_vec())
        );
        assert_eq!(
            auth.next(b"Code:", true).unwrap_err().to_string(),
            "authentication error: unexpected server challenge: Code:"
        );
        assert_eq!(auth.next(b"", false).unwrap(), None);
    }

    #[test]
    fn cram_md5() {
        let auth = Authenticator::new(
            Mechanism::CramMd5,
            ("tim", "tanstaaftanstaaf").into(),
            "postoffice.reston.mci.net",
        );
        let info = server_info("CRAM-MD5");
        let server = AuthServer {
            name: "elsewhere",
            tls: false,
            info: &info,
        };
        assert_eq!(auth.start(&server).unwrap(), None);
        assert_eq!(
            auth.next(b"<1896.697170952@postoffice.reston.mci.net>", true)
                .unwrap(),
            Some(b"tim b913a602c7eda7a495b4e6e7334d3890".to_vec())
        );
    }

    #[test]
    fn debug_hides_secret() {
        let credentials = Credentials::from(("alice", "wonderland"));
        assert!(!format!("{credentials:?}").contains("wonderland"));
    }
}
