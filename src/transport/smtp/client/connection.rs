use std::{
    fmt::Display,
    io::{self, BufRead, BufReader, Write},
    net::Shutdown,
};

use base64::{engine::general_purpose::STANDARD, Engine};

#[cfg(feature = "tracing")]
use super::escape_crlf;
use super::{DataWriter, NetworkStream, SmtpClient, TlsParameters};
use crate::{
    transport::smtp::{
        authentication::{AuthServer, Authenticator},
        commands::{Auth, AuthCancel, AuthResponse, Data, Ehlo, Helo, Mail, Quit, Rcpt, Starttls},
        error::{self, Error},
        extension::{ClientId, Extension, ServerInfo},
        response::{parse_response, Response},
    },
    Address, Message,
};

/// Maximum number of challenges answered in one `AUTH` exchange
const MAX_AUTH_CHALLENGES: u8 = 10;

/// A blocking SMTP client over a single connection
#[derive(Debug)]
pub struct SmtpConnection {
    stream: BufReader<NetworkStream>,
    /// Host name the connection was opened to
    server_name: String,
    local_name: ClientId,
    did_hello: bool,
    /// Set once a greeting succeeded
    server_info: Option<ServerInfo>,
}

impl SmtpConnection {
    /// Reads the server greeting on an open stream
    ///
    /// The stream is shut down if the greeting is not a `220` reply.
    pub fn new(stream: NetworkStream, server_name: &str) -> Result<SmtpConnection, Error> {
        let mut conn = SmtpConnection {
            stream: BufReader::new(stream),
            server_name: server_name.to_owned(),
            local_name: ClientId::default(),
            did_hello: false,
            server_info: None,
        };

        match conn.read_response().and_then(|r| expect_code(r, 220)) {
            Ok(_) => Ok(conn),
            Err(err) => {
                let _ = conn.close();
                Err(err)
            }
        }
    }

    /// Host name the connection was opened to
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    fn greet(&mut self) -> Result<&ServerInfo, Error> {
        if !self.did_hello {
            self.did_hello = true;
            let info = self.ehlo()?;
            #[cfg(feature = "tracing")]
            tracing::debug!("server {}", info);
            self.server_info = Some(info);
        }

        self.server_info
            .as_ref()
            .ok_or_else(|| error::client("the server could not be greeted"))
    }

    /// Sends `EHLO`, falling back to `HELO` when the server rejects it
    fn ehlo(&mut self) -> Result<ServerInfo, Error> {
        match self.command(Ehlo::new(self.local_name.clone())) {
            Ok(response) => ServerInfo::from_response(&response),
            Err(err) if err.is_permanent() => {
                #[cfg(feature = "tracing")]
                tracing::debug!("EHLO rejected, trying HELO");
                let response = self.command(Helo::new(self.local_name.clone()))?;
                let response = expect_code(response, 250)?;
                Ok(ServerInfo::without_extensions(
                    response.first_word().unwrap_or_default(),
                ))
            }
            Err(err) => Err(err),
        }
    }

    /// Sends a command and reads the reply
    pub fn command<C: Display>(&mut self, command: C) -> Result<Response, Error> {
        let line = command.to_string();
        self.write(line.as_bytes())?;

        #[cfg(feature = "tracing")]
        tracing::debug!(">> {}", escape_crlf(&line));
        self.read_response()
    }

    /// Sends a command carrying credentials, logging `shown` instead
    fn secret_command<C: Display>(&mut self, command: C, shown: &str) -> Result<Response, Error> {
        self.write(command.to_string().as_bytes())?;

        #[cfg(feature = "tracing")]
        tracing::debug!(">> {}", shown);
        #[cfg(not(feature = "tracing"))]
        let _ = shown;
        self.read_response()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let stream = self.stream.get_mut();
        stream.write_all(bytes).map_err(error::network)?;
        stream.flush().map_err(error::network)
    }

    /// Reads a complete reply
    ///
    /// Negative replies are returned as errors. A closed connection is a
    /// network error caused by an `UnexpectedEof` i/o error.
    pub fn read_response(&mut self) -> Result<Response, Error> {
        let mut buffer = String::with_capacity(100);

        loop {
            let read = self
                .stream
                .read_line(&mut buffer)
                .map_err(error::network)?;
            if read == 0 {
                return Err(error::network(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by the server",
                )));
            }

            #[cfg(feature = "tracing")]
            tracing::debug!("<< {}", escape_crlf(&buffer));

            match parse_response(&buffer) {
                Ok((_remaining, response)) => {
                    return if response.is_positive() {
                        Ok(response)
                    } else {
                        Err(error::code(response.code(), Some(response.text())))
                    };
                }
                Err(nom::Err::Incomplete(_)) => { /* read more */ }
                Err(nom::Err::Failure(e) | nom::Err::Error(e)) => {
                    return Err(error::response(e.to_string()));
                }
            }
        }
    }

    fn auth_exchange(
        &mut self,
        authenticator: &Authenticator,
        initial_response: Option<Vec<u8>>,
    ) -> Result<(), Error> {
        #[cfg(feature = "tracing")]
        tracing::debug!("authenticating with {}", authenticator.mechanism());

        let auth = Auth::new(authenticator.mechanism(), initial_response);
        let mut response = self.secret_command(&auth, &auth.redacted());

        for _ in 0..MAX_AUTH_CHALLENGES {
            let reply = response?;
            let next = match u16::from(reply.code()) {
                334 => {
                    let challenge = STANDARD
                        .decode(reply.text().trim())
                        .map_err(error::response)?;
                    authenticator.next(&challenge, true)?
                }
                235 => authenticator.next(reply.text().as_bytes(), false)?,
                _ => {
                    return Err(error::code(reply.code(), Some(reply.text())));
                }
            };

            match next {
                Some(answer) => {
                    response = self.secret_command(AuthResponse(answer), "<redacted>");
                }
                None => return Ok(()),
            }
        }

        Err(error::authentication("too many authentication challenges"))
    }

    fn data_stream(&mut self, message: &Message) -> Result<(), Error> {
        let mut writer = DataWriter::new(self.stream.get_mut());
        if let Err(err) = message.write_to(&mut writer) {
            // without the terminator the server drops the partial message
            let _ = self.close();
            return Err(error::serialization(err));
        }
        writer.finish().map_err(error::network)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(">> <message data>");

        expect_code(self.read_response()?, 250).map(|_| ())
    }
}

impl SmtpClient for SmtpConnection {
    fn hello(&mut self, local_name: &ClientId) -> Result<(), Error> {
        if self.did_hello {
            return Err(error::client("hello called after other methods"));
        }
        self.local_name = local_name.clone();
        self.greet().map(|_| ())
    }

    fn server_info(&mut self) -> Result<&ServerInfo, Error> {
        self.greet()
    }

    fn is_encrypted(&self) -> bool {
        self.stream.get_ref().is_encrypted()
    }

    fn starttls(&mut self, tls_parameters: &TlsParameters) -> Result<(), Error> {
        if !self.greet()?.supports_feature(Extension::StartTls) {
            return Err(error::client("STARTTLS is not supported on this server"));
        }

        expect_code(self.command(Starttls)?, 220)?;
        self.stream.get_mut().upgrade_tls(tls_parameters)?;
        #[cfg(feature = "tracing")]
        tracing::debug!("connection encrypted");

        // The server forgets what it knew about the client
        let info = self.ehlo()?;
        self.server_info = Some(info);
        Ok(())
    }

    fn auth(&mut self, authenticator: &Authenticator) -> Result<(), Error> {
        let info = self.greet()?.clone();
        let server = AuthServer {
            name: &self.server_name,
            tls: self.stream.get_ref().is_encrypted(),
            info: &info,
        };
        let initial_response = match authenticator.start(&server) {
            Ok(initial_response) => initial_response,
            Err(err) => {
                let _ = self.quit();
                return Err(err);
            }
        };

        let result = self.auth_exchange(authenticator, initial_response);
        if result.is_err() {
            // The connection cannot be trusted anymore
            let _ = self.command(AuthCancel);
            let _ = self.quit();
        }
        result
    }

    fn mail(&mut self, from: &Address) -> Result<(), Error> {
        let info = self.greet()?;
        let command = Mail::new(from.clone())
            .eight_bit_mime(info.supports_feature(Extension::EightBitMime))
            .smtp_utf8(info.supports_feature(Extension::SmtpUtfEight));

        expect_code(self.command(command)?, 250).map(|_| ())
    }

    fn rcpt(&mut self, to: &Address) -> Result<(), Error> {
        self.greet()?;
        match self.command(Rcpt::new(to.clone())) {
            Ok(response) if u16::from(response.code()) / 10 == 25 => Ok(()),
            Ok(response) => Err(error::recipient(unexpected(response))),
            Err(err) if err.status().is_some() => Err(error::recipient(err)),
            Err(err) => Err(err),
        }
    }

    fn data(&mut self, message: &Message) -> Result<(), Error> {
        self.greet()?;
        expect_code(self.command(Data)?, 354)?;
        self.data_stream(message)
    }

    fn quit(&mut self) -> Result<(), Error> {
        let greeted = self.greet().map(|_| ());
        let result = greeted
            .and_then(|()| self.command(Quit))
            .and_then(|response| expect_code(response, 221));
        let closed = self.close();
        result.and(closed)
    }

    fn close(&mut self) -> Result<(), Error> {
        self.stream
            .get_mut()
            .shutdown(Shutdown::Both)
            .map_err(error::network)
    }
}

fn expect_code(response: Response, code: u16) -> Result<Response, Error> {
    if response.has_code(code) {
        Ok(response)
    } else {
        Err(unexpected(response))
    }
}

fn unexpected(response: Response) -> Error {
    error::code(response.code(), Some(response.text()))
}
