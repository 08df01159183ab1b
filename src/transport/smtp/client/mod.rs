//! SMTP client
//!
//! [`SmtpConnection`] speaks the protocol over a [`NetworkStream`]. The
//! dialer does not use it directly: it goes through a [`Connector`], which
//! opens streams and builds clients, so that both can be replaced.
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use mailer::transport::smtp::{
//!     client::{NetworkStream, SmtpClient, SmtpConnection},
//!     extension::ClientId,
//! };
//!
//! let stream = NetworkStream::connect("localhost", 25, None)?;
//! let mut client = SmtpConnection::new(stream, "localhost")?;
//! client.hello(&ClientId::new("my_hostname"))?;
//! client.mail(&"user@example.com".parse()?)?;
//! client.rcpt(&"user@example.org".parse()?)?;
//! client.quit()?;
//! # Ok(())
//! # }
//! ```

use std::{
    fmt::Debug,
    io::{self, Write},
    time::Duration,
};

pub use self::{
    connection::SmtpConnection,
    mock::MockStream,
    net::NetworkStream,
    tls::{Certificate, TlsParameters, TlsParametersBuilder, TlsVersion},
};
use crate::{
    transport::smtp::{
        authentication::Authenticator,
        error::Error,
        extension::{ClientId, ServerInfo},
    },
    Address, Message,
};

mod connection;
pub mod mock;
mod net;
mod tls;

/// The protocol operations the dialer and the sender rely on
pub trait SmtpClient: Send {
    /// Sends `EHLO` with the given name, `HELO` if the server rejects it
    ///
    /// Only needed to choose the name, it must then come first. Other
    /// operations greet the server as `localhost` when needed.
    fn hello(&mut self, local_name: &ClientId) -> Result<(), Error>;

    /// What the server announced, greeting it first if needed
    fn server_info(&mut self) -> Result<&ServerInfo, Error>;

    /// Returns true if the connection is encrypted
    fn is_encrypted(&self) -> bool;

    /// Upgrades the connection with `STARTTLS` and greets the server again
    fn starttls(&mut self, tls_parameters: &TlsParameters) -> Result<(), Error>;

    /// Runs an `AUTH` exchange
    fn auth(&mut self, authenticator: &Authenticator) -> Result<(), Error>;

    /// Starts a mail transaction with `MAIL FROM`
    fn mail(&mut self, from: &Address) -> Result<(), Error>;

    /// Adds a recipient with `RCPT TO`
    fn rcpt(&mut self, to: &Address) -> Result<(), Error>;

    /// Streams the message after `DATA` and ends the transaction
    fn data(&mut self, message: &Message) -> Result<(), Error>;

    /// Sends `QUIT` and closes the connection
    fn quit(&mut self) -> Result<(), Error>;

    /// Closes the connection without `QUIT`
    fn close(&mut self) -> Result<(), Error>;
}

/// Opens connections and builds clients on top of them
pub trait Connector: Debug + Send + Sync {
    /// Opens a plain TCP connection
    fn connect(&self, host: &str, port: u16, timeout: Option<Duration>)
        -> Result<NetworkStream, Error>;

    /// Wraps a stream in TLS, for implicit TLS connections
    fn wrap_tls(
        &self,
        stream: NetworkStream,
        tls_parameters: &TlsParameters,
    ) -> Result<NetworkStream, Error>;

    /// Reads the greeting and returns a client for the connection
    fn new_client(&self, stream: NetworkStream, host: &str) -> Result<Box<dyn SmtpClient>, Error>;
}

/// Connects over the network with [`SmtpConnection`] clients
#[derive(Debug, Default, Clone, Copy)]
pub struct NetConnector;

impl Connector for NetConnector {
    fn connect(
        &self,
        host: &str,
        port: u16,
        timeout: Option<Duration>,
    ) -> Result<NetworkStream, Error> {
        NetworkStream::connect(host, port, timeout)
    }

    fn wrap_tls(
        &self,
        mut stream: NetworkStream,
        tls_parameters: &TlsParameters,
    ) -> Result<NetworkStream, Error> {
        stream.upgrade_tls(tls_parameters)?;
        Ok(stream)
    }

    fn new_client(&self, stream: NetworkStream, host: &str) -> Result<Box<dyn SmtpClient>, Error> {
        Ok(Box::new(SmtpConnection::new(stream, host)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DotState {
    Begin,
    BeginLine,
    Cr,
    Data,
}

/// Applies transparency to the data stream
///
/// Lines starting with a dot get a second one, bare line feeds become
/// CRLF. [`DataWriter::finish`] ends the last line and writes the final
/// `.` line.
pub(crate) struct DataWriter<W: Write> {
    inner: W,
    state: DotState,
    buf: Vec<u8>,
}

const DATA_BUFFER_SIZE: usize = 8 * 1024;

impl<W: Write> DataWriter<W> {
    pub(crate) fn new(inner: W) -> Self {
        DataWriter {
            inner,
            state: DotState::Begin,
            buf: Vec::with_capacity(DATA_BUFFER_SIZE),
        }
    }

    pub(crate) fn finish(mut self) -> io::Result<W> {
        match self.state {
            DotState::Begin | DotState::Data => self.buf.extend_from_slice(b"\r\n.\r\n"),
            DotState::Cr => self.buf.extend_from_slice(b"\n.\r\n"),
            DotState::BeginLine => self.buf.extend_from_slice(b".\r\n"),
        }
        self.flush_buf()?;
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn flush_buf(&mut self) -> io::Result<()> {
        self.inner.write_all(&self.buf)?;
        self.buf.clear();
        Ok(())
    }
}

impl<W: Write> Write for DataWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &byte in buf {
            match self.state {
                DotState::Begin | DotState::BeginLine | DotState::Data => {
                    if self.state != DotState::Data && byte == b'.' {
                        self.buf.push(b'.');
                    }
                    self.state = match byte {
                        b'\r' => DotState::Cr,
                        b'\n' => {
                            self.buf.push(b'\r');
                            DotState::BeginLine
                        }
                        _ => DotState::Data,
                    };
                }
                DotState::Cr => {
                    self.state = if byte == b'\n' {
                        DotState::BeginLine
                    } else {
                        DotState::Data
                    };
                }
            }
            self.buf.push(byte);
        }

        if self.buf.len() >= DATA_BUFFER_SIZE {
            self.flush_buf()?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_buf()?;
        self.inner.flush()
    }
}

/// Returns the string replacing all the CRLF with "\<CRLF\>"
/// Used for debug displays
#[cfg(feature = "tracing")]
pub(super) fn escape_crlf(string: &str) -> String {
    string.replace("\r\n", "<CRLF>")
}
