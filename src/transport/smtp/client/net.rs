use std::{
    fmt::{self, Debug, Formatter},
    io::{self, Read, Write},
    mem,
    net::{Shutdown, TcpStream, ToSocketAddrs},
    time::Duration,
};

use native_tls::TlsStream;

use super::{mock::MockStream, tls::TlsParameters};
use crate::transport::smtp::error::{self, Error};

/// A network stream
pub struct NetworkStream {
    inner: InnerNetworkStream,
}

/// Represents the different types of underlying network streams
enum InnerNetworkStream {
    /// Plain TCP stream
    Tcp(TcpStream),
    /// Encrypted TCP stream
    Tls(Box<TlsStream<TcpStream>>),
    /// Mock stream
    Mock(MockStream),
    /// Can't be built
    None,
}

impl NetworkStream {
    fn new(inner: InnerNetworkStream) -> Self {
        NetworkStream { inner }
    }

    /// Wraps an in-memory stream
    pub fn new_mock(stream: MockStream) -> Self {
        Self::new(InnerNetworkStream::Mock(stream))
    }

    /// Opens a TCP connection to the first reachable address of `host`
    pub fn connect(host: &str, port: u16, timeout: Option<Duration>) -> Result<Self, Error> {
        let addrs = (host, port).to_socket_addrs().map_err(error::connection)?;

        let mut last_err = None;
        for addr in addrs {
            let attempt = match timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    let mut stream = Self::new(InnerNetworkStream::Tcp(stream));
                    stream.set_read_timeout(timeout)?;
                    stream.set_write_timeout(timeout)?;
                    return Ok(stream);
                }
                Err(err) => last_err = Some(err),
            }
        }

        Err(match last_err {
            Some(err) => error::connection(err),
            None => error::connection(format!("could not resolve {host}:{port}")),
        })
    }

    /// Performs the TLS handshake over a plain TCP stream
    ///
    /// An already encrypted stream is returned as is.
    pub fn upgrade_tls(&mut self, tls_parameters: &TlsParameters) -> Result<(), Error> {
        match mem::replace(&mut self.inner, InnerNetworkStream::None) {
            InnerNetworkStream::Tcp(stream) => {
                let stream = tls_parameters
                    .connector
                    .connect(&tls_parameters.domain, stream)
                    .map_err(error::tls)?;
                self.inner = InnerNetworkStream::Tls(Box::new(stream));
                Ok(())
            }
            InnerNetworkStream::Mock(stream) => {
                self.inner = InnerNetworkStream::Mock(stream);
                Err(error::tls("cannot upgrade an in-memory stream"))
            }
            other => {
                self.inner = other;
                Ok(())
            }
        }
    }

    /// Returns true if the stream is encrypted
    pub fn is_encrypted(&self) -> bool {
        matches!(self.inner, InnerNetworkStream::Tls(_))
    }

    pub fn set_read_timeout(&mut self, duration: Option<Duration>) -> Result<(), Error> {
        match &self.inner {
            InnerNetworkStream::Tcp(stream) => stream.set_read_timeout(duration),
            InnerNetworkStream::Tls(stream) => stream.get_ref().set_read_timeout(duration),
            InnerNetworkStream::Mock(_) | InnerNetworkStream::None => Ok(()),
        }
        .map_err(error::network)
    }

    pub fn set_write_timeout(&mut self, duration: Option<Duration>) -> Result<(), Error> {
        match &self.inner {
            InnerNetworkStream::Tcp(stream) => stream.set_write_timeout(duration),
            InnerNetworkStream::Tls(stream) => stream.get_ref().set_write_timeout(duration),
            InnerNetworkStream::Mock(_) | InnerNetworkStream::None => Ok(()),
        }
        .map_err(error::network)
    }

    /// Shutdowns the connection
    pub fn shutdown(&mut self, how: Shutdown) -> io::Result<()> {
        match &mut self.inner {
            InnerNetworkStream::Tcp(stream) => stream.shutdown(how),
            InnerNetworkStream::Tls(stream) => {
                // close_notify is best effort, the socket is closed anyway
                let _ = stream.shutdown();
                stream.get_ref().shutdown(how)
            }
            InnerNetworkStream::Mock(_) | InnerNetworkStream::None => Ok(()),
        }
    }
}

impl Debug for NetworkStream {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self.inner {
            InnerNetworkStream::Tcp(_) => "NetworkStream::Tcp",
            InnerNetworkStream::Tls(_) => "NetworkStream::Tls",
            InnerNetworkStream::Mock(_) => "NetworkStream::Mock",
            InnerNetworkStream::None => "NetworkStream::None",
        })
    }
}

impl Read for NetworkStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            InnerNetworkStream::Tcp(s) => s.read(buf),
            InnerNetworkStream::Tls(s) => s.read(buf),
            InnerNetworkStream::Mock(s) => s.read(buf),
            InnerNetworkStream::None => Ok(0),
        }
    }
}

impl Write for NetworkStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            InnerNetworkStream::Tcp(s) => s.write(buf),
            InnerNetworkStream::Tls(s) => s.write(buf),
            InnerNetworkStream::Mock(s) => s.write(buf),
            InnerNetworkStream::None => Err(io::ErrorKind::NotConnected.into()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            InnerNetworkStream::Tcp(s) => s.flush(),
            InnerNetworkStream::Tls(s) => s.flush(),
            InnerNetworkStream::Mock(s) => s.flush(),
            InnerNetworkStream::None => Ok(()),
        }
    }
}
