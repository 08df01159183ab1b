use std::fmt::{self, Debug, Formatter};

use native_tls::{Protocol, TlsConnector};

use crate::transport::smtp::error::{self, Error};

/// Minimal TLS version
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TlsVersion {
    Tlsv10,
    Tlsv11,
    Tlsv12,
}

/// A root certificate to trust
#[derive(Clone)]
pub struct Certificate(native_tls::Certificate);

impl Certificate {
    /// Create a `Certificate` from a DER encoded certificate
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        native_tls::Certificate::from_der(der)
            .map(Certificate)
            .map_err(error::tls)
    }

    /// Create a `Certificate` from a PEM encoded certificate
    pub fn from_pem(pem: &[u8]) -> Result<Self, Error> {
        native_tls::Certificate::from_pem(pem)
            .map(Certificate)
            .map_err(error::tls)
    }
}

impl Debug for Certificate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate").finish()
    }
}

/// Parameters for the TLS handshake, used both for implicit TLS and for
/// STARTTLS
#[derive(Clone)]
pub struct TlsParameters {
    pub(crate) connector: TlsConnector,
    /// The domain name which is expected in the TLS certificate from the server
    pub(crate) domain: String,
}

impl TlsParameters {
    /// Creates a new `TlsParameters` using the default configuration
    pub fn new(domain: String) -> Result<Self, Error> {
        TlsParametersBuilder::new(domain).build()
    }

    /// Creates a new `TlsParameters` builder
    pub fn builder(domain: String) -> TlsParametersBuilder {
        TlsParametersBuilder::new(domain)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl Debug for TlsParameters {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsParameters")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

/// Builder for `TlsParameters`
#[derive(Debug, Clone)]
pub struct TlsParametersBuilder {
    domain: String,
    root_certs: Vec<Certificate>,
    disable_built_in_roots: bool,
    accept_invalid_hostnames: bool,
    accept_invalid_certs: bool,
    min_tls_version: TlsVersion,
}

impl TlsParametersBuilder {
    pub fn new(domain: String) -> Self {
        Self {
            domain,
            root_certs: Vec::new(),
            disable_built_in_roots: false,
            accept_invalid_hostnames: false,
            accept_invalid_certs: false,
            min_tls_version: TlsVersion::Tlsv12,
        }
    }

    /// Add a custom root certificate
    ///
    /// Can be used to safely connect to a server using a self-signed certificate, for example.
    pub fn add_root_certificate(mut self, cert: Certificate) -> Self {
        self.root_certs.push(cert);
        self
    }

    /// Only trust the certificates added with `add_root_certificate`
    pub fn disable_built_in_roots(mut self, disable: bool) -> Self {
        self.disable_built_in_roots = disable;
        self
    }

    /// Controls whether certificates with an invalid hostname are accepted
    ///
    /// Defaults to `false`.
    ///
    /// # Warning
    ///
    /// If hostname verification is disabled *any* valid certificate,
    /// including those from other sites, are trusted.
    pub fn dangerous_accept_invalid_hostnames(mut self, accept_invalid_hostnames: bool) -> Self {
        self.accept_invalid_hostnames = accept_invalid_hostnames;
        self
    }

    /// Controls whether invalid certificates are accepted
    ///
    /// Defaults to `false`.
    ///
    /// # Warning
    ///
    /// If certificate verification is disabled, *any* certificate
    /// is trusted for use, including self signed and expired ones.
    pub fn dangerous_accept_invalid_certs(mut self, accept_invalid_certs: bool) -> Self {
        self.accept_invalid_certs = accept_invalid_certs;
        self
    }

    /// Controls which minimum TLS version is allowed
    ///
    /// Defaults to [`Tlsv12`][TlsVersion::Tlsv12].
    pub fn set_min_tls_version(mut self, min_tls_version: TlsVersion) -> Self {
        self.min_tls_version = min_tls_version;
        self
    }

    pub fn build(self) -> Result<TlsParameters, Error> {
        let mut tls_builder = TlsConnector::builder();

        tls_builder.disable_built_in_roots(self.disable_built_in_roots);
        for cert in self.root_certs {
            tls_builder.add_root_certificate(cert.0);
        }
        tls_builder.danger_accept_invalid_hostnames(self.accept_invalid_hostnames);
        tls_builder.danger_accept_invalid_certs(self.accept_invalid_certs);
        tls_builder.min_protocol_version(Some(match self.min_tls_version {
            TlsVersion::Tlsv10 => Protocol::Tlsv10,
            TlsVersion::Tlsv11 => Protocol::Tlsv11,
            TlsVersion::Tlsv12 => Protocol::Tlsv12,
        }));

        let connector = tls_builder.build().map_err(error::tls)?;
        Ok(TlsParameters {
            connector,
            domain: self.domain,
        })
    }
}
