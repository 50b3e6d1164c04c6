use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use boring::pkcs12::Pkcs12;
use boring::ssl::{SslConnectorBuilder, SslFiletype, SslVerifyMode, SslVersion};
use std::ffi::CString;
use std::fs;
use std::path::{Path, PathBuf};

/// Strong suites only; no anonymous, static-RSA, PSK, RC4 or MD5 ciphers.
pub const DEFAULT_CIPHER_LIST: &str = "HIGH:!aNULL:!kRSA:!PSK:!RC4:!MD5";

/// Protocol selector for the TLS handshake.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SslProtocol {
    /// Whatever the library negotiates by default.
    #[default]
    SystemDefault,
    /// Highest version both sides support.
    SslV23,
    TlsV1,
    TlsV1_1,
    TlsV1_2,
    /// Not supported by BoringSSL; selecting it fails the connection.
    SslV3,
}

impl SslProtocol {
    /// Minimum and maximum protocol versions for this selector.
    pub fn versions(self) -> Result<(Option<SslVersion>, Option<SslVersion>), NetError> {
        match self {
            SslProtocol::SystemDefault | SslProtocol::SslV23 => Ok((None, None)),
            SslProtocol::TlsV1 => Ok((Some(SslVersion::TLS1), Some(SslVersion::TLS1))),
            SslProtocol::TlsV1_1 => Ok((Some(SslVersion::TLS1_1), Some(SslVersion::TLS1_1))),
            SslProtocol::TlsV1_2 => Ok((Some(SslVersion::TLS1_2), Some(SslVersion::TLS1_2))),
            SslProtocol::SslV3 => Err(NetError::SslVersionUnsupported),
        }
    }
}

/// On-disk encoding of a client certificate file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertificateFormat {
    Pem,
    Asn1,
    Engine,
    Pkcs8,
    Pkcs12,
}

impl CertificateFormat {
    /// Infer the format from the file extension. Unknown or missing
    /// extensions are treated as PEM.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("der") => CertificateFormat::Asn1,
            Some("eng") => CertificateFormat::Engine,
            Some("key") => CertificateFormat::Pkcs8,
            Some("p12") => CertificateFormat::Pkcs12,
            _ => CertificateFormat::Pem,
        }
    }
}

/// A client certificate (or private key) to present during the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateFile {
    path: PathBuf,
    format: CertificateFormat,
}

impl CertificateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = CertificateFormat::from_path(&path);
        Self { path, format }
    }

    /// Override the format inferred from the extension.
    pub fn with_format(mut self, format: CertificateFormat) -> Self {
        self.format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> CertificateFormat {
        self.format
    }

    fn load_into(&self, builder: &mut SslConnectorBuilder) -> Result<(), NetError> {
        let failed = |_| NetError::CertificateLoadFailed(self.path.clone());
        match self.format {
            CertificateFormat::Pem => {
                builder
                    .set_certificate_chain_file(&self.path)
                    .map_err(failed)?;
                // Bundled cert + key files carry the key in the same PEM.
                let pem = fs::read(&self.path).file_context(&self.path)?;
                if pem.windows(11).any(|w| w == b"PRIVATE KEY") {
                    builder
                        .set_private_key_file(&self.path, SslFiletype::PEM)
                        .map_err(failed)?;
                }
            }
            CertificateFormat::Asn1 => {
                builder
                    .set_certificate_file(&self.path, SslFiletype::ASN1)
                    .map_err(failed)?;
            }
            CertificateFormat::Pkcs8 => {
                builder
                    .set_private_key_file(&self.path, SslFiletype::PEM)
                    .map_err(failed)?;
            }
            CertificateFormat::Pkcs12 => {
                let der = fs::read(&self.path).file_context(&self.path)?;
                let parsed = Pkcs12::from_der(&der)
                    .and_then(|p12| p12.parse(""))
                    .map_err(failed)?;
                builder.set_certificate(&parsed.cert).map_err(failed)?;
                builder.set_private_key(&parsed.pkey).map_err(failed)?;
                if let Some(chain) = parsed.chain {
                    for cert in chain {
                        builder.add_extra_chain_cert(cert).map_err(failed)?;
                    }
                }
            }
            CertificateFormat::Engine => {
                tracing::warn!(path = ?self.path, "engine-backed keys are not supported");
                return Err(NetError::CertificateLoadFailed(self.path.clone()));
            }
        }
        Ok(())
    }
}

impl From<&str> for CertificateFile {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<PathBuf> for CertificateFile {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

/// A PEM file of certificate revocation lists checked for the whole chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationLists {
    path: PathBuf,
}

impl RevocationLists {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_into(&self, builder: &mut SslConnectorBuilder) -> Result<(), NetError> {
        let failed = || NetError::RevocationListLoadFailed(self.path.clone());
        let c_path = self
            .path
            .to_str()
            .and_then(|p| CString::new(p).ok())
            .ok_or_else(failed)?;

        // The safe API has no CRL file loader; go through the store directly.
        unsafe {
            let store = boring_sys::SSL_CTX_get_cert_store(builder.as_ptr());
            if store.is_null() {
                return Err(failed());
            }
            let lookup = boring_sys::X509_STORE_add_lookup(store, boring_sys::X509_LOOKUP_file());
            if lookup.is_null() {
                return Err(failed());
            }
            let loaded = boring_sys::X509_load_crl_file(
                lookup,
                c_path.as_ptr(),
                boring_sys::X509_FILETYPE_PEM as _,
            );
            if loaded <= 0 {
                return Err(failed());
            }
            boring_sys::X509_STORE_set_flags(
                store,
                (boring_sys::X509_V_FLAG_CRL_CHECK | boring_sys::X509_V_FLAG_CRL_CHECK_ALL) as _,
            );
        }
        Ok(())
    }
}

impl From<&str> for RevocationLists {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Whether the server certificate and hostname are verified. On by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerifyPeer(bool);

impl VerifyPeer {
    pub fn new(enabled: bool) -> Self {
        Self(enabled)
    }

    pub fn is_enabled(&self) -> bool {
        self.0
    }
}

impl Default for VerifyPeer {
    fn default() -> Self {
        Self(true)
    }
}

impl From<bool> for VerifyPeer {
    fn from(enabled: bool) -> Self {
        Self(enabled)
    }
}

/// Builder for `TlsOptions`.
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct TlsOptionsBuilder {
    config: TlsOptions,
}

/// TLS connection configuration options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsOptions {
    /// Protocol version selector.
    pub protocol: SslProtocol,

    /// Client certificate presented to the server.
    pub certificate: Option<CertificateFile>,

    /// Trust store replacing the system default.
    pub ca_bundle: Option<PathBuf>,

    /// Revocation lists enforced during verification.
    pub revocation_lists: Option<RevocationLists>,

    /// Peer certificate and hostname verification.
    pub verify_peer: VerifyPeer,

    /// Cipher suite configuration string.
    pub cipher_list: String,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self {
            protocol: SslProtocol::default(),
            certificate: None,
            ca_bundle: None,
            revocation_lists: None,
            verify_peer: VerifyPeer::default(),
            cipher_list: DEFAULT_CIPHER_LIST.to_string(),
        }
    }
}

impl TlsOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn protocol(mut self, protocol: SslProtocol) -> Self {
        self.config.protocol = protocol;
        self
    }

    pub fn certificate(mut self, certificate: impl Into<CertificateFile>) -> Self {
        self.config.certificate = Some(certificate.into());
        self
    }

    pub fn ca_bundle(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ca_bundle = Some(path.into());
        self
    }

    pub fn revocation_lists(mut self, lists: impl Into<RevocationLists>) -> Self {
        self.config.revocation_lists = Some(lists.into());
        self
    }

    pub fn verify_peer(mut self, verify: bool) -> Self {
        self.config.verify_peer = VerifyPeer::new(verify);
        self
    }

    pub fn cipher_list(mut self, ciphers: &str) -> Self {
        self.config.cipher_list = ciphers.to_string();
        self
    }

    pub fn build(self) -> TlsOptions {
        self.config
    }
}

impl TlsOptions {
    pub fn builder() -> TlsOptionsBuilder {
        TlsOptionsBuilder::new()
    }

    /// Whether every option is at its default value.
    pub fn is_default(&self) -> bool {
        *self == TlsOptions::default()
    }

    /// Apply this configuration to an SSL connector builder.
    pub fn apply_to_builder(&self, builder: &mut SslConnectorBuilder) -> Result<(), NetError> {
        let (min, max) = self.protocol.versions()?;
        builder
            .set_min_proto_version(min)
            .map_err(|_| NetError::SslProtocolError)?;
        builder
            .set_max_proto_version(max)
            .map_err(|_| NetError::SslProtocolError)?;

        builder
            .set_cipher_list(&self.cipher_list)
            .map_err(|_| NetError::SslProtocolError)?;

        if self.verify_peer.is_enabled() {
            builder.set_verify(SslVerifyMode::PEER);
            match &self.ca_bundle {
                Some(bundle) => builder
                    .set_ca_file(bundle)
                    .map_err(|_| NetError::CertificateLoadFailed(bundle.clone()))?,
                None => builder
                    .set_default_verify_paths()
                    .map_err(|_| NetError::SslProtocolError)?,
            }
            if let Some(lists) = &self.revocation_lists {
                lists.load_into(builder)?;
            }
        } else {
            builder.set_verify(SslVerifyMode::NONE);
        }

        if let Some(certificate) = &self.certificate {
            certificate.load_into(builder)?;
        }

        Ok(())
    }
}
