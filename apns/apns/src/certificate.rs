use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::x509::X509Ref;
use thiserror::Error;

/// Certificate error.
#[derive(Error, Debug)]
pub enum CertificateError {
    /// PKCS#12 file could not be read.
    #[error("certificate not found at {path:?}: {source}")]
    NotFound {
        /// Path of the bundle.
        path: PathBuf,
        /// Error from [`std::io`].
        source: std::io::Error,
    },
    /// Wrong passphrase, malformed bundle, or no private key and certificate inside.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),
}

/// Client identity, private key and certificate, decoded from a PKCS#12 bundle.
///
/// An identity belongs to exactly one send. It is never cached, so a rotated
/// certificate is picked up by the next send without restarting anything.
pub struct Identity {
    inner: reqwest::Identity,
    common_name: Option<String>,
}

impl Identity {
    /// Loads an [`Identity`] from a PKCS#12 file encrypted with `passphrase`.
    ///
    /// ```no_run
    /// # use apns::Identity;
    /// let identity = Identity::from_pkcs12_file("push.p12", "123456");
    /// ```
    pub fn from_pkcs12_file<P>(path: P, passphrase: &str) -> Result<Self, CertificateError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let der = fs::read(path).map_err(|source| CertificateError::NotFound {
            path: path.to_path_buf(),
            source,
        })?;
        let identity = Self::from_pkcs12_der(&der, passphrase)?;
        debug!(
            "load identity {:?} from {path:?}",
            identity.common_name.as_deref().unwrap_or("-")
        );
        Ok(identity)
    }

    /// Decodes an [`Identity`] from an in-memory PKCS#12 bundle.
    pub fn from_pkcs12_der(der: &[u8], passphrase: &str) -> Result<Self, CertificateError> {
        let parsed = Pkcs12::from_der(der)
            .and_then(|p| p.parse2(passphrase))
            .map_err(|e| CertificateError::InvalidCertificate(e.to_string()))?;

        // Both halves are needed to answer a client certificate request
        let cert = match (parsed.pkey, parsed.cert) {
            (Some(_), Some(cert)) => cert,
            _ => {
                return Err(CertificateError::InvalidCertificate(
                    "no identity found in bundle".to_string(),
                ))
            }
        };
        let common_name = common_name(&cert);

        let inner = reqwest::Identity::from_pkcs12_der(der, passphrase)
            .map_err(|e| CertificateError::InvalidCertificate(e.to_string()))?;
        Ok(Self { inner, common_name })
    }

    /// Common name in the subject of the certificate, if any.
    pub fn subject_common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    pub(crate) fn into_inner(self) -> reqwest::Identity {
        self.inner
    }
}

pub(crate) fn common_name(cert: &X509Ref) -> Option<String> {
    cert.subject_name()
        .entries_by_nid(Nid::COMMONNAME)
        .next()
        .and_then(|e| std::str::from_utf8(e.data().as_slice()).ok())
        .map(str::to_string)
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("common_name", &self.common_name)
            .finish_non_exhaustive()
    }
}
