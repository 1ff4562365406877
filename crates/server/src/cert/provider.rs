//! [`CertificateProvider`]: resolves the server's TLS credentials.

use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};
use rcgen::{
    CertificateParams, DistinguishedName, DnType, Ia5String, KeyPair, SanType, SerialNumber,
    PKCS_RSA_SHA256,
};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use time::OffsetDateTime;
use tracing::{debug, info};

use super::{
    store, CertError, Certificate, CertificateDetails, Clock, Subject, SubjectAltName,
    SystemClock, DEFAULT_KEY_BITS, ORGANIZATION_NAME, VALIDITY_YEARS,
};

/// DNS name every generated certificate is valid for.
const SAN_DNS: &str = "localhost";

/// IP address every generated certificate is valid for.
const SAN_IP: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Loads the certificate/key pair from disk, or generates and persists one.
///
/// The provider holds no filesystem state between calls. Randomness (key
/// material and serial number) and the current time are injected so that
/// generation can be made deterministic.
pub struct CertificateProvider<R = OsRng, C = SystemClock> {
    rng: R,
    clock: C,
    key_bits: usize,
    common_name: String,
}

impl CertificateProvider {
    /// Provider backed by the OS RNG and the system clock, with the local
    /// host name as common name.
    pub fn new() -> Self {
        Self::with_sources(OsRng, SystemClock)
    }
}

impl Default for CertificateProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, C> CertificateProvider<R, C>
where
    R: RngCore + CryptoRng,
    C: Clock,
{
    /// Provider using the given randomness source and clock.
    pub fn with_sources(rng: R, clock: C) -> Self {
        Self {
            rng,
            clock,
            key_bits: DEFAULT_KEY_BITS,
            common_name: local_hostname(),
        }
    }

    /// Override the RSA modulus size of generated keys.
    pub fn with_key_bits(mut self, key_bits: usize) -> Self {
        self.key_bits = key_bits;
        self
    }

    /// Override the common name written into generated certificates.
    pub fn with_common_name(mut self, common_name: impl Into<String>) -> Self {
        self.common_name = common_name.into();
        self
    }

    /// Return the pair stored at `cert_path`/`key_path`, generating it first
    /// if either file is missing.
    ///
    /// Existing files are returned verbatim without validation.
    ///
    /// # Errors
    ///
    /// - [`CertError::Load`] if a file exists but cannot be read.
    /// - [`CertError::KeyGeneration`] / [`CertError::Build`] if generation fails.
    /// - [`CertError::Persist`] if the generated pair cannot be written.
    pub fn ensure(&mut self, cert_path: &Path, key_path: &Path) -> Result<Certificate, CertError> {
        if let Some((cert_pem, key_pem)) = store::read_pair(cert_path, key_path)? {
            debug!(cert_path = %cert_path.display(), "loaded TLS certificate from disk");
            return Ok(Certificate {
                cert_pem,
                key_pem,
                details: None,
            });
        }

        debug!(
            cert_path = %cert_path.display(),
            "could not find TLS certificate, generating a new one"
        );
        let certificate = self.generate()?;
        store::write_pair(
            cert_path,
            &certificate.cert_pem,
            key_path,
            &certificate.key_pem,
        )?;

        if let Some(details) = &certificate.details {
            info!(
                cert_path = %cert_path.display(),
                key_path = %key_path.display(),
                serial = details.serial_number,
                not_after = %details.not_after,
                "generated self-signed TLS certificate"
            );
        }
        Ok(certificate)
    }

    /// Generate a new self-signed certificate without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`CertError::KeyGeneration`] or [`CertError::Build`] if the key
    /// or certificate cannot be produced.
    pub fn generate(&mut self) -> Result<Certificate, CertError> {
        let private_key = RsaPrivateKey::new(&mut self.rng, self.key_bits)
            .map_err(|e| CertError::KeyGeneration(e.to_string()))?;
        let key_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| CertError::KeyGeneration(e.to_string()))?;
        let key_pair = KeyPair::from_pem_and_sign_algo(&key_pem, &PKCS_RSA_SHA256)?;

        // DER INTEGERs are signed; keep the serial strictly positive.
        let serial_number = self.rng.gen_range(1..=i64::MAX as u64);
        let not_before = self.clock.now();
        let not_after = add_years(not_before, VALIDITY_YEARS).ok_or(CertError::ValidityOutOfRange)?;

        let subject = Subject {
            organization: ORGANIZATION_NAME.to_owned(),
            common_name: self.common_name.clone(),
        };
        let subject_alt_names = vec![
            SubjectAltName::Dns(SAN_DNS.to_owned()),
            SubjectAltName::Ip(SAN_IP),
        ];

        let mut distinguished_name = DistinguishedName::new();
        distinguished_name.push(DnType::OrganizationName, subject.organization.as_str());
        distinguished_name.push(DnType::CommonName, subject.common_name.as_str());

        let mut params = CertificateParams::default();
        params.serial_number = Some(SerialNumber::from(serial_number));
        params.not_before = not_before;
        params.not_after = not_after;
        params.distinguished_name = distinguished_name;
        params.subject_alt_names = vec![
            SanType::DnsName(Ia5String::try_from(SAN_DNS)?),
            SanType::IpAddress(SAN_IP),
        ];

        let cert = params.self_signed(&key_pair)?;

        Ok(Certificate {
            cert_pem: cert.pem().into_bytes(),
            key_pem: key_pem.as_bytes().to_vec(),
            details: Some(CertificateDetails {
                serial_number,
                not_before,
                not_after,
                subject,
                subject_alt_names,
            }),
        })
    }
}

/// Same calendar day and time of day, `years` later.
///
/// February 29 maps to February 28 when the target year is not a leap year.
pub(crate) fn add_years(at: OffsetDateTime, years: i32) -> Option<OffsetDateTime> {
    let year = at.year().checked_add(years)?;
    at.replace_year(year)
        .or_else(|_| at.replace_day(28).and_then(|d| d.replace_year(year)))
        .ok()
}

fn local_hostname() -> String {
    hostname::get()
        .ok()
        .map(|h| h.to_string_lossy().into_owned())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| SAN_DNS.to_owned())
}
