//! TLS configuration and certificate pinning.
//!
//! A [`TrustValidator`] decides whether a server identity challenge should be
//! trusted. It accepts a connection only when the presented chain passes
//! standard trust evaluation **and** the leaf certificate is byte-for-byte
//! identical to one pinned certificate. Every other outcome cancels the
//! handshake, including a missing pinned certificate.
//!
//! [`PinningVerifier`] plugs the validator into rustls so the check runs once
//! per connection, before any request bytes are sent.
//!
//! # Pinning a certificate
//!
//! ```ignore
//! use cryptocoins_net::tls::{PinSource, TlsConfig};
//!
//! let tls = TlsConfig::new().pinned_certificate(PinSource::file("certs/myserver.cer"));
//! let client = FetchClient::builder().tls_config(tls).build()?;
//! ```

use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cryptocoins_core::logging::targets;
use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};

/// Errors raised while building TLS configuration.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    /// A certificate file could not be read.
    #[error("Failed to read certificate file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// PEM data could not be parsed.
    #[error("Failed to parse PEM certificate: {0}")]
    Pem(String),
    /// PEM data held no certificate.
    #[error("No certificates found in PEM data")]
    NoCertificate,
    /// A root certificate was rejected by the trust store.
    #[error("Failed to add root certificate: {0}")]
    RootCertificate(String),
    /// The verifier or client configuration could not be built.
    #[error("Invalid TLS configuration: {0}")]
    Config(String),
}

type TlsResult<T> = std::result::Result<T, TlsError>;

fn read_file(path: &Path) -> TlsResult<Vec<u8>> {
    std::fs::read(path).map_err(|source| TlsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn looks_like_pem(data: &[u8]) -> bool {
    data.trim_ascii_start().starts_with(b"-----BEGIN")
}

fn parse_pem_certs(data: &[u8]) -> TlsResult<Vec<CertificateDer<'static>>> {
    let mut reader = BufReader::new(Cursor::new(data));
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| TlsError::Pem(e.to_string()))?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificate);
    }
    Ok(certs)
}

/// Minimum TLS protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsVersion {
    /// TLS 1.2 (default minimum).
    #[default]
    Tls1_2,
    /// TLS 1.3.
    Tls1_3,
}

impl TlsVersion {
    pub(crate) fn to_rustls_versions(self) -> Vec<&'static rustls::SupportedProtocolVersion> {
        match self {
            TlsVersion::Tls1_2 => vec![&rustls::version::TLS12, &rustls::version::TLS13],
            TlsVersion::Tls1_3 => vec![&rustls::version::TLS13],
        }
    }
}

/// An additional root certificate to trust during standard evaluation.
#[derive(Clone)]
pub struct Certificate {
    der_certs: Vec<CertificateDer<'static>>,
}

impl std::fmt::Debug for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Certificate")
            .field("cert_count", &self.der_certs.len())
            .finish()
    }
}

impl Certificate {
    /// Load certificates from PEM-encoded bytes.
    pub fn from_pem(pem_data: impl AsRef<[u8]>) -> TlsResult<Self> {
        Ok(Self {
            der_certs: parse_pem_certs(pem_data.as_ref())?,
        })
    }

    /// Load a certificate from DER-encoded bytes.
    pub fn from_der(der_data: impl Into<Vec<u8>>) -> Self {
        Self {
            der_certs: vec![CertificateDer::from(der_data.into())],
        }
    }

    /// Load a certificate file, detecting PEM or DER encoding.
    pub fn from_file(path: impl AsRef<Path>) -> TlsResult<Self> {
        let data = read_file(path.as_ref())?;
        if looks_like_pem(&data) {
            Self::from_pem(data)
        } else {
            Ok(Self::from_der(data))
        }
    }

    pub(crate) fn der_certs(&self) -> &[CertificateDer<'static>] {
        &self.der_certs
    }
}

/// The single certificate a server leaf must match.
#[derive(Clone, PartialEq, Eq)]
pub struct PinnedCertificate {
    der: CertificateDer<'static>,
}

impl std::fmt::Debug for PinnedCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinnedCertificate")
            .field("len", &self.der.len())
            .finish()
    }
}

impl PinnedCertificate {
    /// Create a pin from raw DER or PEM bytes.
    ///
    /// PEM input is decoded and its first certificate pinned.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> TlsResult<Self> {
        let data = data.into();
        if looks_like_pem(&data) {
            let mut certs = parse_pem_certs(&data)?;
            Ok(Self {
                der: certs.swap_remove(0),
            })
        } else if data.is_empty() {
            Err(TlsError::NoCertificate)
        } else {
            Ok(Self {
                der: CertificateDer::from(data),
            })
        }
    }

    /// Load a pin from a DER or PEM file.
    pub fn from_file(path: impl AsRef<Path>) -> TlsResult<Self> {
        Self::from_bytes(read_file(path.as_ref())?)
    }

    /// The pinned DER bytes.
    pub fn der(&self) -> &[u8] {
        self.der.as_ref()
    }

    /// Check a leaf certificate against the pin, byte for byte.
    pub fn matches(&self, leaf: &CertificateDer<'_>) -> bool {
        self.der.as_ref() == leaf.as_ref()
    }
}

/// Where the pinned certificate comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PinSource {
    /// A DER or PEM file packaged with the application.
    File(PathBuf),
    /// DER or PEM bytes already in memory.
    Bytes(Vec<u8>),
}

impl PinSource {
    /// Pin from a file path.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Load the pin.
    ///
    /// A missing or unreadable resource yields `None` so the validator
    /// rejects every connection instead of silently skipping the pin.
    pub fn load(&self) -> Option<PinnedCertificate> {
        let loaded = match self {
            Self::File(path) => PinnedCertificate::from_file(path),
            Self::Bytes(bytes) => PinnedCertificate::from_bytes(bytes.clone()),
        };
        match loaded {
            Ok(pin) => Some(pin),
            Err(err) => {
                tracing::warn!(
                    target: targets::TLS,
                    "Pinned certificate unavailable, all connections will be rejected: {}",
                    err
                );
                None
            }
        }
    }
}

/// Authentication method requested by a challenge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthMethod {
    /// Server identity verification.
    ServerTrust,
    /// The server requests a client certificate.
    ClientCertificate,
    /// HTTP Basic credentials.
    HttpBasic,
    /// Any other method.
    Other(String),
}

/// A server identity challenge presented during a handshake.
#[derive(Debug)]
pub struct TrustChallenge<'a> {
    /// The requested authentication method.
    pub method: AuthMethod,
    /// Presented chain, leaf first.
    pub chain: &'a [CertificateDer<'a>],
    /// Name the client is connecting to.
    pub server_name: &'a ServerName<'a>,
    /// Evaluation time.
    pub now: UnixTime,
}

impl<'a> TrustChallenge<'a> {
    /// A server-trust challenge evaluated at the current time.
    pub fn server_trust(chain: &'a [CertificateDer<'a>], server_name: &'a ServerName<'a>) -> Self {
        Self {
            method: AuthMethod::ServerTrust,
            chain,
            server_name,
            now: UnixTime::now(),
        }
    }
}

/// Why a challenge was rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    /// The challenge is not a server-trust challenge.
    #[error("unsupported authentication method {0:?}")]
    UnsupportedMethod(AuthMethod),
    /// The server presented no certificates.
    #[error("server presented an empty certificate chain")]
    EmptyChain,
    /// Standard trust evaluation failed.
    #[error("certificate chain is not trusted: {0}")]
    Untrusted(String),
    /// No pinned certificate is available.
    #[error("no pinned certificate is available")]
    MissingPin,
    /// The leaf does not match the pinned certificate.
    #[error("server certificate does not match the pinned certificate")]
    PinMismatch,
}

/// Credential produced when a challenge is accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrustCredential {
    /// The validated leaf certificate.
    pub leaf: CertificateDer<'static>,
}

/// Outcome of a trust evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrustDecision {
    /// Continue the handshake with the derived credential.
    UseCredential(TrustCredential),
    /// Cancel the handshake.
    Cancel(RejectReason),
}

impl TrustDecision {
    /// Check if the challenge was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::UseCredential(_))
    }
}

/// Standard (CA-based) evaluation of a certificate chain.
pub trait TrustEvaluator: Send + Sync + std::fmt::Debug {
    /// Verify the chain for `server_name` at `now`.
    fn evaluate(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        now: UnixTime,
    ) -> std::result::Result<(), rustls::Error>;
}

/// WebPKI evaluation against the bundled Mozilla roots plus extra roots.
#[derive(Debug)]
pub struct WebPkiEvaluator {
    inner: Arc<WebPkiServerVerifier>,
}

impl WebPkiEvaluator {
    /// Build an evaluator trusting the webpki roots and `extra_roots`.
    pub fn new(extra_roots: &[Certificate]) -> TlsResult<Self> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        for cert in extra_roots {
            for der in cert.der_certs() {
                roots
                    .add(der.clone())
                    .map_err(|e| TlsError::RootCertificate(e.to_string()))?;
            }
        }

        let inner = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), crypto_provider())
            .build()
            .map_err(|e| TlsError::Config(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl TrustEvaluator for WebPkiEvaluator {
    fn evaluate(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        now: UnixTime,
    ) -> std::result::Result<(), rustls::Error> {
        self.inner
            .verify_server_cert(end_entity, intermediates, server_name, &[], now)
            .map(|_| ())
    }
}

/// Certificate-pinning trust validator.
#[derive(Debug, Clone)]
pub struct TrustValidator {
    pin: Option<PinnedCertificate>,
    evaluator: Arc<dyn TrustEvaluator>,
}

impl TrustValidator {
    /// Create a validator. `None` for `pin` rejects every challenge.
    pub fn new(pin: Option<PinnedCertificate>, evaluator: Arc<dyn TrustEvaluator>) -> Self {
        Self { pin, evaluator }
    }

    /// The pinned certificate, if one was loaded.
    pub fn pin(&self) -> Option<&PinnedCertificate> {
        self.pin.as_ref()
    }

    /// Evaluate a challenge.
    pub fn validate(&self, challenge: &TrustChallenge<'_>) -> TrustDecision {
        if challenge.method != AuthMethod::ServerTrust {
            return TrustDecision::Cancel(RejectReason::UnsupportedMethod(challenge.method.clone()));
        }

        let Some((leaf, intermediates)) = challenge.chain.split_first() else {
            return TrustDecision::Cancel(RejectReason::EmptyChain);
        };

        if let Err(err) =
            self.evaluator
                .evaluate(leaf, intermediates, challenge.server_name, challenge.now)
        {
            return TrustDecision::Cancel(RejectReason::Untrusted(err.to_string()));
        }

        let Some(pin) = &self.pin else {
            return TrustDecision::Cancel(RejectReason::MissingPin);
        };

        if !pin.matches(leaf) {
            return TrustDecision::Cancel(RejectReason::PinMismatch);
        }

        TrustDecision::UseCredential(TrustCredential {
            leaf: leaf.clone().into_owned(),
        })
    }
}

fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// rustls verifier that delegates the trust decision to a [`TrustValidator`].
#[derive(Debug)]
pub struct PinningVerifier {
    validator: TrustValidator,
    provider: Arc<CryptoProvider>,
}

impl PinningVerifier {
    /// Wrap a validator.
    pub fn new(validator: TrustValidator) -> Self {
        Self {
            validator,
            provider: crypto_provider(),
        }
    }

    /// The wrapped validator.
    pub fn validator(&self) -> &TrustValidator {
        &self.validator
    }
}

impl ServerCertVerifier for PinningVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        let mut chain = Vec::with_capacity(intermediates.len() + 1);
        chain.push(end_entity.clone());
        chain.extend(intermediates.iter().cloned());

        let challenge = TrustChallenge {
            method: AuthMethod::ServerTrust,
            chain: &chain,
            server_name,
            now,
        };

        match self.validator.validate(&challenge) {
            TrustDecision::UseCredential(_) => Ok(ServerCertVerified::assertion()),
            TrustDecision::Cancel(reason) => {
                tracing::warn!(target: targets::TLS, server = ?server_name, "Handshake cancelled: {}", reason);
                Err(rustls::Error::General(reason.to_string()))
            }
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// TLS settings for the production transport.
#[derive(Debug, Clone, Default)]
pub struct TlsConfig {
    /// Certificate the server leaf must match. `None` disables pinning.
    pub pinned_certificate: Option<PinSource>,
    /// Additional roots for standard trust evaluation.
    pub root_certificates: Vec<Certificate>,
    /// Minimum TLS version.
    pub min_version: TlsVersion,
}

impl TlsConfig {
    /// Create a TLS configuration with defaults (no pinning).
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the server leaf certificate.
    pub fn pinned_certificate(mut self, source: PinSource) -> Self {
        self.pinned_certificate = Some(source);
        self
    }

    /// Add a root certificate to trust.
    pub fn add_root_certificate(mut self, cert: Certificate) -> Self {
        self.root_certificates.push(cert);
        self
    }

    /// Set the minimum TLS version.
    pub fn min_version(mut self, version: TlsVersion) -> Self {
        self.min_version = version;
        self
    }

    /// Check whether pinning is enabled.
    pub fn is_pinned(&self) -> bool {
        self.pinned_certificate.is_some()
    }

    /// Build the pinning validator, if pinning is enabled.
    pub fn build_validator(&self) -> TlsResult<Option<TrustValidator>> {
        let Some(source) = &self.pinned_certificate else {
            return Ok(None);
        };
        let evaluator = WebPkiEvaluator::new(&self.root_certificates)?;
        Ok(Some(TrustValidator::new(source.load(), Arc::new(evaluator))))
    }

    /// Build a rustls client configuration.
    ///
    /// With pinning enabled, every connection goes through [`PinningVerifier`].
    pub fn build_rustls_config(&self) -> TlsResult<ClientConfig> {
        let versions = self.min_version.to_rustls_versions();
        let builder = ClientConfig::builder_with_provider(crypto_provider())
            .with_protocol_versions(&versions)
            .map_err(|e| TlsError::Config(e.to_string()))?;

        let mut config = match self.build_validator()? {
            Some(validator) => builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(PinningVerifier::new(validator)))
                .with_no_client_auth(),
            None => {
                let mut roots = RootCertStore::empty();
                roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
                for cert in &self.root_certificates {
                    for der in cert.der_certs() {
                        roots
                            .add(der.clone())
                            .map_err(|e| TlsError::RootCertificate(e.to_string()))?;
                    }
                }
                builder.with_root_certificates(roots).with_no_client_auth()
            }
        };

        config.alpn_protocols = vec![b"http/1.1".to_vec()];
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FixedEvaluator(bool);

    impl TrustEvaluator for FixedEvaluator {
        fn evaluate(
            &self,
            _end_entity: &CertificateDer<'_>,
            _intermediates: &[CertificateDer<'_>],
            _server_name: &ServerName<'_>,
            _now: UnixTime,
        ) -> std::result::Result<(), rustls::Error> {
            if self.0 {
                Ok(())
            } else {
                Err(rustls::Error::InvalidCertificate(
                    rustls::CertificateError::UnknownIssuer,
                ))
            }
        }
    }

    const PIN_DER: &[u8] = &[0x30, 0x03, 0x02, 0x01, 0x01];
    const OTHER_DER: &[u8] = &[0x30, 0x03, 0x02, 0x01, 0x02];

    fn server_name() -> ServerName<'static> {
        ServerName::try_from("example.com").unwrap()
    }

    fn validator(pin: Option<&[u8]>, trusted: bool) -> TrustValidator {
        TrustValidator::new(
            pin.map(|der| PinnedCertificate::from_bytes(der.to_vec()).unwrap()),
            Arc::new(FixedEvaluator(trusted)),
        )
    }

    #[test]
    fn test_matching_leaf_is_accepted() {
        let chain = [CertificateDer::from(PIN_DER.to_vec()), CertificateDer::from(OTHER_DER.to_vec())];
        let name = server_name();
        let decision = validator(Some(PIN_DER), true).validate(&TrustChallenge::server_trust(&chain, &name));
        match decision {
            TrustDecision::UseCredential(credential) => assert_eq!(credential.leaf.as_ref(), PIN_DER),
            other => panic!("expected acceptance, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_chain_is_rejected() {
        let name = server_name();
        let decision = validator(Some(PIN_DER), true).validate(&TrustChallenge::server_trust(&[], &name));
        assert_eq!(decision, TrustDecision::Cancel(RejectReason::EmptyChain));
    }

    #[test]
    fn test_failed_evaluation_is_rejected_even_when_pinned() {
        let chain = [CertificateDer::from(PIN_DER.to_vec())];
        let name = server_name();
        let decision = validator(Some(PIN_DER), false).validate(&TrustChallenge::server_trust(&chain, &name));
        assert!(matches!(decision, TrustDecision::Cancel(RejectReason::Untrusted(_))));
    }

    #[test]
    fn test_mismatched_leaf_is_rejected() {
        let chain = [CertificateDer::from(OTHER_DER.to_vec())];
        let name = server_name();
        let decision = validator(Some(PIN_DER), true).validate(&TrustChallenge::server_trust(&chain, &name));
        assert_eq!(decision, TrustDecision::Cancel(RejectReason::PinMismatch));
    }

    #[test]
    fn test_pin_compares_leaf_only() {
        // The pinned certificate deeper in the chain does not count.
        let chain = [CertificateDer::from(OTHER_DER.to_vec()), CertificateDer::from(PIN_DER.to_vec())];
        let name = server_name();
        let decision = validator(Some(PIN_DER), true).validate(&TrustChallenge::server_trust(&chain, &name));
        assert_eq!(decision, TrustDecision::Cancel(RejectReason::PinMismatch));
    }

    #[test]
    fn test_missing_pin_fails_closed() {
        let chain = [CertificateDer::from(PIN_DER.to_vec())];
        let name = server_name();
        let decision = validator(None, true).validate(&TrustChallenge::server_trust(&chain, &name));
        assert_eq!(decision, TrustDecision::Cancel(RejectReason::MissingPin));
    }

    #[test]
    fn test_other_auth_methods_are_rejected() {
        let chain = [CertificateDer::from(PIN_DER.to_vec())];
        let name = server_name();
        let mut challenge = TrustChallenge::server_trust(&chain, &name);
        challenge.method = AuthMethod::HttpBasic;
        let decision = validator(Some(PIN_DER), true).validate(&challenge);
        assert_eq!(
            decision,
            TrustDecision::Cancel(RejectReason::UnsupportedMethod(AuthMethod::HttpBasic))
        );
    }

    fn verify_leaf(verifier: &PinningVerifier, leaf: &[u8]) -> std::result::Result<ServerCertVerified, rustls::Error> {
        let intermediates = [CertificateDer::from(OTHER_DER.to_vec())];
        verifier.verify_server_cert(
            &CertificateDer::from(leaf.to_vec()),
            &intermediates,
            &server_name(),
            &[],
            UnixTime::now(),
        )
    }

    #[test]
    fn test_verifier_accepts_pinned_leaf() {
        let verifier = PinningVerifier::new(validator(Some(PIN_DER), true));
        assert!(verify_leaf(&verifier, PIN_DER).is_ok());
    }

    #[test]
    fn test_verifier_cancels_handshake_on_rejection() {
        let cases = [
            (validator(Some(PIN_DER), true), OTHER_DER, RejectReason::PinMismatch.to_string()),
            (validator(None, true), PIN_DER, RejectReason::MissingPin.to_string()),
        ];
        for (validator, leaf, expected) in cases {
            let err = verify_leaf(&PinningVerifier::new(validator), leaf).unwrap_err();
            assert_eq!(err, rustls::Error::General(expected));
        }

        let err = verify_leaf(&PinningVerifier::new(validator(Some(PIN_DER), false)), PIN_DER).unwrap_err();
        assert!(matches!(err, rustls::Error::General(_)), "got {err:?}");
    }

    #[test]
    fn test_missing_pin_file_loads_as_none() {
        let source = PinSource::file("/nonexistent/path/myserver.cer");
        assert!(source.load().is_none());
    }

    #[test]
    fn test_pin_from_pem_decodes_to_der() {
        let pem = r#"-----BEGIN CERTIFICATE-----
MIIBkTCB+wIJAKHBfpegE3jEMA0GCSqGSIb3DQEBCwUAMBExDzANBgNVBAMMBnRl
c3RjYTAeFw0yMzAxMDEwMDAwMDBaFw0yNDAxMDEwMDAwMDBaMBExDzANBgNVBAMM
BnRlc3RjYTBcMA0GCSqGSIb3DQEBAQUAA0sAMEgCQQC7o96HtiK7onnPevKSE2LL
oSXwnmfYwZPV2bvfGS18lK8F+DL+42IjT3ucMXnLBhzNCLNKE8yCVK6LPlsvpNlX
AgMBAAGjUzBRMB0GA1UdDgQWBBQgHGHqPcVi1N4CG7IxDJaFMvP6XTAfBgNVHSME
GDAWgBQgHGHqPcVi1N4CG7IxDJaFMvP6XTAPBgNVHRMBAf8EBTADAQH/MA0GCSqG
SIb3DQEBCwUAA0EAGLJHfg9dS/T39L6VQLJeZcpH7mY8vKaM9dM/Zn3HMhfc0Yjv
3hxMPmPGjjpQ9JKaLI0Rq7n5oEUP+xluoAAfrQ==
-----END CERTIFICATE-----"#;

        let pin = PinnedCertificate::from_bytes(pem.as_bytes().to_vec()).unwrap();
        assert_eq!(pin.der()[0], 0x30);
        assert!(!looks_like_pem(pin.der()));
    }

    #[test]
    fn test_pin_from_der_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("myserver.cer");
        std::fs::write(&path, PIN_DER).unwrap();

        let pin = PinSource::file(&path).load().unwrap();
        assert!(pin.matches(&CertificateDer::from(PIN_DER.to_vec())));
        assert!(!pin.matches(&CertificateDer::from(OTHER_DER.to_vec())));
    }

    #[test]
    fn test_empty_pin_bytes_are_rejected() {
        assert!(matches!(
            PinnedCertificate::from_bytes(Vec::new()),
            Err(TlsError::NoCertificate)
        ));
    }

    #[test]
    fn test_build_rustls_config_without_pinning() {
        let config = TlsConfig::new().build_rustls_config().unwrap();
        assert_eq!(config.alpn_protocols, vec![b"http/1.1".to_vec()]);
    }

    #[test]
    fn test_build_rustls_config_with_missing_pin_still_builds() {
        let tls = TlsConfig::new().pinned_certificate(PinSource::file("/nonexistent/myserver.cer"));
        assert!(tls.is_pinned());
        let validator = tls.build_validator().unwrap().unwrap();
        assert!(validator.pin().is_none());
        assert!(tls.build_rustls_config().is_ok());
    }

    #[test]
    fn test_tls_version_to_rustls_versions() {
        assert_eq!(TlsVersion::Tls1_2.to_rustls_versions().len(), 2);
        assert_eq!(TlsVersion::Tls1_3.to_rustls_versions().len(), 1);
    }
}
