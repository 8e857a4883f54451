// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client factory
//!
//! Every client is derived from one base configuration. A site may pin a
//! single certificate: the TLS handshake then accepts exactly that
//! certificate, and only for the site's own host.

use crate::error::EngineError;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::WebPkiSupportedAlgorithms;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use sw_core::Site;
use thiserror::Error;
use url::{Host, Url};

/// Errors loading or installing a pinned certificate
#[derive(Debug, Error)]
pub enum CertificateError {
    #[error("unsupported certificate URI scheme: {0}")]
    UnsupportedScheme(String),
    #[error("cannot read certificate {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed certificate: {0}")]
    Malformed(String),
    #[error("site URL has no host: {0}")]
    MissingHost(String),
    #[error("TLS configuration failed: {0}")]
    Tls(#[from] rustls::Error),
}

/// Settings shared by every client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseClientConfig {
    pub user_agent: String,
    pub max_redirects: usize,
}

impl Default for BaseClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("sitewatch/{}", env!("CARGO_PKG_VERSION")),
            max_redirects: 10,
        }
    }
}

/// Derives per-site HTTP clients from a shared base configuration
#[derive(Debug, Clone, Default)]
pub struct HttpClientFactory {
    base: BaseClientConfig,
}

impl HttpClientFactory {
    pub fn new(base: BaseClientConfig) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &BaseClientConfig {
        &self.base
    }

    fn base_builder(&self) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .user_agent(self.base.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(self.base.max_redirects))
    }

    /// Builder whose whole-call timeout is `timeout_ms`
    pub fn client_for_timeout(&self, timeout_ms: u64) -> reqwest::ClientBuilder {
        self.base_builder()
            .timeout(Duration::from_millis(timeout_ms))
    }

    /// Pin `builder` to the certificate at `cert_uri` for the host of `site_url`
    pub fn client_for_certificate(
        &self,
        builder: reqwest::ClientBuilder,
        cert_uri: &str,
        site_url: &str,
    ) -> Result<reqwest::ClientBuilder, CertificateError> {
        let host = server_name_for(site_url)?;
        let cert = load_certificate(cert_uri)?;
        let verifier = PinnedCertVerifier::new(cert, host);

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let mut config = rustls::ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(verifier))
            .with_no_client_auth();
        config.alpn_protocols = vec![b"http/1.1".to_vec()];

        Ok(builder.use_preconfigured_tls(config))
    }

    /// Client for one check of `site`
    pub fn client_for(&self, site: &Site) -> Result<reqwest::Client, EngineError> {
        let settings = site.settings.as_ref().ok_or(EngineError::MissingSettings)?;
        let mut builder = self.client_for_timeout(settings.network_timeout_ms);
        if let Some(uri) = &settings.certificate {
            builder = self.client_for_certificate(builder, uri, &site.url)?;
        }
        Ok(builder.build()?)
    }
}

/// TLS server name the pinned certificate must be presented for
fn server_name_for(site_url: &str) -> Result<ServerName<'static>, CertificateError> {
    let url = Url::parse(site_url).map_err(|_| CertificateError::MissingHost(site_url.into()))?;
    match url.host() {
        Some(Host::Domain(domain)) => ServerName::try_from(domain.to_string())
            .map_err(|_| CertificateError::MissingHost(site_url.into())),
        Some(Host::Ipv4(ip)) => Ok(ServerName::IpAddress(IpAddr::V4(ip).into())),
        Some(Host::Ipv6(ip)) => Ok(ServerName::IpAddress(IpAddr::V6(ip).into())),
        None => Err(CertificateError::MissingHost(site_url.into())),
    }
}

/// Read and validate one X.509 certificate, PEM or DER.
///
/// Accepts `file://` URIs and plain paths.
pub fn load_certificate(uri: &str) -> Result<CertificateDer<'static>, CertificateError> {
    let path = certificate_path(uri)?;
    let bytes = std::fs::read(&path).map_err(|source| CertificateError::Read {
        path: path.clone(),
        source,
    })?;

    let der = if bytes.starts_with(b"-----BEGIN") {
        match rustls_pemfile::certs(&mut bytes.as_slice()).next() {
            Some(Ok(der)) => der,
            Some(Err(e)) => return Err(CertificateError::Malformed(e.to_string())),
            None => {
                return Err(CertificateError::Malformed(
                    "no certificate in PEM data".to_string(),
                ))
            }
        }
    } else {
        CertificateDer::from(bytes)
    };

    x509_parser::parse_x509_certificate(der.as_ref())
        .map_err(|e| CertificateError::Malformed(e.to_string()))?;
    Ok(der)
}

fn certificate_path(uri: &str) -> Result<PathBuf, CertificateError> {
    match uri.split_once("://") {
        Some(("file", _)) => Url::parse(uri)
            .ok()
            .and_then(|u| u.to_file_path().ok())
            .ok_or_else(|| CertificateError::Malformed(format!("invalid file URI: {}", uri))),
        Some((scheme, _)) => Err(CertificateError::UnsupportedScheme(scheme.to_string())),
        None => Ok(PathBuf::from(uri)),
    }
}

/// Accepts exactly one certificate, presented for exactly one host
#[derive(Debug)]
pub struct PinnedCertVerifier {
    cert: CertificateDer<'static>,
    host: ServerName<'static>,
    algorithms: WebPkiSupportedAlgorithms,
}

impl PinnedCertVerifier {
    pub fn new(cert: CertificateDer<'static>, host: ServerName<'static>) -> Self {
        Self {
            cert,
            host,
            algorithms: rustls::crypto::ring::default_provider().signature_verification_algorithms,
        }
    }
}

impl ServerCertVerifier for PinnedCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        if server_name.to_owned() != self.host {
            return Err(rustls::Error::InvalidCertificate(
                rustls::CertificateError::NotValidForName,
            ));
        }
        if end_entity.as_ref() != self.cert.as_ref() {
            return Err(rustls::Error::InvalidCertificate(
                rustls::CertificateError::UnknownIssuer,
            ));
        }
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod tests;
