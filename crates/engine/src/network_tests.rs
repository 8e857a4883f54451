// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sw_core::SiteSettings;
use yare::parameterized;

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

fn pinned_to(host: &str) -> PinnedCertVerifier {
    let cert = load_certificate(&fixture("site.pem")).unwrap();
    PinnedCertVerifier::new(cert, ServerName::try_from(host.to_string()).unwrap())
}

fn verify(
    verifier: &PinnedCertVerifier,
    cert: &CertificateDer<'_>,
    name: &str,
) -> Result<ServerCertVerified, rustls::Error> {
    let name = ServerName::try_from(name.to_string()).unwrap();
    verifier.verify_server_cert(cert, &[], &name, &[], UnixTime::now())
}

#[parameterized(
    pem = { "site.pem" },
    der = { "site.der" },
)]
fn loads_pem_and_der(name: &str) {
    assert!(load_certificate(&fixture(name)).is_ok());
}

#[test]
fn pem_and_der_yield_the_same_certificate() {
    let pem = load_certificate(&fixture("site.pem")).unwrap();
    let der = load_certificate(&fixture("site.der")).unwrap();
    assert_eq!(pem, der);
}

#[test]
fn loads_file_uri() {
    let uri = format!("file://{}", fixture("site.pem"));
    assert!(load_certificate(&uri).is_ok());
}

#[test]
fn malformed_certificate_is_rejected() {
    let err = load_certificate(&fixture("garbage.pem")).unwrap_err();
    assert!(matches!(err, CertificateError::Malformed(_)), "got {:?}", err);
}

#[test]
fn missing_file_is_a_read_error() {
    let err = load_certificate(&fixture("absent.pem")).unwrap_err();
    assert!(matches!(err, CertificateError::Read { .. }), "got {:?}", err);
}

#[parameterized(
    content = { "content://com.example/cert", "content" },
    https = { "https://example.test/cert.pem", "https" },
)]
fn non_file_schemes_are_unsupported(uri: &str, scheme: &str) {
    match load_certificate(uri) {
        Err(CertificateError::UnsupportedScheme(s)) => assert_eq!(s, scheme),
        other => panic!("expected UnsupportedScheme, got {:?}", other),
    }
}

#[test]
fn verifier_accepts_pinned_certificate_for_its_host() {
    let verifier = pinned_to("status.example.test");
    let cert = load_certificate(&fixture("site.der")).unwrap();

    assert!(verify(&verifier, &cert, "status.example.test").is_ok());
}

#[test]
fn verifier_rejects_other_host() {
    let verifier = pinned_to("status.example.test");
    let cert = load_certificate(&fixture("site.der")).unwrap();

    let err = verify(&verifier, &cert, "other.example.test").unwrap_err();
    assert_eq!(
        err,
        rustls::Error::InvalidCertificate(rustls::CertificateError::NotValidForName)
    );
}

#[test]
fn verifier_rejects_other_certificate() {
    let verifier = pinned_to("status.example.test");
    let other = load_certificate(&fixture("other.pem")).unwrap();

    let err = verify(&verifier, &other, "status.example.test").unwrap_err();
    assert_eq!(
        err,
        rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer)
    );
}

#[test]
fn verifier_offers_signature_schemes() {
    assert!(!pinned_to("status.example.test")
        .supported_verify_schemes()
        .is_empty());
}

#[parameterized(
    domain = { "https://status.example.test/health", true },
    ipv4 = { "https://127.0.0.1:8443/", true },
    ipv6 = { "https://[::1]/", true },
    relative = { "/health", false },
)]
fn server_name_from_site_url(url: &str, ok: bool) {
    assert_eq!(server_name_for(url).is_ok(), ok);
}

#[test]
fn certificate_builder_produces_a_client() {
    let factory = HttpClientFactory::default();
    let builder = factory
        .client_for_certificate(
            factory.client_for_timeout(1_000),
            &fixture("site.pem"),
            "https://status.example.test/",
        )
        .unwrap();
    assert!(builder.build().is_ok());
}

#[test]
fn client_for_propagates_certificate_errors() {
    let factory = HttpClientFactory::default();
    let site = Site::new(
        "api",
        "https://status.example.test/",
        SiteSettings::default().with_certificate(Some("content://provider/cert".into())),
    );

    let err = factory.client_for(&site).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Certificate(CertificateError::UnsupportedScheme(_))
    ));
}

#[test]
fn client_for_without_settings_fails() {
    let factory = HttpClientFactory::default();
    let mut site = Site::new("api", "https://a.test/", SiteSettings::default());
    site.settings = None;

    assert!(matches!(
        factory.client_for(&site),
        Err(EngineError::MissingSettings)
    ));
}

#[test]
fn default_user_agent_names_the_tool() {
    let factory = HttpClientFactory::default();
    assert!(factory.base().user_agent.starts_with("sitewatch/"));
}
