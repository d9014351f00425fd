//! Building requests end to end: decode, enrich, switch and compose result paths.

use std::sync::Arc;

use pkgsec::analysis::{AnalysisRequest, Builder, Request, Type};
use pkgsec::error::RequestError;
use pkgsec::registry::fixture::StaticRegistry;
use pkgsec::upload::{MemoryUploader, Uploader};

const CHALK_SHASUM: &str = "d957f370038b75ac572471e83be4c5ca9f8e8c45";

fn npm_builder() -> Builder {
    Builder::new().with_npm(Arc::new(
        StaticRegistry::new()
            .with_version("chalk", "5.0.0", "1111111111111111111111111111111111111111")
            .with_version("chalk", "5.1.2", CHALK_SHASUM),
    ))
}

#[tokio::test]
async fn nop_request_keeps_its_id() {
    let request = Builder::new()
        .build(br#"{"type":"urn:nop:nop","snowflake_id":"X"}"#)
        .await
        .unwrap();
    assert_eq!(request.kind(), Type::Nop);
    assert_eq!(request.id(), "X");
}

#[tokio::test]
async fn npm_request_resolves_to_result_path() {
    let request = npm_builder()
        .build(br#"{"type":"urn:scan:falco!npm,install.json","snowflake_id":"X","name":"chalk"}"#)
        .await
        .unwrap();
    let path = request.results_path().unwrap();
    assert_eq!(
        path.segments(),
        ["npm", "chalk", "5.1.2", CHALK_SHASUM, "falco(install).json"]
    );
    assert_eq!(path.filename(), Some("falco(install).json"));
}

#[tokio::test]
async fn mismatched_shasum_is_rejected() {
    let err = npm_builder()
        .build(
            br#"{"type":"urn:scan:falco!npm,install.json","snowflake_id":"X",
                 "name":"chalk","version":"5.0.0","shasum":"d957f370038b75ac572471e83be4c5ca9f8e8c45"}"#,
        )
        .await
        .unwrap_err();
    match err {
        RequestError::ShasumMismatch { version, actual, .. } => {
            assert_eq!(version, "5.0.0");
            assert_eq!(actual, "1111111111111111111111111111111111111111");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unknown_type_builds_nothing() {
    let err = npm_builder().build(br#"{"type":"something"}"#).await.unwrap_err();
    assert!(matches!(err, RequestError::UnsupportedType(_)));
}

#[tokio::test]
async fn enricher_shares_parent_ecosystem_and_filename_rule() {
    let request = npm_builder()
        .build(br#"{"type":"urn:scan:falco!npm,install.json+urn:enrich:verdicts","snowflake_id":"X","name":"chalk"}"#)
        .await
        .unwrap();
    assert!(matches!(request, Request::Npm(_)));
    assert_eq!(
        request.results_path().unwrap().filename(),
        Some("verdicts(install).json")
    );
}

#[tokio::test]
async fn switch_within_ecosystem() {
    let request = npm_builder()
        .build(br#"{"type":"urn:scan:falco!npm,install.json","snowflake_id":"X","priority":3,"name":"chalk"}"#)
        .await
        .unwrap();

    let switched = request.switch(Type::NpmStaticTarball).unwrap();
    assert_eq!(switched.kind(), Type::NpmStaticTarball);
    let mut expected = request.package().cloned().unwrap();
    expected.base.kind = Type::NpmStaticTarball;
    assert_eq!(switched.package(), Some(&expected));
    assert_eq!(switched.base().priority, 3);

    assert!(matches!(
        request.switch(Type::PypiStaticSdist),
        Err(RequestError::IncompatibleType { .. })
    ));
    assert!(matches!(
        request.switch(Type::Nop),
        Err(RequestError::IncompatibleType { .. })
    ));
}

#[tokio::test]
async fn results_can_be_uploaded_once_built() {
    let request = npm_builder()
        .build(br#"{"type":"urn:scan:typo!npm.json","snowflake_id":"X","name":"chalk","version":"5.1.2"}"#)
        .await
        .unwrap();
    let path = request.results_path().unwrap();
    let uploader = MemoryUploader::new();

    assert!(!uploader.already_exists(&path).await.unwrap());
    uploader.upload(&mut &b"[]"[..], &path).await.unwrap();
    assert!(uploader.already_exists(&path).await.unwrap());
    assert_eq!(path.to_string(), format!("npm/chalk/5.1.2/{}/typo.json", CHALK_SHASUM));
}

#[tokio::test]
async fn published_payload_rebuilds_to_the_same_request() {
    let request = npm_builder()
        .build(br#"{"type":"urn:scan:static,secrets!npm,tarball.json","snowflake_id":"X","name":"chalk"}"#)
        .await
        .unwrap();
    let payload = request.publishing().unwrap();
    let rebuilt = Builder::new().build(&payload).await.unwrap();
    assert_eq!(rebuilt, request);
}

#[tokio::test]
async fn offline_builds_never_return_unresolved_packages() {
    let err = Builder::new()
        .build(br#"{"type":"urn:scan:falco!npm,install.json","snowflake_id":"X","name":"chalk"}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, RequestError::NoRegistry { .. }));

    let raw = format!(
        r#"{{"type":"urn:scan:falco!npm,install.json","snowflake_id":"X","name":"chalk","version":"5.1.2","shasum":"{}"}}"#,
        CHALK_SHASUM
    );
    let request = Builder::new().build(raw.as_bytes()).await.unwrap();
    assert!(request.results_path().is_ok());
}
