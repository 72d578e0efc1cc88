//! Tests for transferable value records.
//!
//! Validates the allocate/populate/release mapping: defaults are fully
//! absent, drops are recursive and safe, and request validation rejects
//! malformed records before they reach an engine.

use gangway::{
    BuildImageRequest, BuilderVersion, ClientConfiguration, CreateContainerRequest,
    DaemonVersionInformation, ExposedPort, ImageReference, PingResponse, StringPair,
    TlsConfiguration, VolumeReference,
};
use std::path::PathBuf;

// =============================================================================
// Allocate → Release Round Trips
// =============================================================================

#[test]
fn test_default_records_have_absent_fields() {
    let config = ClientConfiguration::default();
    assert!(config.host.is_none(), "host should default to absent");
    assert!(config.tls.is_none(), "tls should default to absent");
    assert!(
        config.config_directory_path.is_none(),
        "config dir should default to absent"
    );
    assert!(!config.use_configuration_from_environment);

    let request = BuildImageRequest::default();
    assert!(request.context_directory.as_os_str().is_empty());
    assert!(request.build_args.is_empty());
    assert!(request.image_tags.is_empty());
    assert!(request.target_build_stage.is_none());
    assert!(request.builder_version.is_none());
}

#[test]
fn test_allocate_release_round_trip_does_not_fault() {
    // Dropping an all-absent record must be a no-op beyond reclamation;
    // dropping a populated one must release recursively.
    drop(ClientConfiguration::default());
    drop(BuildImageRequest::default());
    drop(CreateContainerRequest::default());
    drop(PingResponse::default());
    drop(DaemonVersionInformation::default());
    drop(VolumeReference::default());

    let populated = ClientConfiguration {
        host: Some("tcp://docker.example.com:2376".to_string()),
        tls: Some(TlsConfiguration {
            ca_file_path: PathBuf::from("/certs/ca.pem"),
            cert_file_path: PathBuf::from("/certs/cert.pem"),
            key_file_path: PathBuf::from("/certs/key.pem"),
            insecure_skip_verify: false,
        }),
        config_directory_path: Some(PathBuf::from("/home/user/.docker")),
        use_configuration_from_environment: true,
    };
    drop(populated);
}

// =============================================================================
// Constructors
// =============================================================================

#[test]
fn test_from_environment_configuration() {
    let config = ClientConfiguration::from_environment();
    assert!(config.use_configuration_from_environment);
    assert!(config.host.is_none());
}

#[test]
fn test_for_host_configuration() {
    let config = ClientConfiguration::for_host("unix:///var/run/docker.sock");
    assert_eq!(config.host.as_deref(), Some("unix:///var/run/docker.sock"));
    assert!(!config.use_configuration_from_environment);
}

#[test]
fn test_build_request_defaults_dockerfile_path() {
    let request = BuildImageRequest::new("/src/app");
    assert_eq!(request.context_directory, PathBuf::from("/src/app"));
    assert_eq!(request.path_to_dockerfile, PathBuf::from("Dockerfile"));
}

#[test]
fn test_builder_version_wire_form() {
    assert_eq!(BuilderVersion::Legacy.to_string(), "1");
    assert_eq!(BuilderVersion::BuildKit.to_string(), "2");
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_build_request_without_context_rejected() {
    let request = BuildImageRequest::default();
    let err = request.validate().unwrap_err();
    assert_eq!(err.kind(), "InvalidArgument");
}

#[test]
fn test_build_request_with_empty_tag_rejected() {
    let mut request = BuildImageRequest::new("/src/app");
    request.image_tags.push(String::new());
    assert!(request.validate().is_err(), "empty tag should be rejected");
}

#[test]
fn test_container_request_with_bad_protocol_rejected() {
    let mut request = CreateContainerRequest::new("alpine:3.18");
    request.exposed_ports.push(ExposedPort {
        local_port: 8080,
        container_port: 80,
        protocol: "sctp".to_string(),
    });

    let err = request.validate().unwrap_err();
    assert_eq!(err.kind(), "InvalidArgument");
    assert!(format!("{err}").contains("sctp"), "should name the protocol");
}

#[test]
fn test_container_request_with_overlong_name_rejected() {
    let mut request = CreateContainerRequest::new("alpine:3.18");
    request.name = Some("x".repeat(300));
    assert!(request.validate().is_err());
}

// =============================================================================
// Serialization
// =============================================================================

#[test]
fn test_records_round_trip_through_serde() {
    let request = CreateContainerRequest {
        image_reference: "nginx:1.25".to_string(),
        name: Some("web".to_string()),
        command: vec!["nginx".to_string(), "-g".to_string()],
        environment_variables: vec![StringPair::new("MODE", "production")],
        exposed_ports: vec![ExposedPort::tcp(8080, 80)],
        ..CreateContainerRequest::default()
    };

    let json = serde_json::to_string(&request).expect("serialize");
    let back: CreateContainerRequest = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, request);

    // Field names cross the boundary in camelCase.
    assert!(json.contains("imageReference"), "got: {json}");
    assert!(json.contains("exposedPorts"), "got: {json}");
}

#[test]
fn test_reference_display_is_bare_id() {
    let image = ImageReference::new("sha256:abcd");
    assert_eq!(image.to_string(), "sha256:abcd");
}
