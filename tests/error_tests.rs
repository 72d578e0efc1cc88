//! Tests for the boundary error taxonomy.

use gangway::Error;
use std::path::PathBuf;

// =============================================================================
// Kind Taxonomy
// =============================================================================

#[test]
fn test_every_variant_maps_to_a_flat_kind() {
    let cases: Vec<(Error, &str)> = vec![
        (
            Error::InvalidHandle {
                kind: "client",
                handle: 0x1_0000_0001,
            },
            "InvalidHandle",
        ),
        (
            Error::ResourceExhausted {
                kind: "context",
                capacity: 1024,
            },
            "ResourceExhausted",
        ),
        (Error::IndexOutOfRange { index: 3, count: 2 }, "OutOfRange"),
        (Error::cancelled("pull image"), "Cancelled"),
        (Error::InvalidArgument("bad".to_string()), "InvalidArgument"),
        (
            Error::ConfigurationDirectoryNotFound(PathBuf::from("/nope")),
            "InvalidArgument",
        ),
        (
            Error::ConnectionFailed("socket refused".to_string()),
            "ConnectionFailed",
        ),
        (Error::ImageNotFound("alpine:3.18".to_string()), "NotFound"),
        (Error::NetworkNotFound("bridge".to_string()), "NotFound"),
        (Error::VolumeNotFound("data".to_string()), "NotFound"),
        (Error::ContainerNotFound("abc123".to_string()), "NotFound"),
        (
            Error::ImagePullFailed {
                reference: "alpine:3.18".to_string(),
                message: "registry unreachable".to_string(),
            },
            "PullFailed",
        ),
        (Error::BuildFailed("step 2 failed".to_string()), "BuildFailed"),
        (Error::VolumeAlreadyExists("data".to_string()), "AlreadyExists"),
        (
            Error::ContainerAlreadyExists("web".to_string()),
            "AlreadyExists",
        ),
        (
            Error::InvalidContainerState {
                id: "abc123".to_string(),
                state: "created".to_string(),
                expected: "running".to_string(),
            },
            "InvalidState",
        ),
        (Error::NotSupported("exec".to_string()), "NotSupported"),
        (
            Error::OutputStreamWrite("broken pipe".to_string()),
            "IOError",
        ),
    ];

    for (error, expected_kind) in cases {
        assert_eq!(error.kind(), expected_kind, "for {error:?}");
    }
}

#[test]
fn test_engine_errors_pass_their_kind_through_verbatim() {
    let err = Error::Engine {
        kind: "errdefs.ErrUnavailable".to_string(),
        message: "daemon is shutting down".to_string(),
    };
    assert_eq!(err.kind(), "errdefs.ErrUnavailable");
    assert_eq!(format!("{err}"), "errdefs.ErrUnavailable: daemon is shutting down");
}

// =============================================================================
// Cancellation
// =============================================================================

#[test]
fn test_cancellation_is_not_a_failure_kind() {
    let cancelled = Error::cancelled("build image");
    assert!(cancelled.is_cancelled());
    assert_eq!(cancelled.kind(), "Cancelled");
    assert_eq!(
        format!("{cancelled}"),
        "operation 'build image' was cancelled before completion"
    );

    let failure = Error::BuildFailed("non-zero exit".to_string());
    assert!(!failure.is_cancelled());
}

// =============================================================================
// Messages
// =============================================================================

#[test]
fn test_messages_carry_the_operative_detail() {
    let err = Error::InvalidHandle {
        kind: "output stream",
        handle: 0x2_0000_0003,
    };
    let rendered = format!("{err}");
    assert!(rendered.contains("output stream"), "got: {rendered}");
    assert!(rendered.contains("0x200000003"), "got: {rendered}");

    let err = Error::IndexOutOfRange { index: 9, count: 4 };
    assert_eq!(
        format!("{err}"),
        "index 9 out of range for array of 4 elements"
    );
}
