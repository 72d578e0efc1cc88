//! Error types for the marshalling boundary.
//!
//! Every fallible boundary operation returns [`Result`], so "response and
//! error both present" and "neither present" are unrepresentable. The flat
//! `kind` taxonomy callers on the far side of the boundary key on is exposed
//! via [`Error::kind`].

use std::path::PathBuf;

/// Result type alias for boundary operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can cross the marshalling boundary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // =========================================================================
    // Boundary Protocol Errors
    // =========================================================================
    /// A handle was stale, already released, or never issued.
    #[error("invalid or stale {kind} handle {handle:#x}")]
    InvalidHandle {
        /// Handle kind name (e.g. "client", "context").
        kind: &'static str,
        /// Raw handle value as presented by the caller.
        handle: u64,
    },

    /// A handle table reached its configured capacity.
    #[error("cannot allocate another {kind} handle: limit of {capacity} reached")]
    ResourceExhausted {
        kind: &'static str,
        capacity: usize,
    },

    /// An array slot index was outside `0..count`.
    #[error("index {index} out of range for array of {count} elements")]
    IndexOutOfRange { index: usize, count: usize },

    /// The operation was cancelled, either by a progress callback returning
    /// [`Cancel`] or by a cancellation context.
    ///
    /// [`Cancel`]: crate::progress::ProgressContinuation::Cancel
    #[error("operation '{operation}' was cancelled before completion")]
    OperationCancelled { operation: String },

    /// A request record failed validation before reaching the engine.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The configuration directory named in a client configuration does not
    /// exist or is not a directory.
    #[error("configuration directory '{0}' does not exist or is not a directory")]
    ConfigurationDirectoryNotFound(PathBuf),

    // =========================================================================
    // Engine Errors
    // =========================================================================
    /// The engine could not be reached.
    #[error("failed to connect to the container engine: {0}")]
    ConnectionFailed(String),

    /// Image not present on the engine.
    #[error("image not found: {0}")]
    ImageNotFound(String),

    /// Image pull failed.
    #[error("failed to pull image '{reference}': {message}")]
    ImagePullFailed { reference: String, message: String },

    /// Image build failed.
    #[error("image build failed: {0}")]
    BuildFailed(String),

    /// Network not present on the engine.
    #[error("network not found: {0}")]
    NetworkNotFound(String),

    /// Volume not found.
    #[error("volume not found: {0}")]
    VolumeNotFound(String),

    /// Volume already exists.
    #[error("volume already exists: {0}")]
    VolumeAlreadyExists(String),

    /// Container not found.
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    /// Container already exists.
    #[error("container already exists: {0}")]
    ContainerAlreadyExists(String),

    /// Container is in the wrong state for the requested operation.
    #[error("container '{id}' is in state '{state}', expected '{expected}'")]
    InvalidContainerState {
        id: String,
        state: String,
        expected: String,
    },

    /// Operation not supported by this engine.
    #[error("operation not supported: {0}")]
    NotSupported(String),

    /// An error reported by the engine that has no structural mapping.
    /// Carries the engine's own kind tag and message verbatim.
    #[error("{kind}: {message}")]
    Engine { kind: String, message: String },

    /// I/O failure while writing to an output stream.
    #[error("output stream write failed: {0}")]
    OutputStreamWrite(String),
}

impl Error {
    /// Returns the short machine-readable category for this error.
    ///
    /// This is the flat string taxonomy carried across the boundary; callers
    /// that cannot see the enum structure dispatch on it.
    pub fn kind(&self) -> &str {
        match self {
            Self::InvalidHandle { .. } => "InvalidHandle",
            Self::ResourceExhausted { .. } => "ResourceExhausted",
            Self::IndexOutOfRange { .. } => "OutOfRange",
            Self::OperationCancelled { .. } => "Cancelled",
            Self::InvalidArgument(_) | Self::ConfigurationDirectoryNotFound(_) => {
                "InvalidArgument"
            }
            Self::ConnectionFailed(_) => "ConnectionFailed",
            Self::ImageNotFound(_)
            | Self::NetworkNotFound(_)
            | Self::VolumeNotFound(_)
            | Self::ContainerNotFound(_) => "NotFound",
            Self::ImagePullFailed { .. } => "PullFailed",
            Self::BuildFailed(_) => "BuildFailed",
            Self::VolumeAlreadyExists(_) | Self::ContainerAlreadyExists(_) => "AlreadyExists",
            Self::InvalidContainerState { .. } => "InvalidState",
            Self::NotSupported(_) => "NotSupported",
            Self::Engine { kind, .. } => kind,
            Self::OutputStreamWrite(_) => "IOError",
        }
    }

    /// Convenience constructor for a cancelled operation.
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::OperationCancelled {
            operation: operation.into(),
        }
    }

    /// Returns true if this error reports cancellation rather than a genuine
    /// engine failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::OperationCancelled { .. })
    }
}
