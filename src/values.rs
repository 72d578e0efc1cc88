//! # Transferable Value Records
//!
//! Every record that crosses the boundary is defined here as an owned Rust
//! type. The manual allocate/populate/release protocol of a raw C boundary
//! maps onto ownership:
//!
//! | Raw boundary            | This crate                                 |
//! |-------------------------|--------------------------------------------|
//! | `AllocT()`              | `T::default()` (every owned field absent)  |
//! | populate fields         | struct literal / `T::new(...)`             |
//! | `FreeT(value)`          | `Drop` (recursive, automatic)              |
//! | `FreeT(NULL)` no-op     | dropping `Option::None`                    |
//! | double-free UB          | unrepresentable (move semantics)           |
//!
//! ## Ownership Rules
//!
//! - The caller builds and owns request records ([`BuildImageRequest`],
//!   [`CreateContainerRequest`], [`ClientConfiguration`]). Operations borrow
//!   them and copy whatever they need; passing a request transfers nothing.
//! - Response records ([`VolumeReference`], [`ImageReference`], ...) are
//!   returned by value; the caller owns them from that point on.
//!
//! "Absent" is `None` for optional sub-records and strings the original
//! boundary modelled as nullable, and an empty `Vec` for list fields.

use crate::constants::{MAX_CONTAINER_NAME_LEN, MAX_IMAGE_REF_LEN};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// =============================================================================
// Resource References
// =============================================================================

/// Identifies a volume created or resolved by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeReference {
    /// Volume name, unique per engine.
    pub name: String,
}

impl VolumeReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl std::fmt::Display for VolumeReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Identifies a network created or resolved by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkReference {
    /// Engine-assigned network ID.
    pub id: String,
}

impl NetworkReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl std::fmt::Display for NetworkReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Identifies an image present on the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageReference {
    /// Engine-assigned image ID (typically a `sha256:` digest).
    pub id: String,
}

impl ImageReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Identifies a container created on the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerReference {
    /// Engine-assigned container ID.
    pub id: String,
}

impl ContainerReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl std::fmt::Display for ContainerReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

// =============================================================================
// Engine Information Responses
// =============================================================================

/// Response to a ping operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    pub api_version: String,
    pub os_type: String,
    pub experimental: bool,
    pub builder_version: String,
}

/// Version information reported by the engine daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaemonVersionInformation {
    pub version: String,
    pub api_version: String,
    pub min_api_version: String,
    pub git_commit: String,
    pub operating_system: String,
    pub architecture: String,
    pub experimental: bool,
}

// =============================================================================
// Client Configuration
// =============================================================================

/// TLS material locations for an engine connection.
///
/// Opaque pass-through data: the boundary never opens or validates these
/// files, it only carries the paths to the native side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsConfiguration {
    pub ca_file_path: PathBuf,
    pub cert_file_path: PathBuf,
    pub key_file_path: PathBuf,
    pub insecure_skip_verify: bool,
}

/// Configuration for creating an engine client.
///
/// All fields are optional; an all-absent configuration means "connect with
/// the engine's defaults".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfiguration {
    /// Engine endpoint (e.g. `unix:///var/run/docker.sock`).
    pub host: Option<String>,
    /// TLS material, if the endpoint requires it.
    pub tls: Option<TlsConfiguration>,
    /// Directory holding the CLI configuration to use for credentials.
    pub config_directory_path: Option<PathBuf>,
    /// Let the native side read connection settings from its environment.
    pub use_configuration_from_environment: bool,
}

impl ClientConfiguration {
    /// Configuration that defers entirely to the native side's environment.
    pub fn from_environment() -> Self {
        Self {
            use_configuration_from_environment: true,
            ..Self::default()
        }
    }

    /// Configuration pointing at an explicit engine endpoint.
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            ..Self::default()
        }
    }
}

// =============================================================================
// Request Building Blocks
// =============================================================================

/// A key/value pair (environment variables, build args, labels).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringPair {
    pub key: String,
    pub value: String,
}

impl StringPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A port published from a container to the local machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposedPort {
    pub local_port: i64,
    pub container_port: i64,
    /// Transport protocol, `tcp` or `udp`.
    pub protocol: String,
}

impl ExposedPort {
    pub fn tcp(local_port: i64, container_port: i64) -> Self {
        Self {
            local_port,
            container_port,
            protocol: "tcp".to_string(),
        }
    }
}

/// A device exposed into a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMount {
    pub local_path: PathBuf,
    pub container_path: String,
    /// cgroup permission string (`r`, `w`, `m` combinations).
    pub permissions: String,
}

// =============================================================================
// Image Build Request
// =============================================================================

/// Which build backend the engine should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuilderVersion {
    /// The classic built-in builder.
    Legacy,
    /// BuildKit.
    BuildKit,
}

impl std::fmt::Display for BuilderVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Legacy => write!(f, "1"),
            Self::BuildKit => write!(f, "2"),
        }
    }
}

/// Caller-constructed request for an image build.
///
/// The caller owns this record; [`build_image`] borrows it for the duration
/// of the call and copies what it needs.
///
/// [`build_image`]: crate::bridge::EngineBridge::build_image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildImageRequest {
    /// Directory containing the build context.
    pub context_directory: PathBuf,
    /// Dockerfile path, relative to the context directory.
    pub path_to_dockerfile: PathBuf,
    pub build_args: Vec<StringPair>,
    /// Tags to apply to the built image.
    pub image_tags: Vec<String>,
    pub always_pull_base_images: bool,
    pub no_cache: bool,
    /// Stop after this stage of a multi-stage build.
    pub target_build_stage: Option<String>,
    pub builder_version: Option<BuilderVersion>,
}

impl BuildImageRequest {
    /// Request for building the Dockerfile at the root of `context_directory`.
    pub fn new(context_directory: impl Into<PathBuf>) -> Self {
        Self {
            context_directory: context_directory.into(),
            path_to_dockerfile: PathBuf::from("Dockerfile"),
            ..Self::default()
        }
    }

    /// Validates the request before it is handed to the engine.
    pub fn validate(&self) -> Result<()> {
        if self.context_directory.as_os_str().is_empty() {
            return Err(Error::InvalidArgument(
                "build request has no context directory".to_string(),
            ));
        }

        if self.path_to_dockerfile.as_os_str().is_empty() {
            return Err(Error::InvalidArgument(
                "build request has no Dockerfile path".to_string(),
            ));
        }

        for tag in &self.image_tags {
            if tag.is_empty() || tag.len() > MAX_IMAGE_REF_LEN {
                return Err(Error::InvalidArgument(format!(
                    "invalid image tag '{tag}'"
                )));
            }
        }

        Ok(())
    }
}

// =============================================================================
// Container Creation Request
// =============================================================================

/// Caller-constructed request for creating a container.
///
/// This is a representative subset of the engine's creation surface; list
/// fields default to empty and optional scalars to absent, so a minimal
/// request is `CreateContainerRequest::new("alpine:3.18")`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContainerRequest {
    /// Image to create the container from. Required.
    pub image_reference: String,
    /// Container name; absent means engine-assigned.
    pub name: Option<String>,
    pub command: Vec<String>,
    pub entrypoint: Vec<String>,
    pub working_directory: Option<String>,
    pub hostname: Option<String>,
    /// Additional `host:ip` entries for the container's hosts file.
    pub extra_hosts: Vec<String>,
    pub environment_variables: Vec<StringPair>,
    /// Bind mounts in `local:container[:options]` form.
    pub bind_mounts: Vec<String>,
    /// Tmpfs mounts as container path / options pairs.
    pub tmpfs_mounts: Vec<StringPair>,
    pub device_mounts: Vec<DeviceMount>,
    pub exposed_ports: Vec<ExposedPort>,
    /// User (and optionally group) to run as, `uid[:gid]` or name form.
    pub user: Option<String>,
    pub privileged: bool,
    /// Network to attach to; absent means the engine default.
    pub network_reference: Option<String>,
    pub network_aliases: Vec<String>,
    pub labels: Vec<StringPair>,
    pub attach_tty: bool,
}

impl CreateContainerRequest {
    pub fn new(image_reference: impl Into<String>) -> Self {
        Self {
            image_reference: image_reference.into(),
            ..Self::default()
        }
    }

    /// Validates the request before it is handed to the engine.
    pub fn validate(&self) -> Result<()> {
        if self.image_reference.is_empty() {
            return Err(Error::InvalidArgument(
                "container creation request has no image reference".to_string(),
            ));
        }

        if self.image_reference.len() > MAX_IMAGE_REF_LEN {
            return Err(Error::InvalidArgument(format!(
                "image reference exceeds {MAX_IMAGE_REF_LEN} bytes"
            )));
        }

        if let Some(name) = &self.name {
            if name.is_empty() || name.len() > MAX_CONTAINER_NAME_LEN {
                return Err(Error::InvalidArgument(format!(
                    "invalid container name '{name}'"
                )));
            }
        }

        for port in &self.exposed_ports {
            if port.protocol != "tcp" && port.protocol != "udp" {
                return Err(Error::InvalidArgument(format!(
                    "invalid exposed port protocol '{}'",
                    port.protocol
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_request_has_absent_fields() {
        let request = CreateContainerRequest::default();
        assert!(request.image_reference.is_empty());
        assert!(request.name.is_none());
        assert!(request.command.is_empty());
        assert!(request.labels.is_empty());
    }

    #[test]
    fn test_minimal_request_validates() {
        let request = CreateContainerRequest::new("alpine:3.18");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_empty_image_reference_rejected() {
        let request = CreateContainerRequest::default();
        assert!(request.validate().is_err());
    }
}
