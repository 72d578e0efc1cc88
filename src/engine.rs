//! Container engine trait - the native side of the boundary.
//!
//! Everything behind this trait is a black box to the marshalling layer:
//! how an implementation reaches the engine (local socket, TCP, in-process
//! simulation) and how it fulfils each operation is its own business. The
//! boundary only defines how requests, results, errors, and progress cross
//! over, and [`EngineBridge`] is the sole caller.
//!
//! # Blocking Model
//!
//! Every method blocks the calling thread until it has a result. Streamed
//! operations (pull, build, attach, wait) interleave progress callback
//! invocations with their own work on that same thread; there is no concurrency at this
//! boundary. Implementations wanting parallelism run on separate threads
//! with separate handles.
//!
//! # Cancellation
//!
//! Streamed operations receive a [`CancellationContext`] and must poll it
//! between discrete steps, and must honor a `Cancel` answer from the
//! progress channel at their next checkpoint. Either path ends the
//! operation with a `Cancelled` error, never with a success result.
//!
//! [`EngineBridge`]: crate::bridge::EngineBridge

use crate::context::CancellationContext;
use crate::error::Result;
use crate::progress::{
    ImageBuildProgressUpdate, ProgressChannel, PullImageProgressUpdate, ReadyNotifier,
};
use crate::values::{
    BuildImageRequest, ContainerReference, CreateContainerRequest, DaemonVersionInformation,
    ImageReference, NetworkReference, PingResponse, VolumeReference,
};
use std::io::Write;

/// The fixed set of engine operations reachable through the boundary.
///
/// # Implementations
///
/// - [`ScriptedEngine`]: in-memory engine with scripted progress, used by
///   the test suite and as the reference for the callback contracts
/// - Production connectors live outside this crate
///
/// [`ScriptedEngine`]: crate::engines::ScriptedEngine
pub trait ContainerEngine: Send + Sync {
    /// Returns the engine name for logs and diagnostics.
    fn name(&self) -> &str;

    // =========================================================================
    // Daemon Information
    // =========================================================================

    /// Checks connectivity and returns the engine's capability snapshot.
    fn ping(&self) -> Result<PingResponse>;

    /// Returns the engine daemon's version information.
    fn daemon_version(&self) -> Result<DaemonVersionInformation>;

    // =========================================================================
    // Volumes and Networks
    // =========================================================================

    /// Creates a named volume.
    fn create_volume(&self, name: &str) -> Result<VolumeReference>;

    /// Deletes a volume by name.
    fn delete_volume(&self, name: &str) -> Result<()>;

    /// Lists every volume known to the engine.
    fn list_all_volumes(&self) -> Result<Vec<VolumeReference>>;

    /// Creates a network with the given driver.
    fn create_network(&self, name: &str, driver: &str) -> Result<NetworkReference>;

    /// Resolves a network by name or ID.
    fn get_network(&self, name_or_id: &str) -> Result<NetworkReference>;

    /// Deletes a network by ID.
    fn delete_network(&self, id: &str) -> Result<()>;

    // =========================================================================
    // Images
    // =========================================================================

    /// Resolves an image already present on the engine.
    ///
    /// A missing image is a `NotFound` failure, not an absent success.
    fn get_image(&self, reference: &str) -> Result<ImageReference>;

    /// Removes an image (or untags one reference of it) from the engine.
    fn delete_image(&self, reference: &str) -> Result<()>;

    /// Pulls an image, reporting progress through `progress`.
    ///
    /// Checkpoints: implementations poll `context` and the channel's answer
    /// between layers and between download chunks, never mid-chunk.
    fn pull_image(
        &self,
        reference: &str,
        context: &CancellationContext,
        progress: &mut ProgressChannel<'_, PullImageProgressUpdate>,
    ) -> Result<ImageReference>;

    /// Builds an image from `request`, writing raw build output to `output`
    /// and reporting structured progress through `progress`.
    ///
    /// Checkpoints: between build steps.
    fn build_image(
        &self,
        request: &BuildImageRequest,
        context: &CancellationContext,
        output: &mut dyn Write,
        progress: &mut ProgressChannel<'_, ImageBuildProgressUpdate>,
    ) -> Result<ImageReference>;

    // =========================================================================
    // Containers
    // =========================================================================

    /// Creates a container. The container is created but not started.
    fn create_container(&self, request: &CreateContainerRequest) -> Result<ContainerReference>;

    /// Starts a created container.
    fn start_container(&self, id: &str) -> Result<()>;

    /// Stops a running container, giving it `timeout_seconds` to exit
    /// gracefully before the engine kills it.
    fn stop_container(&self, id: &str, timeout_seconds: i64) -> Result<()>;

    /// Removes a container. `force` removes a running container;
    /// `remove_volumes` also removes its anonymous volumes.
    fn remove_container(&self, id: &str, force: bool, remove_volumes: bool) -> Result<()>;

    /// Streams the container's stdout and stderr into the given sinks until
    /// the output ends.
    ///
    /// `ready` is fired exactly once, after the attachment is established
    /// and before any output is streamed, so the caller can order a start
    /// against it. A `Cancel` answer aborts the attachment.
    fn attach_to_container_output(
        &self,
        id: &str,
        context: &CancellationContext,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        ready: &mut ReadyNotifier<'_>,
    ) -> Result<()> {
        let _ = (id, context, stdout, stderr, ready);
        Err(crate::error::Error::NotSupported(format!(
            "attaching to container output is not supported by the {} engine",
            self.name()
        )))
    }

    /// Blocks until the container exits and returns its exit code.
    ///
    /// `ready` is fired exactly once, after the engine has registered for
    /// exit notifications and before blocking, so the caller can order a
    /// start against it without racing. A `Cancel` answer aborts the wait.
    fn wait_for_container_exit(
        &self,
        id: &str,
        context: &CancellationContext,
        ready: &mut ReadyNotifier<'_>,
    ) -> Result<i64> {
        let _ = (id, context, ready);
        Err(crate::error::Error::NotSupported(format!(
            "waiting for container exit is not supported by the {} engine",
            self.name()
        )))
    }
}
