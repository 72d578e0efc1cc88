//! # Engine Bridge - the boundary facade
//!
//! [`EngineBridge`] is the single surface a foreign runtime talks to. It
//! owns the handle tables for clients, cancellation contexts, and output
//! streams; marshals request records, reference arrays, and progress
//! callbacks; and maps cooperative cancellation into `Cancelled` errors.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          EngineBridge                               │
//! │                                                                     │
//! │  HandleTable<client>   HandleTable<context>   HandleTable<stream>   │
//! │        │                      │                      │              │
//! │        ▼                      ▼                      ▼              │
//! │   ClientState        CancellationContext      Box<dyn Write>        │
//! │   (Arc<dyn ContainerEngine> + configuration)                        │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  per-operation wrappers:                                            │
//! │    validate request → resolve handles → call engine →               │
//! │    marshal result (ValueArray / reference records) → Result         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Blocking and Ordering
//!
//! Every operation blocks the calling thread; progress callbacks run on
//! that same thread, in emission order, interleaved with the engine's work.
//! Wanting two pulls at once means calling from two threads with two
//! context handles.
//!
//! ## Ownership at the Boundary
//!
//! Request records are borrowed for the duration of the call. Results are
//! returned by value. List results arrive as a fully-populated
//! [`ValueArray`] whose slot count equals the element count.

use crate::array::ValueArray;
use crate::constants::{MAX_ACTIVE_CLIENTS, MAX_ACTIVE_CONTEXTS, MAX_ACTIVE_OUTPUT_STREAMS};
use crate::context::CancellationContext;
use crate::engine::ContainerEngine;
use crate::error::{Error, Result};
use crate::handle::{
    ClientHandle, ClientKind, ContextHandle, ContextKind, HandleTable, OutputStreamHandle,
    OutputStreamKind,
};
use crate::progress::{
    ImageBuildProgressUpdate, ProgressChannel, ProgressContinuation, PullImageProgressUpdate,
    ReadyNotifier,
};
use crate::values::{
    BuildImageRequest, ClientConfiguration, ContainerReference, CreateContainerRequest,
    DaemonVersionInformation, ImageReference, NetworkReference, PingResponse, VolumeReference,
};
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// An engine connection registered with the bridge.
///
/// Constructing the engine from a [`ClientConfiguration`] (socket dialing,
/// TLS, credential loading) is the native side's concern; the bridge only
/// validates what it can see and issues the capability token.
struct ClientState {
    engine: Arc<dyn ContainerEngine>,
    #[allow(dead_code)] // held so the configuration outlives the handle
    configuration: ClientConfiguration,
}

type OutputSinkSlot = Mutex<Box<dyn Write + Send>>;

/// The marshalling boundary between a foreign caller and container engines.
pub struct EngineBridge {
    clients: HandleTable<ClientKind, ClientState>,
    contexts: HandleTable<ContextKind, CancellationContext>,
    output_streams: HandleTable<OutputStreamKind, OutputSinkSlot>,
}

impl Default for EngineBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBridge {
    /// Creates a bridge with the capacity limits from [`crate::constants`].
    pub fn new() -> Self {
        Self {
            clients: HandleTable::new(MAX_ACTIVE_CLIENTS),
            contexts: HandleTable::new(MAX_ACTIVE_CONTEXTS),
            output_streams: HandleTable::new(MAX_ACTIVE_OUTPUT_STREAMS),
        }
    }

    // =========================================================================
    // Client Lifecycle
    // =========================================================================

    /// Registers an engine connection and issues a client handle for it.
    ///
    /// The caller owns `configuration` and keeps it; the bridge copies it.
    /// If the configuration names a configuration directory, it must exist.
    pub fn create_client(
        &self,
        configuration: &ClientConfiguration,
        engine: Arc<dyn ContainerEngine>,
    ) -> Result<ClientHandle> {
        if let Some(dir) = &configuration.config_directory_path {
            if !dir.is_dir() {
                return Err(Error::ConfigurationDirectoryNotFound(dir.clone()));
            }
        }

        let handle = self.clients.insert(ClientState {
            engine: engine.clone(),
            configuration: configuration.clone(),
        })?;

        info!(engine = engine.name(), handle = %handle, "created client");
        Ok(handle)
    }

    /// Releases a client handle. The handle (and every copy of it) becomes
    /// permanently invalid.
    pub fn dispose_client(&self, client: ClientHandle) -> Result<()> {
        self.clients.remove(client)?;
        debug!(handle = %client, "disposed client");
        Ok(())
    }

    /// Number of live client handles.
    pub fn active_clients(&self) -> usize {
        self.clients.len()
    }

    fn engine(&self, client: ClientHandle) -> Result<Arc<dyn ContainerEngine>> {
        Ok(self.clients.get(client)?.engine.clone())
    }

    // =========================================================================
    // Cancellation Contexts
    // =========================================================================

    /// Creates a cancellation context and issues a handle for it.
    pub fn create_context(&self) -> Result<ContextHandle> {
        self.contexts.insert(CancellationContext::new())
    }

    /// Requests cancellation of every operation holding this context.
    /// Safe to call from a different thread than the blocked operation.
    pub fn cancel_context(&self, context: ContextHandle) -> Result<()> {
        self.contexts.get(context)?.cancel();
        debug!(handle = %context, "cancelled context");
        Ok(())
    }

    /// Releases a context handle, cancelling it first so no operation can
    /// keep observing a context whose handle is gone.
    pub fn destroy_context(&self, context: ContextHandle) -> Result<()> {
        let ctx = self.contexts.remove(context)?;
        ctx.cancel();
        Ok(())
    }

    fn context(&self, context: ContextHandle) -> Result<Arc<CancellationContext>> {
        self.contexts.get(context)
    }

    // =========================================================================
    // Output Streams
    // =========================================================================

    /// Registers a sink for raw operation output (build logs, attached
    /// container output) and issues a handle for it.
    ///
    /// Ownership of the sink transfers to the bridge; callers that need to
    /// read what was written keep their own shared half (see
    /// [`SharedBuffer`]).
    pub fn open_output_stream(&self, sink: Box<dyn Write + Send>) -> Result<OutputStreamHandle> {
        self.output_streams.insert(Mutex::new(sink))
    }

    /// Releases an output stream handle, dropping the sink.
    pub fn dispose_output_stream(&self, stream: OutputStreamHandle) -> Result<()> {
        self.output_streams.remove(stream)?;
        Ok(())
    }

    fn output_sink(&self, stream: OutputStreamHandle) -> Result<Arc<OutputSinkSlot>> {
        self.output_streams.get(stream)
    }

    // =========================================================================
    // Daemon Information
    // =========================================================================

    pub fn ping(&self, client: ClientHandle) -> Result<PingResponse> {
        self.engine(client)?.ping()
    }

    pub fn daemon_version(&self, client: ClientHandle) -> Result<DaemonVersionInformation> {
        self.engine(client)?.daemon_version()
    }

    // =========================================================================
    // Volumes and Networks
    // =========================================================================

    pub fn create_volume(&self, client: ClientHandle, name: &str) -> Result<VolumeReference> {
        self.engine(client)?.create_volume(name)
    }

    pub fn delete_volume(&self, client: ClientHandle, name: &str) -> Result<()> {
        self.engine(client)?.delete_volume(name)
    }

    /// Lists every volume, marshalled as a fully-populated array whose slot
    /// count equals the volume count.
    pub fn list_all_volumes(&self, client: ClientHandle) -> Result<ValueArray<VolumeReference>> {
        let volumes = self.engine(client)?.list_all_volumes()?;
        Ok(ValueArray::from(volumes))
    }

    pub fn create_network(
        &self,
        client: ClientHandle,
        name: &str,
        driver: &str,
    ) -> Result<NetworkReference> {
        self.engine(client)?.create_network(name, driver)
    }

    pub fn get_network(&self, client: ClientHandle, name_or_id: &str) -> Result<NetworkReference> {
        self.engine(client)?.get_network(name_or_id)
    }

    pub fn delete_network(&self, client: ClientHandle, network: &NetworkReference) -> Result<()> {
        self.engine(client)?.delete_network(&network.id)
    }

    // =========================================================================
    // Images
    // =========================================================================

    pub fn get_image(&self, client: ClientHandle, reference: &str) -> Result<ImageReference> {
        self.engine(client)?.get_image(reference)
    }

    pub fn delete_image(&self, client: ClientHandle, reference: &str) -> Result<()> {
        self.engine(client)?.delete_image(reference)
    }

    /// Pulls an image, delivering progress to `on_progress` synchronously on
    /// this thread.
    ///
    /// The update passed to the callback is a borrow; copy what you keep.
    /// Returning [`Cancel`] cancels the pull at the engine's next
    /// checkpoint and the call fails with kind `Cancelled`.
    ///
    /// [`Cancel`]: ProgressContinuation::Cancel
    pub fn pull_image<F>(
        &self,
        client: ClientHandle,
        reference: &str,
        context: ContextHandle,
        on_progress: F,
    ) -> Result<ImageReference>
    where
        F: FnMut(&PullImageProgressUpdate) -> ProgressContinuation,
    {
        let engine = self.engine(client)?;
        let ctx = self.context(context)?;
        let mut channel = ProgressChannel::new(on_progress);

        info!(reference, "pull image");
        engine.pull_image(reference, &ctx, &mut channel)
    }

    /// Builds an image, writing raw build output to the registered stream
    /// and delivering structured progress to `on_progress`.
    pub fn build_image<F>(
        &self,
        client: ClientHandle,
        request: &BuildImageRequest,
        output: OutputStreamHandle,
        context: ContextHandle,
        on_progress: F,
    ) -> Result<ImageReference>
    where
        F: FnMut(&ImageBuildProgressUpdate) -> ProgressContinuation,
    {
        request.validate()?;

        let engine = self.engine(client)?;
        let ctx = self.context(context)?;
        let sink = self.output_sink(output)?;
        let mut channel = ProgressChannel::new(on_progress);

        info!(context_directory = %request.context_directory.display(), "build image");

        let mut guard = sink.lock().unwrap_or_else(PoisonError::into_inner);
        engine.build_image(request, &ctx, &mut *guard, &mut channel)
    }

    // =========================================================================
    // Containers
    // =========================================================================

    pub fn create_container(
        &self,
        client: ClientHandle,
        request: &CreateContainerRequest,
    ) -> Result<ContainerReference> {
        request.validate()?;
        self.engine(client)?.create_container(request)
    }

    pub fn start_container(
        &self,
        client: ClientHandle,
        container: &ContainerReference,
    ) -> Result<()> {
        self.engine(client)?.start_container(&container.id)
    }

    pub fn stop_container(
        &self,
        client: ClientHandle,
        container: &ContainerReference,
        timeout_seconds: i64,
    ) -> Result<()> {
        self.engine(client)?
            .stop_container(&container.id, timeout_seconds)
    }

    pub fn remove_container(
        &self,
        client: ClientHandle,
        container: &ContainerReference,
        force: bool,
        remove_volumes: bool,
    ) -> Result<()> {
        self.engine(client)?
            .remove_container(&container.id, force, remove_volumes)
    }

    /// Streams the container's stdout and stderr into the two registered
    /// output streams until the output ends.
    ///
    /// The two stream handles must be distinct; both are released when the
    /// attachment ends, whatever the outcome. `on_ready` (if supplied) is
    /// invoked exactly once, after the attachment is established and before
    /// any output arrives, so starting the container from inside it cannot
    /// miss output.
    pub fn attach_to_container_output<F>(
        &self,
        client: ClientHandle,
        container: &ContainerReference,
        stdout_stream: OutputStreamHandle,
        stderr_stream: OutputStreamHandle,
        context: ContextHandle,
        on_ready: Option<F>,
    ) -> Result<()>
    where
        F: FnMut() -> ProgressContinuation,
    {
        if stdout_stream == stderr_stream {
            return Err(Error::InvalidArgument(
                "stdout and stderr output streams must be distinct".to_string(),
            ));
        }

        let engine = self.engine(client)?;
        let ctx = self.context(context)?;
        let stdout_sink = self.output_sink(stdout_stream)?;
        let stderr_sink = self.output_sink(stderr_stream)?;

        let mut notifier = match on_ready {
            Some(callback) => ReadyNotifier::new(callback),
            None => ReadyNotifier::disabled(),
        };

        debug!(container = %container.id, "attach to container output");

        let result = {
            let mut stdout = stdout_sink.lock().unwrap_or_else(PoisonError::into_inner);
            let mut stderr = stderr_sink.lock().unwrap_or_else(PoisonError::into_inner);
            engine.attach_to_container_output(
                &container.id,
                &ctx,
                &mut *stdout,
                &mut *stderr,
                &mut notifier,
            )
        };

        // The sinks are single-use: the attachment consumes them.
        let _ = self.output_streams.remove(stdout_stream);
        let _ = self.output_streams.remove(stderr_stream);

        result
    }

    /// Blocks until the container exits and returns its exit code.
    ///
    /// `on_ready` (if supplied) is invoked exactly once, after the engine
    /// has registered for exit notifications; starting the container from
    /// inside it cannot miss the exit.
    pub fn wait_for_container_exit<F>(
        &self,
        client: ClientHandle,
        container: &ContainerReference,
        context: ContextHandle,
        on_ready: Option<F>,
    ) -> Result<i64>
    where
        F: FnMut() -> ProgressContinuation,
    {
        let engine = self.engine(client)?;
        let ctx = self.context(context)?;

        let mut notifier = match on_ready {
            Some(callback) => ReadyNotifier::new(callback),
            None => ReadyNotifier::disabled(),
        };

        engine.wait_for_container_exit(&container.id, &ctx, &mut notifier)
    }
}

// =============================================================================
// Shared Buffer Sink
// =============================================================================

/// Clonable in-memory output sink.
///
/// Registering an output stream transfers the sink into the bridge; a
/// `SharedBuffer` lets the caller keep a reading half:
///
/// ```rust,ignore
/// let buffer = SharedBuffer::new();
/// let stream = bridge.open_output_stream(Box::new(buffer.clone()))?;
/// // ... build ...
/// let log = buffer.contents();
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Contents decoded as UTF-8, lossily.
    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
