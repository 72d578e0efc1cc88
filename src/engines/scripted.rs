//! Scripted in-memory container engine.
//!
//! Fulfils the whole [`ContainerEngine`] surface without an engine daemon:
//! resources live in in-process tables, image IDs are content-addressed
//! from the request, and streamed operations replay a configurable script
//! of progress events. The scripts default to a plausible two-layer pull
//! and a three-step build; tests reconfigure them and inject failures.
//!
//! ## Thread Safety
//!
//! The engine is `Send + Sync`; resource state is protected by an internal
//! `RwLock`. Concurrent operations against the same engine interleave at
//! lock granularity, matching the "external synchronization per handle"
//! contract of the boundary.
//!
//! ## Checkpoint Placement
//!
//! Cancellation contexts are polled between layers (pull), between steps
//! (build), and before blocking (wait); a `Cancel` answer from a progress
//! channel is honored at the very next emit. Both paths surface as a
//! `Cancelled` error, never as success.
//!
//! [`ContainerEngine`]: crate::engine::ContainerEngine

use crate::context::CancellationContext;
use crate::engine::ContainerEngine;
use crate::error::{Error, Result};
use crate::progress::{
    ImageBuildProgressUpdate, ProgressChannel, PullImageProgressDetail, PullImageProgressUpdate,
    ReadyNotifier,
};
use crate::values::{
    BuildImageRequest, ContainerReference, CreateContainerRequest, DaemonVersionInformation,
    ImageReference, NetworkReference, PingResponse, VolumeReference,
};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

// =============================================================================
// Scripts
// =============================================================================

/// One layer of a scripted image pull.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullLayerScript {
    /// Short layer ID reported in progress updates.
    pub id: String,
    /// Layer size in bytes; downloads are reported in two chunks.
    pub size: i64,
}

impl PullLayerScript {
    pub fn new(id: impl Into<String>, size: i64) -> Self {
        Self {
            id: id.into(),
            size,
        }
    }
}

/// One step of a scripted image build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStepScript {
    /// Step name as it would appear in a Dockerfile (e.g. `RUN apk add curl`).
    pub name: String,
    /// Output lines the step produces.
    pub output_lines: Vec<String>,
    /// Base image this step pulls, if any; emits step pull progress events.
    pub pulls_base_image: Option<String>,
    /// Bytes of remote content this step downloads, if any; emits step
    /// download progress events.
    pub download_total_bytes: Option<i64>,
}

impl BuildStepScript {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_output(mut self, lines: &[&str]) -> Self {
        self.output_lines = lines.iter().map(|l| l.to_string()).collect();
        self
    }
}

// =============================================================================
// Engine State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerStatus {
    Created,
    Running,
    Stopped,
}

impl ContainerStatus {
    fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

#[derive(Debug, Clone)]
struct ContainerEntry {
    name: Option<String>,
    status: ContainerStatus,
}

#[derive(Debug, Default)]
struct EngineState {
    // BTreeMaps keep list results in a stable order.
    volumes: BTreeMap<String, VolumeReference>,
    networks: BTreeMap<String, NetworkReference>,
    images: BTreeMap<String, ImageReference>,
    containers: BTreeMap<String, ContainerEntry>,
    next_container: u64,
}

// =============================================================================
// Scripted Engine
// =============================================================================

/// In-memory [`ContainerEngine`] with scripted progress and failure
/// injection.
pub struct ScriptedEngine {
    state: RwLock<EngineState>,
    pull_layers: Vec<PullLayerScript>,
    build_steps: Vec<BuildStepScript>,
    context_upload_bytes: i64,
    fail_pull: Option<String>,
    fail_build_at_step: Option<i64>,
    container_exit_code: i64,
    container_stdout_lines: Vec<String>,
    container_stderr_lines: Vec<String>,
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedEngine {
    /// Engine with the default pull and build scripts.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(EngineState::default()),
            pull_layers: vec![
                PullLayerScript::new("4f4fb700ef54", 3_370_706),
                PullLayerScript::new("9b18e9b68314", 28_204_538),
            ],
            build_steps: vec![
                BuildStepScript::new("FROM alpine:3.18"),
                BuildStepScript::new("RUN apk add --no-cache curl")
                    .with_output(&["fetch https://dl-cdn.alpinelinux.org/...", "OK: 12 MiB in 28 packages"]),
                BuildStepScript::new("COPY ./app /app"),
            ],
            context_upload_bytes: 2_048,
            fail_pull: None,
            fail_build_at_step: None,
            container_exit_code: 0,
            container_stdout_lines: vec!["service listening on port 8080".to_string()],
            container_stderr_lines: Vec::new(),
        }
    }

    pub fn with_pull_layers(mut self, layers: Vec<PullLayerScript>) -> Self {
        self.pull_layers = layers;
        self
    }

    pub fn with_build_steps(mut self, steps: Vec<BuildStepScript>) -> Self {
        self.build_steps = steps;
        self
    }

    pub fn with_context_upload_bytes(mut self, bytes: i64) -> Self {
        self.context_upload_bytes = bytes;
        self
    }

    /// Makes every pull fail with the given engine message.
    pub fn fail_pull_with(mut self, message: impl Into<String>) -> Self {
        self.fail_pull = Some(message.into());
        self
    }

    /// Makes builds fail after emitting the events of the given 1-based step.
    pub fn fail_build_at_step(mut self, step_number: i64) -> Self {
        self.fail_build_at_step = Some(step_number);
        self
    }

    /// Exit code reported by waited-on containers.
    pub fn with_container_exit_code(mut self, exit_code: i64) -> Self {
        self.container_exit_code = exit_code;
        self
    }

    /// Lines streamed to the stdout and stderr sinks of an attached
    /// container.
    pub fn with_container_output(mut self, stdout: &[&str], stderr: &[&str]) -> Self {
        self.container_stdout_lines = stdout.iter().map(|l| l.to_string()).collect();
        self.container_stderr_lines = stderr.iter().map(|l| l.to_string()).collect();
        self
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, EngineState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, EngineState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Content-addressed image ID for a reference or build input.
    fn image_id(input: &str) -> String {
        format!("sha256:{}", hex_digest(&Sha256::digest(input.as_bytes())))
    }
}

fn hex_digest(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

impl ContainerEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    // =========================================================================
    // Daemon Information
    // =========================================================================

    fn ping(&self) -> Result<PingResponse> {
        Ok(PingResponse {
            api_version: "1.43".to_string(),
            os_type: "linux".to_string(),
            experimental: false,
            builder_version: "2".to_string(),
        })
    }

    fn daemon_version(&self) -> Result<DaemonVersionInformation> {
        Ok(DaemonVersionInformation {
            version: "24.0.0".to_string(),
            api_version: "1.43".to_string(),
            min_api_version: "1.12".to_string(),
            git_commit: "98fdcd7".to_string(),
            operating_system: "linux".to_string(),
            architecture: "x86_64".to_string(),
            experimental: false,
        })
    }

    // =========================================================================
    // Volumes and Networks
    // =========================================================================

    fn create_volume(&self, name: &str) -> Result<VolumeReference> {
        let mut state = self.write_state();

        if state.volumes.contains_key(name) {
            return Err(Error::VolumeAlreadyExists(name.to_string()));
        }

        let reference = VolumeReference::new(name);
        state.volumes.insert(name.to_string(), reference.clone());
        debug!(volume = name, "created volume");

        Ok(reference)
    }

    fn delete_volume(&self, name: &str) -> Result<()> {
        let mut state = self.write_state();

        if state.volumes.remove(name).is_none() {
            return Err(Error::VolumeNotFound(name.to_string()));
        }

        debug!(volume = name, "deleted volume");
        Ok(())
    }

    fn list_all_volumes(&self) -> Result<Vec<VolumeReference>> {
        Ok(self.read_state().volumes.values().cloned().collect())
    }

    fn create_network(&self, name: &str, driver: &str) -> Result<NetworkReference> {
        let mut state = self.write_state();

        let id = hex_digest(&Sha256::digest(name.as_bytes()))[..12].to_string();
        let reference = NetworkReference::new(id);
        state.networks.insert(name.to_string(), reference.clone());
        debug!(network = name, driver, "created network");

        Ok(reference)
    }

    fn get_network(&self, name_or_id: &str) -> Result<NetworkReference> {
        let state = self.read_state();

        state
            .networks
            .get(name_or_id)
            .cloned()
            .or_else(|| {
                state
                    .networks
                    .values()
                    .find(|n| n.id == name_or_id)
                    .cloned()
            })
            .ok_or_else(|| Error::NetworkNotFound(name_or_id.to_string()))
    }

    fn delete_network(&self, id: &str) -> Result<()> {
        let mut state = self.write_state();

        let name = state
            .networks
            .iter()
            .find(|(_, network)| network.id == id)
            .map(|(name, _)| name.clone())
            .ok_or_else(|| Error::NetworkNotFound(id.to_string()))?;

        state.networks.remove(&name);
        debug!(network = id, "deleted network");
        Ok(())
    }

    // =========================================================================
    // Images
    // =========================================================================

    fn get_image(&self, reference: &str) -> Result<ImageReference> {
        self.read_state()
            .images
            .get(reference)
            .cloned()
            .ok_or_else(|| Error::ImageNotFound(reference.to_string()))
    }

    fn delete_image(&self, reference: &str) -> Result<()> {
        let mut state = self.write_state();

        if state.images.remove(reference).is_none() {
            return Err(Error::ImageNotFound(reference.to_string()));
        }

        debug!(image = reference, "deleted image");
        Ok(())
    }

    fn pull_image(
        &self,
        reference: &str,
        context: &CancellationContext,
        progress: &mut ProgressChannel<'_, PullImageProgressUpdate>,
    ) -> Result<ImageReference> {
        if let Some(message) = &self.fail_pull {
            return Err(Error::ImagePullFailed {
                reference: reference.to_string(),
                message: message.clone(),
            });
        }

        info!(reference, "pulling image");

        for layer in &self.pull_layers {
            context.checkpoint("pull image")?;

            if progress
                .emit(&PullImageProgressUpdate::new(
                    "Pulling fs layer",
                    None,
                    &layer.id,
                ))
                .is_cancel()
            {
                return Err(Error::cancelled("pull image"));
            }

            for current in [layer.size / 2, layer.size] {
                let update = PullImageProgressUpdate::new(
                    "Downloading",
                    Some(PullImageProgressDetail {
                        current,
                        total: layer.size,
                    }),
                    &layer.id,
                );
                if progress.emit(&update).is_cancel() {
                    return Err(Error::cancelled("pull image"));
                }
            }

            if progress
                .emit(&PullImageProgressUpdate::new("Pull complete", None, &layer.id))
                .is_cancel()
            {
                return Err(Error::cancelled("pull image"));
            }
        }

        context.checkpoint("pull image")?;

        let id = Self::image_id(reference);

        if progress
            .emit(&PullImageProgressUpdate::new(
                format!("Digest: {id}"),
                None,
                "",
            ))
            .is_cancel()
        {
            return Err(Error::cancelled("pull image"));
        }

        let reference_record = ImageReference::new(&id);
        self.write_state()
            .images
            .insert(reference.to_string(), reference_record.clone());

        Ok(reference_record)
    }

    fn build_image(
        &self,
        request: &BuildImageRequest,
        context: &CancellationContext,
        output: &mut dyn Write,
        progress: &mut ProgressChannel<'_, ImageBuildProgressUpdate>,
    ) -> Result<ImageReference> {
        request.validate()?;

        info!(
            context_directory = %request.context_directory.display(),
            steps = self.build_steps.len(),
            "building image"
        );

        if progress
            .emit(&ImageBuildProgressUpdate::ContextUploadProgress {
                step_number: 0,
                bytes_uploaded: self.context_upload_bytes,
            })
            .is_cancel()
        {
            return Err(Error::cancelled("build image"));
        }

        let total_steps = self.build_steps.len();

        for (index, step) in self.build_steps.iter().enumerate() {
            let step_number = (index + 1) as i64;

            context.checkpoint("build image")?;

            if progress
                .emit(&ImageBuildProgressUpdate::StepStarting {
                    step_number,
                    step_name: step.name.clone(),
                })
                .is_cancel()
            {
                return Err(Error::cancelled("build image"));
            }

            writeln!(output, "Step {step_number}/{total_steps} : {}", step.name)
                .map_err(|e| Error::OutputStreamWrite(e.to_string()))?;

            if let Some(base_image) = &step.pulls_base_image {
                for message in ["Pulling fs layer", "Pull complete"] {
                    let update = ImageBuildProgressUpdate::StepPullProgress {
                        step_number,
                        pull_progress: PullImageProgressUpdate::new(message, None, base_image),
                    };
                    if progress.emit(&update).is_cancel() {
                        return Err(Error::cancelled("build image"));
                    }
                }
            }

            for line in &step.output_lines {
                writeln!(output, "{line}").map_err(|e| Error::OutputStreamWrite(e.to_string()))?;

                if progress
                    .emit(&ImageBuildProgressUpdate::StepOutput {
                        step_number,
                        output: format!("{line}\n"),
                    })
                    .is_cancel()
                {
                    return Err(Error::cancelled("build image"));
                }
            }

            if let Some(total_bytes) = step.download_total_bytes {
                for downloaded_bytes in [total_bytes / 2, total_bytes] {
                    let update = ImageBuildProgressUpdate::StepDownloadProgress {
                        step_number,
                        downloaded_bytes,
                        total_bytes,
                    };
                    if progress.emit(&update).is_cancel() {
                        return Err(Error::cancelled("build image"));
                    }
                }
            }

            if self.fail_build_at_step == Some(step_number) {
                let message = format!(
                    "The command '{}' returned a non-zero code: 1",
                    step.name
                );
                // Deliver the structured failure event before returning the
                // result; a Cancel answer here changes nothing further.
                progress.emit(&ImageBuildProgressUpdate::BuildFailed {
                    message: message.clone(),
                });
                return Err(Error::BuildFailed(message));
            }

            if progress
                .emit(&ImageBuildProgressUpdate::StepFinished { step_number })
                .is_cancel()
            {
                return Err(Error::cancelled("build image"));
            }
        }

        let mut fingerprint = request.context_directory.display().to_string();
        for tag in &request.image_tags {
            fingerprint.push('\n');
            fingerprint.push_str(tag);
        }

        let id = Self::image_id(&fingerprint);
        writeln!(output, "Successfully built {}", &id[7..19])
            .map_err(|e| Error::OutputStreamWrite(e.to_string()))?;

        let reference_record = ImageReference::new(&id);
        let mut state = self.write_state();
        for tag in &request.image_tags {
            state.images.insert(tag.clone(), reference_record.clone());
        }

        Ok(reference_record)
    }

    // =========================================================================
    // Containers
    // =========================================================================

    fn create_container(&self, request: &CreateContainerRequest) -> Result<ContainerReference> {
        request.validate()?;

        let mut state = self.write_state();

        if let Some(name) = &request.name {
            let duplicate = state
                .containers
                .values()
                .any(|c| c.name.as_deref() == Some(name.as_str()));
            if duplicate {
                return Err(Error::ContainerAlreadyExists(name.clone()));
            }
        }

        state.next_container += 1;
        let id = hex_digest(&Sha256::digest(
            format!("{}#{}", request.image_reference, state.next_container).as_bytes(),
        ));

        state.containers.insert(
            id.clone(),
            ContainerEntry {
                name: request.name.clone(),
                status: ContainerStatus::Created,
            },
        );
        debug!(container = %id, image = %request.image_reference, "created container");

        Ok(ContainerReference::new(id))
    }

    fn start_container(&self, id: &str) -> Result<()> {
        let mut state = self.write_state();

        let entry = state
            .containers
            .get_mut(id)
            .ok_or_else(|| Error::ContainerNotFound(id.to_string()))?;

        if entry.status != ContainerStatus::Created {
            return Err(Error::InvalidContainerState {
                id: id.to_string(),
                state: entry.status.as_str().to_string(),
                expected: "created".to_string(),
            });
        }

        entry.status = ContainerStatus::Running;
        debug!(container = id, "started container");
        Ok(())
    }

    fn stop_container(&self, id: &str, timeout_seconds: i64) -> Result<()> {
        let mut state = self.write_state();

        let entry = state
            .containers
            .get_mut(id)
            .ok_or_else(|| Error::ContainerNotFound(id.to_string()))?;

        if entry.status != ContainerStatus::Running {
            return Err(Error::InvalidContainerState {
                id: id.to_string(),
                state: entry.status.as_str().to_string(),
                expected: "running".to_string(),
            });
        }

        entry.status = ContainerStatus::Stopped;
        debug!(container = id, timeout_seconds, "stopped container");
        Ok(())
    }

    fn remove_container(&self, id: &str, force: bool, remove_volumes: bool) -> Result<()> {
        let mut state = self.write_state();

        let entry = state
            .containers
            .get(id)
            .ok_or_else(|| Error::ContainerNotFound(id.to_string()))?;

        if entry.status == ContainerStatus::Running && !force {
            return Err(Error::InvalidContainerState {
                id: id.to_string(),
                state: "running".to_string(),
                expected: "stopped".to_string(),
            });
        }

        state.containers.remove(id);
        debug!(container = id, force, remove_volumes, "removed container");
        Ok(())
    }

    fn attach_to_container_output(
        &self,
        id: &str,
        context: &CancellationContext,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        ready: &mut ReadyNotifier<'_>,
    ) -> Result<()> {
        {
            let state = self.read_state();
            let entry = state
                .containers
                .get(id)
                .ok_or_else(|| Error::ContainerNotFound(id.to_string()))?;

            if entry.status != ContainerStatus::Running {
                return Err(Error::InvalidContainerState {
                    id: id.to_string(),
                    state: entry.status.as_str().to_string(),
                    expected: "running".to_string(),
                });
            }
        }

        // The attachment is established; tell the caller before streaming.
        if ready.notify().is_cancel() {
            return Err(Error::cancelled("attach to container output"));
        }

        context.checkpoint("attach to container output")?;

        for line in &self.container_stdout_lines {
            writeln!(stdout, "{line}").map_err(|e| Error::OutputStreamWrite(e.to_string()))?;
        }

        for line in &self.container_stderr_lines {
            writeln!(stderr, "{line}").map_err(|e| Error::OutputStreamWrite(e.to_string()))?;
        }

        debug!(container = id, "streamed container output");
        Ok(())
    }

    fn wait_for_container_exit(
        &self,
        id: &str,
        context: &CancellationContext,
        ready: &mut ReadyNotifier<'_>,
    ) -> Result<i64> {
        {
            let state = self.read_state();
            let entry = state
                .containers
                .get(id)
                .ok_or_else(|| Error::ContainerNotFound(id.to_string()))?;

            if entry.status != ContainerStatus::Running {
                return Err(Error::InvalidContainerState {
                    id: id.to_string(),
                    state: entry.status.as_str().to_string(),
                    expected: "running".to_string(),
                });
            }
        }

        // Exit notification is registered; tell the caller before blocking.
        if ready.notify().is_cancel() {
            return Err(Error::cancelled("wait for container exit"));
        }

        context.checkpoint("wait for container exit")?;

        let mut state = self.write_state();
        if let Some(entry) = state.containers.get_mut(id) {
            entry.status = ContainerStatus::Stopped;
        }

        Ok(self.container_exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_ids_are_content_addressed() {
        let a = ScriptedEngine::image_id("alpine:3.18");
        let b = ScriptedEngine::image_id("alpine:3.18");
        let c = ScriptedEngine::image_id("alpine:3.19");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("sha256:"));
        assert_eq!(a.len(), "sha256:".len() + 64);
    }

    #[test]
    fn test_container_state_machine_is_enforced() {
        let engine = ScriptedEngine::new();
        let container = engine
            .create_container(&CreateContainerRequest::new("alpine:3.18"))
            .unwrap();

        // Cannot stop a container that was never started.
        let err = engine.stop_container(&container.id, 10).unwrap_err();
        assert_eq!(err.kind(), "InvalidState");

        engine.start_container(&container.id).unwrap();
        engine.stop_container(&container.id, 10).unwrap();
        engine.remove_container(&container.id, false, false).unwrap();

        let err = engine.start_container(&container.id).unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }
}
