//! # Progress Channel
//!
//! Streaming operations (image pull, image build) notify the caller through
//! a callback invoked synchronously on the calling thread, once per event,
//! in emission order. The callback answers with a [`ProgressContinuation`]:
//! `Continue` to keep going, `Cancel` to request cooperative cancellation.
//!
//! ## Delivery Contract
//!
//! - Updates are passed to the callback **by borrow**. The callback must not
//!   keep the reference past its own return; anything needed later must be
//!   copied (`Clone` is derived on every update type for exactly this).
//! - Events are never reordered, batched, or delivered concurrently: the
//!   calling thread is blocked inside the operation, and the producer emits
//!   on that same thread.
//! - After the callback returns [`Cancel`], the channel latches: the
//!   callback is **never invoked again**, and the producer observes the
//!   latch at its next checkpoint. The guarantee is at most one further
//!   checkpoint after cancel.
//!
//! ## Update Shapes
//!
//! [`ImageBuildProgressUpdate`] is a genuine sum type: exactly one variant
//! per event is structural, not conventional. Pull progress mirrors the
//! engine's status stream: a human-readable message, an optional byte-level
//! detail, and the ID of the layer the update concerns.

use serde::{Deserialize, Serialize};

// =============================================================================
// Pull Progress
// =============================================================================

/// Byte-level detail of one pull sub-operation (download, extract).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullImageProgressDetail {
    /// Bytes completed so far.
    pub current: i64,
    /// Total bytes in this sub-operation.
    pub total: i64,
}

/// A snapshot of the progress of an image pull, or of one of its layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullImageProgressUpdate {
    /// Engine status message (e.g. "Downloading", "Pull complete").
    pub message: String,
    /// Byte counts, when the message concerns a measurable sub-operation.
    pub detail: Option<PullImageProgressDetail>,
    /// Layer ID this update concerns; empty for whole-pull messages.
    pub id: String,
}

impl PullImageProgressUpdate {
    pub fn new(
        message: impl Into<String>,
        detail: Option<PullImageProgressDetail>,
        id: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            detail,
            id: id.into(),
        }
    }
}

// =============================================================================
// Build Progress
// =============================================================================

/// One progress event of an image build.
///
/// Step numbers are 1-based and refer to Dockerfile steps; context upload
/// happens before step 1 and reports step number 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ImageBuildProgressUpdate {
    /// Build context bytes uploaded to the engine so far.
    ContextUploadProgress { step_number: i64, bytes_uploaded: i64 },
    /// A build step is starting.
    StepStarting { step_number: i64, step_name: String },
    /// A chunk of output from a running build step.
    StepOutput { step_number: i64, output: String },
    /// A step is pulling a base image; wraps the pull's own progress.
    StepPullProgress {
        step_number: i64,
        pull_progress: PullImageProgressUpdate,
    },
    /// A step is downloading something other than an image (e.g. ADD from
    /// a URL).
    StepDownloadProgress {
        step_number: i64,
        downloaded_bytes: i64,
        total_bytes: i64,
    },
    /// A build step finished.
    StepFinished { step_number: i64 },
    /// The build failed; a final result error follows.
    BuildFailed { message: String },
}

impl ImageBuildProgressUpdate {
    /// The step this update concerns, if it concerns one.
    pub fn step_number(&self) -> Option<i64> {
        match self {
            Self::ContextUploadProgress { step_number, .. }
            | Self::StepStarting { step_number, .. }
            | Self::StepOutput { step_number, .. }
            | Self::StepPullProgress { step_number, .. }
            | Self::StepDownloadProgress { step_number, .. }
            | Self::StepFinished { step_number } => Some(*step_number),
            Self::BuildFailed { .. } => None,
        }
    }
}

// =============================================================================
// Continuation Protocol
// =============================================================================

/// A callback's answer to a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressContinuation {
    /// Keep going.
    Continue,
    /// Cooperatively cancel the operation at its next checkpoint.
    Cancel,
}

impl ProgressContinuation {
    pub fn is_cancel(self) -> bool {
        self == Self::Cancel
    }
}

// =============================================================================
// Progress Channel
// =============================================================================

/// Delivers progress updates of type `T` to a caller-supplied callback,
/// enforcing the latched-cancellation contract.
///
/// Constructed by the boundary facade around the caller's closure and handed
/// to the engine, which calls [`emit`](Self::emit) once per event.
pub struct ProgressChannel<'a, T> {
    callback: Box<dyn FnMut(&T) -> ProgressContinuation + 'a>,
    cancelled: bool,
    invocations: u64,
}

impl<'a, T> ProgressChannel<'a, T> {
    pub fn new(callback: impl FnMut(&T) -> ProgressContinuation + 'a) -> Self {
        Self {
            callback: Box::new(callback),
            cancelled: false,
            invocations: 0,
        }
    }

    /// Delivers one update.
    ///
    /// The update is lent to the callback for the duration of the call only.
    /// Once a callback has answered [`Cancel`], further emits return
    /// `Cancel` immediately without invoking the callback.
    pub fn emit(&mut self, update: &T) -> ProgressContinuation {
        if self.cancelled {
            return ProgressContinuation::Cancel;
        }

        self.invocations += 1;

        let continuation = (self.callback)(update);
        if continuation.is_cancel() {
            self.cancelled = true;
        }

        continuation
    }

    /// True once a callback has requested cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Number of times the callback has actually been invoked.
    pub fn invocations(&self) -> u64 {
        self.invocations
    }
}

// The callback is not Debug; render the observable state only.
impl<T> std::fmt::Debug for ProgressChannel<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressChannel")
            .field("cancelled", &self.cancelled)
            .field("invocations", &self.invocations)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Ready Notification
// =============================================================================

/// Payloadless readiness callback with the same continuation contract.
///
/// Used by operations that need to tell the caller "the stream is attached /
/// the container is about to start" exactly once before blocking.
pub struct ReadyNotifier<'a> {
    callback: Option<Box<dyn FnMut() -> ProgressContinuation + 'a>>,
    notified: bool,
}

impl<'a> ReadyNotifier<'a> {
    pub fn new(callback: impl FnMut() -> ProgressContinuation + 'a) -> Self {
        Self {
            callback: Some(Box::new(callback)),
            notified: false,
        }
    }

    /// A notifier that does nothing and always continues.
    pub fn disabled() -> Self {
        Self {
            callback: None,
            notified: false,
        }
    }

    /// Fires the readiness notification. Subsequent calls are no-ops that
    /// answer `Continue`; readiness is reported at most once.
    pub fn notify(&mut self) -> ProgressContinuation {
        if self.notified {
            return ProgressContinuation::Continue;
        }
        self.notified = true;

        match self.callback.as_mut() {
            Some(callback) => callback(),
            None => ProgressContinuation::Continue,
        }
    }
}

impl std::fmt::Debug for ReadyNotifier<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadyNotifier")
            .field("notified", &self.notified)
            .finish_non_exhaustive()
    }
}
