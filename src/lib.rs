//! # gangway
//!
//! **Ownership-Typed Marshalling Boundary for Container Engine Clients**
//!
//! This crate is the boundary layer that lets a caller in one runtime drive
//! container engine operations implemented behind it, without sharing memory
//! management or type systems with the native side. It carries simple
//! values, tagged errors, opaque resource handles, variable-length arrays,
//! and synchronous progress callbacks for long-running operations (image
//! pull, image build) - and nothing else. The engine itself is a black box
//! behind the [`ContainerEngine`] trait.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                            gangway                                  │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────────┐    │
//! │  │                      EngineBridge                           │    │
//! │  │   create_client → ping/volumes/networks/images/containers   │    │
//! │  │   pull_image / build_image (+ progress callbacks)           │    │
//! │  └───────┬──────────────────┬──────────────────┬───────────────┘    │
//! │          │                  │                  │                    │
//! │  ┌───────▼──────┐  ┌────────▼───────┐  ┌───────▼────────┐           │
//! │  │ HandleTable  │  │ ProgressChannel│  │  ValueArray    │           │
//! │  │ (generation- │  │ (latched       │  │ (checked slot  │           │
//! │  │  checked)    │  │  cancellation) │  │  transfer)     │           │
//! │  └──────────────┘  └────────────────┘  └────────────────┘           │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                     ContainerEngine trait                           │
//! │        ScriptedEngine (in-memory)  │  external connectors           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Ownership Protocol
//!
//! The allocate/populate/release discipline of a raw C boundary maps onto
//! Rust ownership, so the failure modes it invites are unrepresentable:
//!
//! | Raw-boundary hazard          | Here                                    |
//! |------------------------------|-----------------------------------------|
//! | double free                  | move semantics                          |
//! | free of absent sub-record    | dropping `Option::None`                 |
//! | response AND error present   | `Result<T, Error>`                      |
//! | two progress variants set    | sum type ([`ImageBuildProgressUpdate`]) |
//! | stale/cross-kind handle use  | generation check + phantom kinds        |
//! | array index out of range     | checked `OutOfRange` failure            |
//!
//! # Concurrency Model
//!
//! Synchronous and single call-stack: an operation blocks its calling
//! thread, and progress callbacks run on that same thread in emission
//! order. Cancellation is cooperative - a callback answers
//! [`ProgressContinuation::Cancel`], or another thread cancels a context
//! handle - and is observed at the engine's checkpoints, yielding an error
//! of kind `Cancelled`, never a success result. Concurrent operations on
//! the same handle require external synchronization.
//!
//! # Example
//!
//! ```rust,ignore
//! use gangway::{EngineBridge, ClientConfiguration, ProgressContinuation, ScriptedEngine};
//! use std::sync::Arc;
//!
//! fn main() -> gangway::Result<()> {
//!     let bridge = EngineBridge::new();
//!     let client = bridge.create_client(
//!         &ClientConfiguration::from_environment(),
//!         Arc::new(ScriptedEngine::new()),
//!     )?;
//!
//!     let context = bridge.create_context()?;
//!     let image = bridge.pull_image(client, "alpine:3.18", context, |update| {
//!         println!("{}: {}", update.id, update.message);
//!         ProgressContinuation::Continue
//!     })?;
//!
//!     println!("pulled {image}");
//!     bridge.destroy_context(context)?;
//!     bridge.dispose_client(client)
//! }
//! ```

pub mod array;
pub mod bridge;
pub mod constants;
pub mod context;
pub mod engine;
pub mod engines;
pub mod error;
pub mod handle;
pub mod progress;
pub mod values;

// Re-exports
pub use array::ValueArray;
pub use bridge::{EngineBridge, SharedBuffer};
pub use constants::*;
pub use context::CancellationContext;
pub use engine::ContainerEngine;
pub use engines::{BuildStepScript, PullLayerScript, ScriptedEngine};
pub use error::{Error, Result};
pub use handle::{ClientHandle, ContextHandle, Handle, HandleKind, HandleTable, OutputStreamHandle};
pub use progress::{
    ImageBuildProgressUpdate, ProgressChannel, ProgressContinuation, PullImageProgressDetail,
    PullImageProgressUpdate, ReadyNotifier,
};
pub use values::{
    BuildImageRequest, BuilderVersion, ClientConfiguration, ContainerReference,
    CreateContainerRequest, DaemonVersionInformation, DeviceMount, ExposedPort, ImageReference,
    NetworkReference, PingResponse, StringPair, TlsConfiguration, VolumeReference,
};
