//! Container engine implementations.
//!
//! This module contains in-process implementations of the
//! [`ContainerEngine`] trait. Production connectors that reach a real
//! engine over its own protocol live outside this crate; the scripted
//! engine here fulfils every operation in memory and is the reference
//! implementation for the boundary's callback and cancellation contracts.
//!
//! [`ContainerEngine`]: crate::engine::ContainerEngine

pub mod scripted;

pub use self::scripted::{BuildStepScript, PullLayerScript, ScriptedEngine};
