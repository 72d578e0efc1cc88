//! # Boundary Constants
//!
//! Defines the resource limits for the marshalling boundary. These constants
//! are the **single source of truth** for handle-table capacities and record
//! validation bounds throughout the crate.
//!
//! ## Security Rationale
//!
//! Handles are issued to a caller that the boundary cannot trust to release
//! them; every table is therefore capacity-bounded so a leaking caller
//! exhausts its own handle budget instead of this process's memory.
//!
//! ## Cross-References
//!
//! - [`crate::handle`]: Enforces the table capacities on insert
//! - [`crate::bridge`]: Sizes its client/context/output-stream tables
//! - [`crate::values`]: Uses the reference length bound for validation

// =============================================================================
// Handle Table Capacities
// =============================================================================

/// Maximum number of simultaneously live client handles.
///
/// Each client pins an engine connection. A caller juggling more than this
/// many concurrent engine connections is leaking handles.
pub const MAX_ACTIVE_CLIENTS: usize = 64;

/// Maximum number of simultaneously live cancellation context handles.
///
/// One context per in-flight long-running operation is the expected pattern,
/// so this bounds concurrent pulls/builds/waits per process.
pub const MAX_ACTIVE_CONTEXTS: usize = 1024;

/// Maximum number of simultaneously live output stream handles.
///
/// Streams are registered per build or per attached container; unreleased
/// streams hold their sink alive, so the table is bounded.
pub const MAX_ACTIVE_OUTPUT_STREAMS: usize = 1024;

// =============================================================================
// Record Validation Bounds
// =============================================================================

/// Maximum image reference length in bytes.
///
/// Prevents pathological references from reaching the engine; registry
/// implementations may enforce lower limits.
pub const MAX_IMAGE_REF_LEN: usize = 512;

/// Maximum container name length in bytes.
pub const MAX_CONTAINER_NAME_LEN: usize = 255;
