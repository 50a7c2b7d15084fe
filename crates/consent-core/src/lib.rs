//! # Consent Core
//!
//! Pure primitives for the consent coordinator: permission names, grant
//! statuses, request outcomes, and the error taxonomy shared by every layer.
//!
//! This crate contains no I/O, no runtime, no host bindings. It only describes
//! what a request asks for and what it resolved to.
//!
//! ## Key Types
//!
//! - [`PermissionName`] - Opaque identifier of a protected resource
//! - [`PermissionSet`] - Validated, non-empty, ordered set of names
//! - [`GrantStatus`] - Result of a single grant check
//! - [`PermissionOutcome`] - Final result of a request: granted or classified denial
//! - [`RequestError`] - Usage, cancellation, and correlation failures

pub mod error;
pub mod outcome;
pub mod types;

pub use error::{CancelReason, RequestError, Result};
pub use outcome::{DeniedPermission, Denied, Granted, PermissionOutcome};
pub use types::{GrantStatus, PermissionName, PermissionSet, RequestCode};
