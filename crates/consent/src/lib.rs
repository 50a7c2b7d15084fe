//! # Consent
//!
//! The unified API for coordinating runtime permission requests against a
//! host whose UI container can be destroyed and recreated at any time.
//!
//! ## Overview
//!
//! The host's permission API is asynchronous, callback-based, and only legal
//! while its container is in the right lifecycle phase. Consent turns that
//! into one awaitable call with one of three results:
//!
//! - **Granted**: every requested permission is granted
//! - **Denied**: at least one was denied, each classified as needing a
//!   rationale or permanently denied
//! - **Cancelled**: the environment tore the container down mid-request
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use consent::authority::MemoryAuthority;
//! use consent::host::memory::MemoryHost;
//! use consent::{Coordinator, CoordinatorConfig};
//!
//! async fn example() {
//!     let host = Arc::new(MemoryHost::new(Arc::new(MemoryAuthority::new())));
//!     let coordinator = Coordinator::new(host, CoordinatorConfig::default());
//!
//!     let outcome = coordinator.request(["CAMERA"]).await.unwrap();
//!     outcome
//!         .on_granted(|granted| println!("granted: {:?}", granted.permissions))
//!         .on_denied(|denied| println!("denied: {:?}", denied.all_denied()));
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `consent::core` - Names, outcomes, request errors
//! - `consent::authority` - Permission authority abstraction
//! - `consent::request` - The per-container request state machine

pub mod coordinator;
pub mod error;
pub mod host;

// Re-export component crates
pub use consent_authority as authority;
pub use consent_core as core;
pub use consent_request as request;

// Re-export main types for convenience
pub use coordinator::{Coordinator, CoordinatorConfig, DEFAULT_CONTAINER_TAG};
pub use error::{CoordinatorError, Result};
pub use host::{Host, HostContainer};

// Re-export commonly used core types
pub use consent_core::{
    CancelReason, DeniedPermission, Denied, GrantStatus, Granted, PermissionName,
    PermissionOutcome, RequestCode,
};
