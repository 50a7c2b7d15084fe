//! # Consent Request
//!
//! The request state machine owned by an attached container.
//!
//! ## Overview
//!
//! A [`PermissionContainer`] runs one request at a time through a two-phase
//! protocol:
//!
//! 1. **Check**: every requested permission is checked synchronously. If all
//!    are granted the request finishes without showing anything.
//! 2. **Ask**: the denied ones are recorded as the container's single
//!    [`RequestState`] and handed to the host's consent dialog. The caller
//!    suspends until the host's callback resolves that state.
//!
//! Names still denied after the ask are classified as needing a rationale or
//! permanently denied. There is no third round.
//!
//! ## Lifecycle
//!
//! ```text
//! Attached ──on_ready──> Ready ──on_destroy──> Destroyed
//!     └──────────────on_destroy──────────────────┘
//! ```
//!
//! - `on_resume` re-issues a pending ask: the host may dismiss the dialog
//!   when it goes to background.
//! - `on_destroy` cancels a pending request with
//!   [`consent_core::CancelReason::Destroyed`].
//!
//! ## Request States
//!
//! ```text
//! Idle ─> Checking ─┬─> Granted-Immediate
//!                   └─> Asking ─┬─> Completed
//!                               └─> Cancelled
//! ```

pub mod container;
pub mod state;

pub use container::{ContainerConfig, ContainerPhase, PermissionContainer};
pub use state::RequestState;
