//! # Consent Authority
//!
//! The host's permission primitives, abstracted behind a trait.
//!
//! ## Overview
//!
//! A [`PermissionAuthority`] answers three questions for the coordinator:
//!
//! - Is this permission granted right now?
//! - Should the caller explain why it is needed before asking again?
//! - Please show the consent dialog for these permissions.
//!
//! The last one is fire-and-forget. The host delivers the answer later,
//! through the container that issued the ask, tagged with the container's
//! [`consent_core::RequestCode`].
//!
//! [`MemoryAuthority`] keeps grant state in memory and records every ask,
//! for tests and for embedding the coordinator without a real host.

pub mod authority;
pub mod memory;

pub use authority::PermissionAuthority;
pub use memory::{AskEvent, MemoryAuthority};
