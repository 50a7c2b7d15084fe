//! # Consent Testkit
//!
//! Testing utilities for the consent coordinator.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a memory host, authority, and coordinator wired together
//! - **Dialog scripts**: a background responder that answers consent dialogs
//!   the way a user would, optionally out of order
//! - **Generators**: proptest strategies for permission names and
//!   check/ask scenarios with their expected outcome
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use consent::GrantStatus;
//! use consent_testkit::fixtures::{DialogScript, Fixture};
//!
//! async fn example() {
//!     let mut fixture = Fixture::new();
//!     fixture.spawn_responder(DialogScript::answer_all(GrantStatus::Granted));
//!     let outcome = fixture.coordinator.request(["CAMERA"]).await.unwrap();
//!     assert!(outcome.is_granted());
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use consent_testkit::generators::RequestScenario;
//!
//! proptest! {
//!     #[test]
//!     fn outcome_matches_expectation(scenario: RequestScenario) {
//!         let expected = scenario.expected_outcome();
//!         // run scenario.names() through a fixture and compare
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{DialogScript, Fixture};
pub use generators::{PermissionScenario, RequestScenario};
