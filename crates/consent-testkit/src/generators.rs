//! Proptest generators for property-based testing.

use proptest::prelude::*;

use consent::authority::MemoryAuthority;
use consent::{DeniedPermission, GrantStatus, PermissionName, PermissionOutcome};

use crate::fixtures::DialogScript;

/// Generate a permission name.
pub fn permission_name() -> impl Strategy<Value = PermissionName> {
    "[A-Z][A-Z_]{0,11}".prop_map(PermissionName::from)
}

/// Generate 1..=max distinct permission names.
pub fn permission_names(max: usize) -> impl Strategy<Value = Vec<PermissionName>> {
    prop::collection::hash_set(permission_name(), 1..=max.max(1))
        .prop_map(|names| names.into_iter().collect())
}

/// How one permission behaves during a request.
#[derive(Debug, Clone)]
pub struct PermissionScenario {
    pub name: PermissionName,
    /// Status at the initial check.
    pub initially_granted: bool,
    /// What the user picks in the dialog.
    pub dialog_grants: bool,
    /// The host's rationale flag after a denial.
    pub rationale: bool,
}

/// A full request: distinct permissions with their behaviour.
#[derive(Debug, Clone)]
pub struct RequestScenario {
    pub permissions: Vec<PermissionScenario>,
    /// Whether the dialog answers arrive in reverse order.
    pub reverse_answers: bool,
}

impl Arbitrary for RequestScenario {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            permission_names(6).prop_flat_map(|names| {
                let len = names.len();
                (
                    Just(names),
                    prop::collection::vec((any::<bool>(), any::<bool>(), any::<bool>()), len),
                )
            }),
            any::<bool>(),
        )
            .prop_map(|((names, flags), reverse_answers)| RequestScenario {
                permissions: names
                    .into_iter()
                    .zip(flags)
                    .map(|(name, (initially_granted, dialog_grants, rationale))| {
                        PermissionScenario {
                            name,
                            initially_granted,
                            dialog_grants,
                            rationale,
                        }
                    })
                    .collect(),
                reverse_answers,
            })
            .boxed()
    }
}

impl RequestScenario {
    /// Requested names in order.
    pub fn names(&self) -> Vec<PermissionName> {
        self.permissions.iter().map(|p| p.name.clone()).collect()
    }

    /// Names denied at the initial check, in request order.
    pub fn initially_denied(&self) -> Vec<PermissionName> {
        self.permissions
            .iter()
            .filter(|p| !p.initially_granted)
            .map(|p| p.name.clone())
            .collect()
    }

    /// Load initial statuses and rationale flags into `authority`.
    pub fn install(&self, authority: &MemoryAuthority) {
        for p in &self.permissions {
            let status = if p.initially_granted {
                GrantStatus::Granted
            } else {
                GrantStatus::Denied
            };
            authority.set_status(p.name.clone(), status);
            authority.set_rationale(p.name.clone(), p.rationale);
        }
    }

    /// The dialog answers for this scenario.
    pub fn script(&self) -> DialogScript {
        let mut script = DialogScript::answer_all(GrantStatus::Denied);
        for p in &self.permissions {
            if p.dialog_grants {
                script = script.with(p.name.clone(), GrantStatus::Granted);
            }
        }
        if self.reverse_answers {
            script = script.reversed();
        }
        script
    }

    /// The outcome a correct coordinator must produce.
    pub fn expected_outcome(&self) -> PermissionOutcome {
        let mut granted: Vec<PermissionName> = self
            .permissions
            .iter()
            .filter(|p| p.initially_granted)
            .map(|p| p.name.clone())
            .collect();
        let mut denied = Vec::new();
        for p in self.permissions.iter().filter(|p| !p.initially_granted) {
            if p.dialog_grants {
                granted.push(p.name.clone());
            } else {
                denied.push(DeniedPermission::classify(p.name.clone(), p.rationale));
            }
        }
        if denied.is_empty() {
            PermissionOutcome::granted(granted)
        } else {
            PermissionOutcome::denied(granted, denied)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    proptest! {
        #[test]
        fn names_are_distinct_and_nonempty(names in permission_names(8)) {
            let distinct: HashSet<_> = names.iter().collect();
            prop_assert!(!names.is_empty());
            prop_assert_eq!(distinct.len(), names.len());
        }

        #[test]
        fn expected_outcome_accounts_for_every_name_once(scenario: RequestScenario) {
            let requested = scenario.names();
            let outcome = scenario.expected_outcome();
            let named = outcome.names();
            let distinct: HashSet<&PermissionName> = named.iter().copied().collect();
            prop_assert_eq!(named.len(), requested.len());
            prop_assert_eq!(distinct, requested.iter().collect::<HashSet<_>>());
        }
    }
}
