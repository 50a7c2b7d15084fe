//! Request outcomes.
//!
//! An outcome always names exactly the permissions that were requested:
//! either every one of them is in [`Granted`], or at least one of them is
//! in [`Denied`] together with its classification.

use serde::{Deserialize, Serialize};

use crate::types::PermissionName;

/// A permission that stayed denied after the consent dialog.
///
/// The classification is taken once, at the moment of final denial.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeniedPermission {
    /// The user declined, but the host suggests explaining why it is needed.
    NeedsRationale(PermissionName),
    /// The user declined and the host will not show the dialog again.
    DeniedPermanently(PermissionName),
}

impl DeniedPermission {
    /// Classify a denied permission from the host's rationale flag.
    pub fn classify(name: PermissionName, needs_rationale: bool) -> Self {
        if needs_rationale {
            DeniedPermission::NeedsRationale(name)
        } else {
            DeniedPermission::DeniedPermanently(name)
        }
    }

    /// The denied permission's name.
    pub fn name(&self) -> &PermissionName {
        match self {
            DeniedPermission::NeedsRationale(name) | DeniedPermission::DeniedPermanently(name) => {
                name
            }
        }
    }

    pub fn needs_rationale(&self) -> bool {
        matches!(self, DeniedPermission::NeedsRationale(_))
    }
}

/// Every requested permission ended up granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Granted {
    pub permissions: Vec<PermissionName>,
}

/// At least one requested permission was never granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denied {
    /// Requested permissions that did end up granted.
    pub granted: Vec<PermissionName>,
    /// Requested permissions that stayed denied.
    pub permissions: Vec<DeniedPermission>,
}

impl Denied {
    /// Whether any denied permission needs a rationale.
    pub fn is_rationale(&self) -> bool {
        self.permissions.iter().any(DeniedPermission::needs_rationale)
    }

    /// Whether any denied permission is permanently denied.
    pub fn is_permanently_denied(&self) -> bool {
        self.permissions.iter().any(|p| !p.needs_rationale())
    }

    /// Names denied with a rationale suggestion.
    pub fn denied_rationale(&self) -> Vec<&PermissionName> {
        self.permissions
            .iter()
            .filter(|p| p.needs_rationale())
            .map(DeniedPermission::name)
            .collect()
    }

    /// Names denied permanently.
    pub fn denied_permanently(&self) -> Vec<&PermissionName> {
        self.permissions
            .iter()
            .filter(|p| !p.needs_rationale())
            .map(DeniedPermission::name)
            .collect()
    }

    /// All denied names, in classification order.
    pub fn all_denied(&self) -> Vec<&PermissionName> {
        self.permissions.iter().map(DeniedPermission::name).collect()
    }
}

/// Final result of a permission request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionOutcome {
    Granted(Granted),
    Denied(Denied),
}

impl PermissionOutcome {
    /// Build a granted outcome.
    pub fn granted(permissions: Vec<PermissionName>) -> Self {
        PermissionOutcome::Granted(Granted { permissions })
    }

    /// Build a denied outcome.
    pub fn denied(granted: Vec<PermissionName>, permissions: Vec<DeniedPermission>) -> Self {
        PermissionOutcome::Denied(Denied {
            granted,
            permissions,
        })
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionOutcome::Granted(_))
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, PermissionOutcome::Denied(_))
    }

    /// Every name this outcome accounts for, granted first.
    pub fn names(&self) -> Vec<&PermissionName> {
        match self {
            PermissionOutcome::Granted(granted) => granted.permissions.iter().collect(),
            PermissionOutcome::Denied(denied) => denied
                .granted
                .iter()
                .chain(denied.permissions.iter().map(DeniedPermission::name))
                .collect(),
        }
    }

    /// Run `body` if every permission was granted.
    pub fn on_granted(self, body: impl FnOnce(&Granted)) -> Self {
        if let PermissionOutcome::Granted(granted) = &self {
            body(granted);
        }
        self
    }

    /// Run `body` if at least one permission was denied.
    pub fn on_denied(self, body: impl FnOnce(&Denied)) -> Self {
        if let PermissionOutcome::Denied(denied) = &self {
            body(denied);
        }
        self
    }
}
