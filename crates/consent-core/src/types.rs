//! Strong type definitions for permission requests.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RequestError, Result};

/// Opaque identifier of a protected resource, e.g. `android.permission.CAMERA`.
///
/// Only equality matters; the coordinator never interprets the contents.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionName(String);

impl PermissionName {
    /// Create a permission name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PermissionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PermissionName({})", self.0)
    }
}

impl fmt::Display for PermissionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PermissionName {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for PermissionName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for PermissionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Current grant state of a single permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantStatus {
    Granted,
    Denied,
}

impl GrantStatus {
    /// Host status code for a granted permission.
    pub const CODE_GRANTED: i32 = 0;
    /// Host status code for a denied permission.
    pub const CODE_DENIED: i32 = -1;
    /// Host status code for a permission denied by an app-op restriction.
    pub const CODE_DENIED_APP_OP: i32 = -2;

    /// Whether this status is [`GrantStatus::Granted`].
    pub fn is_granted(self) -> bool {
        self == GrantStatus::Granted
    }
}

impl TryFrom<i32> for GrantStatus {
    type Error = RequestError;

    fn try_from(code: i32) -> Result<Self> {
        match code {
            Self::CODE_GRANTED => Ok(GrantStatus::Granted),
            Self::CODE_DENIED | Self::CODE_DENIED_APP_OP => Ok(GrantStatus::Denied),
            other => Err(RequestError::UnexpectedStatus(other)),
        }
    }
}

/// Correlation code attached to every asynchronous ask a container issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestCode(pub u32);

impl RequestCode {
    /// The code used by containers unless configured otherwise.
    pub const DEFAULT: Self = Self(11111);
}

impl Default for RequestCode {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for RequestCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A non-empty, duplicate-free, ordered set of permission names.
///
/// Order is the caller's order and is echoed back in outcomes; it has
/// no bearing on correctness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionSet {
    names: Vec<PermissionName>,
}

impl PermissionSet {
    /// Build a set from caller input.
    ///
    /// Fails with [`RequestError::EmptyRequest`] when no names are given.
    /// Repeated names keep their first position.
    pub fn new<I, N>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<PermissionName>,
    {
        let mut seen = HashSet::new();
        let names: Vec<PermissionName> = names
            .into_iter()
            .map(Into::into)
            .filter(|name| seen.insert(name.clone()))
            .collect();
        if names.is_empty() {
            return Err(RequestError::EmptyRequest);
        }
        Ok(Self { names })
    }

    /// Number of names in the set.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false; kept for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether the set contains `name`.
    pub fn contains(&self, name: &PermissionName) -> bool {
        self.names.contains(name)
    }

    /// Iterate names in caller order.
    pub fn iter(&self) -> std::slice::Iter<'_, PermissionName> {
        self.names.iter()
    }

    /// Names as a slice in caller order.
    pub fn as_slice(&self) -> &[PermissionName] {
        &self.names
    }

    /// Consume the set, returning the names in caller order.
    pub fn into_vec(self) -> Vec<PermissionName> {
        self.names
    }
}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = &'a PermissionName;
    type IntoIter = std::slice::Iter<'a, PermissionName>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_set_rejected() {
        let err = PermissionSet::new(Vec::<&str>::new()).unwrap_err();
        assert!(matches!(err, RequestError::EmptyRequest));
    }

    #[test]
    fn test_duplicates_keep_first_position() {
        let set = PermissionSet::new(["B", "A", "B", "C", "A"]).unwrap();
        let names: Vec<&str> = set.iter().map(PermissionName::as_str).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(GrantStatus::try_from(0).unwrap(), GrantStatus::Granted);
        assert_eq!(GrantStatus::try_from(-1).unwrap(), GrantStatus::Denied);
        assert_eq!(GrantStatus::try_from(-2).unwrap(), GrantStatus::Denied);
        assert!(matches!(
            GrantStatus::try_from(7),
            Err(RequestError::UnexpectedStatus(7))
        ));
    }

    #[test]
    fn test_permission_name_serializes_as_string() {
        let json = serde_json::to_string(&PermissionName::from("CAMERA")).unwrap();
        assert_eq!(json, "\"CAMERA\"");
    }

    proptest! {
        #[test]
        fn set_preserves_every_distinct_name(names in prop::collection::vec("[A-Z]{1,4}", 1..16)) {
            let set = PermissionSet::new(names.iter().map(String::as_str)).unwrap();
            let distinct: HashSet<&str> = names.iter().map(String::as_str).collect();
            prop_assert_eq!(set.len(), distinct.len());
            for name in &names {
                prop_assert!(set.contains(&PermissionName::from(name.as_str())));
            }
        }
    }
}
