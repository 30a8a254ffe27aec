//! Target registry - the fixed set of inference models an artifact is fanned out to
//!
//! The registry is data, not code: adding or removing a model only touches
//! [`REFERENCE_TARGETS`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::ContractError;

/// Reference deployment registry: `(short_name, model id)` in dispatch order.
pub const REFERENCE_TARGETS: &[(&str, &str)] = &[
    ("mobilenet", "google/mobilenet_v1_0.75_192"),
    ("resnet", "microsoft/resnet-50"),
    ("mitb0", "nvidia/mit-b0"),
    ("yolos", "hustvl/yolos-tiny"),
];

/// Short target name with cheap cloning.
///
/// Names are fixed at start-up and cloned into every outcome, log field and
/// spawned task, so the string is shared behind an `Arc<str>`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetName(Arc<str>);

impl TargetName {
    /// Create a new TargetName from a string slice.
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for TargetName {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Borrow<str> for TargetName {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TargetName {
    #[inline]
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TargetName {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for TargetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TargetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TargetName({:?})", self.0)
    }
}

impl PartialEq<str> for TargetName {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for TargetName {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl Serialize for TargetName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TargetName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}

/// One named inference model endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Unique short name, used in output keys and result maps
    pub short_name: TargetName,

    /// Opaque model identifier handed to the inference endpoint
    pub endpoint_reference: String,
}

impl Target {
    pub fn new(short_name: impl Into<TargetName>, endpoint_reference: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            endpoint_reference: endpoint_reference.into(),
        }
    }
}

/// Ordered, immutable set of targets
///
/// Iteration order is the dispatch order and the order of the result map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRegistry {
    targets: Arc<[Target]>,
}

impl TargetRegistry {
    /// Build a registry, rejecting empty or duplicate short names.
    ///
    /// # Errors
    /// Returns `ConfigValidation` naming the offending entry.
    pub fn new(targets: Vec<Target>) -> Result<Self, ContractError> {
        let mut seen = HashSet::new();
        for (idx, target) in targets.iter().enumerate() {
            if target.short_name.is_empty() {
                return Err(ContractError::config_validation(
                    format!("targets[{idx}].short_name"),
                    "short name cannot be empty",
                ));
            }
            if target.endpoint_reference.is_empty() {
                return Err(ContractError::config_validation(
                    format!("targets[{}].endpoint_reference", target.short_name),
                    "endpoint reference cannot be empty",
                ));
            }
            if !seen.insert(target.short_name.clone()) {
                return Err(ContractError::config_validation(
                    format!("targets[{}]", target.short_name),
                    "duplicate short name",
                ));
            }
        }

        Ok(Self {
            targets: targets.into(),
        })
    }

    /// The compiled-in registry of the reference deployment
    pub fn reference() -> Self {
        let targets: Vec<Target> = REFERENCE_TARGETS
            .iter()
            .map(|(name, model)| Target::new(*name, *model))
            .collect();
        Self {
            targets: targets.into(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Target> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Look up a target by short name
    pub fn get(&self, short_name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.short_name == short_name)
    }
}

impl Default for TargetRegistry {
    fn default() -> Self {
        Self::reference()
    }
}

impl<'a> IntoIterator for &'a TargetRegistry {
    type Item = &'a Target;
    type IntoIter = std::slice::Iter<'a, Target>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
