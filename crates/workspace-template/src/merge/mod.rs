//! The override engine.
//!
//! An override type describes modifications to a content type. [`Override::apply_to`] folds it
//! into a base value and returns a new value, leaving both inputs untouched.
//!
//! Most users will derive [`Override`] and declare, per field, how the override value relates to
//! the base value:
//!
//! | `#[merge(strategy = ...)]` | override field       | content field   | behaviour                                       |
//! |----------------------------|----------------------|-----------------|-------------------------------------------------|
//! | `key`                      | `K`                  | `K`             | identity key, copied as-is                      |
//! | `scalar` (default)         | `Option<T>`          | `T`             | [`resolve_scalar`]: presence wins               |
//! | `optional`                 | `Option<T>`          | `Option<T>`     | [`resolve_optional`]: presence wins             |
//! | `replace`                  | `Option<Vec<T>>`     | `Vec<T>`        | [`replace_sequence`]: whole list replaced       |
//! | `map_merge`                | `BTreeMap<K, V>`     | `BTreeMap<K, V>`| [`merge_map`]: key-wise union, override wins    |
//! | `merge_by_key`             | `Vec<P>`             | `Vec<T>`        | [`merge_by_key`]: keyed merge, inserts allowed  |
//! | `merge_referenced`         | `Vec<P>`             | `Vec<T>`        | [`merge_referenced`]: keyed merge, no inserts   |
//! | `recurse`                  | `P`                  | `T`             | [`Override::apply_to`]                          |
//! | `recurse_optional`         | `Option<P>`          | `Option<T>`     | [`recurse_optional`]                            |
//!
//! Content fields that have no counterpart in the override type are not overridable and are
//! carried over from the base unchanged.
//!
//! Discriminated unions are content enums. Their override type is a struct holding an optional
//! discriminator (`#[merge(discriminator)]`) and one optional payload per variant
//! (`#[merge(variant = "...")]`), and is derived with `#[merge(target = "...", kind = "...")]`
//! where `kind` is the fieldless mirror of the content enum. See [`active_kind`] and
//! [`resolve_variant`] for the rules.
//!
//! # Example
//!
//! ```
//! use workspace_template::merge::{Override, merge};
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct Volume {
//!     size: String,
//!     ephemeral: Option<bool>,
//! }
//!
//! #[derive(Override)]
//! #[merge(target = "Volume")]
//! struct VolumeOverride {
//!     size: Option<String>,
//!     #[merge(strategy = "optional")]
//!     ephemeral: Option<bool>,
//! }
//!
//! let base = Volume { size: "1Gi".to_string(), ephemeral: Some(true) };
//! let result = merge(&base, &VolumeOverride { size: None, ephemeral: Some(false) }).unwrap();
//! assert_eq!(result, Volume {
//!     size: "1Gi".to_string(), // Not mentioned, kept
//!     ephemeral: Some(false),  // Explicitly set back to the zero value
//! });
//! ```
use std::collections::BTreeMap;

use snafu::Snafu;

mod keyed;
mod union;

pub use keyed::{Keyed, UnknownReference, merge_by_key, merge_referenced, unknown_references};
pub use union::{UnionError, active_kind, resolve_variant, unsupported_variant};
pub use workspace_template_derive::Override;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display(
        "some overrides do not match any existing element and should be defined in the main body instead:\n{}",
        format_references(references)
    ))]
    UnknownReferences { references: Vec<UnknownReference> },

    #[snafu(display("invalid union override"), context(false))]
    InvalidUnion { source: UnionError },

    #[snafu(display("failed to override {kind} {key:?}"))]
    OverrideElement {
        kind: &'static str,
        key: String,
        #[snafu(source(from(Error, Box::new)))]
        source: Box<Error>,
    },
}

fn format_references(references: &[UnknownReference]) -> String {
    references
        .iter()
        .map(UnknownReference::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// A type that describes modifications to a [`Self::Target`].
///
/// This will typically be derived using [the associated derive macro](`derive@Override`), rather
/// than implemented manually.
pub trait Override {
    /// The content type that this override applies to
    type Target: Clone;

    /// Produces a new value from `base` with the modifications described by `self` applied
    fn apply_to(&self, base: &Self::Target) -> Result<Self::Target>;
}

/// Leaf values are overridden atomically: the override value replaces the base value
impl Override for String {
    type Target = Self;

    fn apply_to(&self, _base: &Self::Target) -> Result<Self::Target> {
        Ok(self.clone())
    }
}

/// Free-function version of [`Override::apply_to`], to produce slightly nicer test code
pub fn merge<O: Override>(base: &O::Target, overrides: &O) -> Result<O::Target> {
    overrides.apply_to(base)
}

/// A marker trait for types that are resolved atomically (as one single value) rather than
/// trying to merge each field individually
pub trait Atomic: Clone {}
impl Atomic for u16 {}
impl Atomic for u32 {}
impl Atomic for i32 {}
impl Atomic for i64 {}
impl Atomic for bool {}
impl Atomic for String {}

/// Resolves a field that always has a value in the content tree.
///
/// A present override wins, even if it is the zero value of `T` (`false`, `""`, ...).
pub fn resolve_scalar<T: Atomic>(base: &T, overrides: Option<&T>) -> T {
    overrides.unwrap_or(base).clone()
}

/// Resolves a field that is optional in the content tree.
///
/// There is no way to unset a value that the base defines, only to replace it.
pub fn resolve_optional<T: Atomic>(base: &Option<T>, overrides: Option<&T>) -> Option<T> {
    overrides.or(base.as_ref()).cloned()
}

/// Resolves a sequence with the `replace` strategy: a present override replaces the whole base
/// sequence, element order and all.
pub fn replace_sequence<T: Clone>(base: &[T], overrides: Option<&[T]>) -> Vec<T> {
    overrides.unwrap_or(base).to_vec()
}

/// Shallow key-wise union of two maps, where `overrides` wins for keys present in both
pub fn merge_map<K: Ord + Clone, V: Clone>(
    base: &BTreeMap<K, V>,
    overrides: &BTreeMap<K, V>,
) -> BTreeMap<K, V> {
    let mut merged = base.clone();
    merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Recurses into an optional nested object.
///
/// An override for an object that the base does not define yet is applied to the default value
/// of the object.
pub fn recurse_optional<O>(base: &Option<O::Target>, overrides: Option<&O>) -> Result<Option<O::Target>>
where
    O: Override,
    O::Target: Default,
{
    match (base, overrides) {
        (base, None) => Ok(base.clone()),
        (Some(base), Some(overrides)) => overrides.apply_to(base).map(Some),
        (None, Some(overrides)) => overrides.apply_to(&O::Target::default()).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rstest::rstest;

    use super::*;

    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    struct Container {
        image: String,
        mount_sources: Option<bool>,
        args: Vec<String>,
        labels: BTreeMap<String, String>,
        limits: Option<Limits>,
        // Not overridable
        dedicated_pod: bool,
    }

    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    struct Limits {
        memory: String,
        cpu: String,
    }

    #[derive(Override, Default)]
    #[merge(target = "Container", path_overrides(merge = "crate::merge"))]
    struct ContainerOverride {
        image: Option<String>,
        #[merge(strategy = "optional")]
        mount_sources: Option<bool>,
        #[merge(strategy = "replace")]
        args: Option<Vec<String>>,
        #[merge(strategy = "map_merge")]
        labels: BTreeMap<String, String>,
        #[merge(strategy = "recurse_optional")]
        limits: Option<LimitsOverride>,
    }

    #[derive(Override, Default)]
    #[merge(target = "Limits", path_overrides(merge = "crate::merge"))]
    struct LimitsOverride {
        memory: Option<String>,
        cpu: Option<String>,
    }

    fn base_container() -> Container {
        Container {
            image: "quay.io/devfile/universal-developer-image".to_string(),
            mount_sources: Some(true),
            args: vec!["--verbose".to_string(), "--port=3000".to_string()],
            labels: BTreeMap::from([
                ("team".to_string(), "tools".to_string()),
                ("tier".to_string(), "dev".to_string()),
            ]),
            limits: Some(Limits {
                memory: "512Mi".to_string(),
                cpu: "500m".to_string(),
            }),
            dedicated_pod: true,
        }
    }

    #[test]
    fn empty_override_is_identity() {
        let base = base_container();
        assert_eq!(merge(&base, &ContainerOverride::default()).unwrap(), base);
    }

    #[test]
    fn scalar_zero_value_is_applied() {
        let base = base_container();
        let merged = merge(
            &base,
            &ContainerOverride {
                image: Some(String::new()),
                mount_sources: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(merged.image, "");
        assert_eq!(merged.mount_sources, Some(false));
        assert_eq!(merged.args, base.args);
    }

    #[test]
    fn replace_sequence_replaces_wholesale() {
        let merged = merge(
            &base_container(),
            &ContainerOverride {
                args: Some(vec!["--quiet".to_string()]),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(merged.args, vec!["--quiet".to_string()]);

        let merged = merge(
            &base_container(),
            &ContainerOverride {
                args: Some(Vec::new()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(merged.args.is_empty());
    }

    #[test]
    fn map_merge_keeps_unmentioned_keys() {
        let merged = merge(
            &base_container(),
            &ContainerOverride {
                labels: BTreeMap::from([
                    ("tier".to_string(), "prod".to_string()),
                    ("owner".to_string(), "jane".to_string()),
                ]),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(
            merged.labels,
            BTreeMap::from([
                ("owner".to_string(), "jane".to_string()),
                ("team".to_string(), "tools".to_string()),
                ("tier".to_string(), "prod".to_string()),
            ])
        );
    }

    #[test]
    fn recurse_optional_into_existing_and_missing_objects() {
        let overrides = ContainerOverride {
            limits: Some(LimitsOverride {
                memory: Some("1Gi".to_string()),
                cpu: None,
            }),
            ..Default::default()
        };

        let merged = merge(&base_container(), &overrides).unwrap();
        assert_eq!(
            merged.limits,
            Some(Limits {
                memory: "1Gi".to_string(),
                cpu: "500m".to_string(),
            })
        );

        let merged = merge(&Container::default(), &overrides).unwrap();
        assert_eq!(
            merged.limits,
            Some(Limits {
                memory: "1Gi".to_string(),
                cpu: String::new(),
            })
        );
    }

    #[test]
    fn fields_without_override_are_carried_over() {
        let merged = merge(
            &base_container(),
            &ContainerOverride {
                image: Some("alpine".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(merged.dedicated_pod);
    }

    #[rstest]
    #[case(Some(1), None, Some(1))]
    #[case(Some(1), Some(2), Some(2))]
    #[case(None, Some(0), Some(0))]
    #[case(None, None, None)]
    fn optional_presence(
        #[case] base: Option<i32>,
        #[case] overrides: Option<i32>,
        #[case] expected: Option<i32>,
    ) {
        assert_eq!(resolve_optional(&base, overrides.as_ref()), expected);
    }

    #[rstest]
    #[case(true, None, true)]
    #[case(true, Some(false), false)]
    #[case(false, Some(true), true)]
    fn scalar_presence(#[case] base: bool, #[case] overrides: Option<bool>, #[case] expected: bool) {
        assert_eq!(resolve_scalar(&base, overrides.as_ref()), expected);
    }
}
