//! Resolution of discriminated unions.
//!
//! An override either recurses into the base variant (same kind) or replaces it wholesale
//! (different kind). Payloads are never merged across kinds, since their field sets are unrelated.
use std::fmt::Display;

use snafu::{Snafu, ensure};

use super::{Error, Override, Result};

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum UnionError {
    #[snafu(display("only one variant may be set, but found {}", kinds.join(", ")))]
    MultipleVariants { kinds: Vec<String> },

    #[snafu(display("discriminator is {declared} but the {populated} variant is set"))]
    DiscriminatorMismatch { declared: String, populated: String },

    #[snafu(display("the {kind} variant cannot be overridden here"))]
    UnsupportedVariant { kind: String },

    #[snafu(display("no variant is set"))]
    NoVariant,
}

/// Determines which variant a union override selects.
///
/// `populated` lists every overridable kind along with whether the override sets its payload.
///
/// - Nothing declared and nothing set: `None`, the base union stays as it is.
/// - Exactly one payload set: its kind. A declared discriminator must agree with it.
/// - Only a discriminator declared: the declared kind, with an empty payload.
/// - More than one payload set, or a discriminator that is not overridable: an error.
pub fn active_kind<K>(declared: Option<K>, populated: &[(K, bool)]) -> Result<Option<K>, UnionError>
where
    K: Copy + Eq + Display,
{
    let set = populated
        .iter()
        .filter(|(_, is_set)| *is_set)
        .map(|(kind, _)| *kind)
        .collect::<Vec<_>>();

    ensure!(
        set.len() <= 1,
        MultipleVariantsSnafu {
            kinds: set.iter().map(ToString::to_string).collect::<Vec<_>>(),
        }
    );

    match (declared, set.first().copied()) {
        (None, populated) => Ok(populated),
        (Some(declared), Some(populated)) => {
            ensure!(
                declared == populated,
                DiscriminatorMismatchSnafu {
                    declared: declared.to_string(),
                    populated: populated.to_string(),
                }
            );
            Ok(Some(populated))
        }
        (Some(declared), None) => {
            ensure!(
                populated.iter().any(|(kind, _)| *kind == declared),
                UnsupportedVariantSnafu {
                    kind: declared.to_string(),
                }
            );
            Ok(Some(declared))
        }
    }
}

/// Resolves the payload of the variant selected by [`active_kind`].
///
/// `base` is the current payload if the base union already is of that kind. If it is, the
/// payloads are merged field by field. Otherwise the base variant is discarded and the override
/// payload becomes the new value, with unset fields at their defaults.
pub fn resolve_variant<K, O>(kind: K, base: Option<&O::Target>, overrides: Option<&O>) -> Result<O::Target>
where
    K: Display,
    O: Override,
    O::Target: Default,
{
    match (base, overrides) {
        (Some(base), Some(overrides)) => overrides.apply_to(base),
        (Some(base), None) => Ok(base.clone()),
        (None, overrides) => {
            tracing::debug!(%kind, "replacing union variant");
            match overrides {
                Some(overrides) => overrides.apply_to(&O::Target::default()),
                None => Ok(O::Target::default()),
            }
        }
    }
}

/// Error for a kind that an override type has no payload for
pub fn unsupported_variant<K: Display>(kind: K) -> Error {
    UnionError::UnsupportedVariant {
        kind: kind.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use strum::{Display, EnumDiscriminants};

    use super::*;
    use crate::merge::{self, Override};

    #[derive(Clone, Debug, PartialEq, Eq, EnumDiscriminants)]
    #[strum_discriminants(name(ShapeKind), derive(Display))]
    enum Shape {
        Circle(Circle),
        Square(Square),
    }

    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    struct Circle {
        radius: u32,
        filled: Option<bool>,
    }

    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    struct Square {
        side: u32,
    }

    #[derive(Default, Override)]
    #[merge(target = "Circle", path_overrides(merge = "crate::merge"))]
    struct CircleOverride {
        radius: Option<u32>,
        #[merge(strategy = "optional")]
        filled: Option<bool>,
    }

    #[derive(Default, Override)]
    #[merge(target = "Square", path_overrides(merge = "crate::merge"))]
    struct SquareOverride {
        side: Option<u32>,
    }

    #[derive(Default, Override)]
    #[merge(target = "Shape", kind = "ShapeKind", path_overrides(merge = "crate::merge"))]
    struct ShapeOverride {
        #[merge(discriminator)]
        shape_type: Option<ShapeKind>,
        #[merge(variant = "Circle")]
        circle: Option<CircleOverride>,
        #[merge(variant = "Square")]
        square: Option<SquareOverride>,
    }

    fn circle() -> Shape {
        Shape::Circle(Circle {
            radius: 3,
            filled: Some(true),
        })
    }

    #[test]
    fn nothing_set_keeps_base() {
        assert_eq!(
            merge::merge(&circle(), &ShapeOverride::default()).unwrap(),
            circle()
        );
    }

    #[test]
    fn same_kind_recurses() {
        let merged = merge::merge(
            &circle(),
            &ShapeOverride {
                circle: Some(CircleOverride {
                    radius: Some(5),
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(
            merged,
            Shape::Circle(Circle {
                radius: 5,
                filled: Some(true),
            })
        );
    }

    #[test]
    fn other_kind_replaces_without_leaking_fields() {
        let merged = merge::merge(
            &circle(),
            &ShapeOverride {
                square: Some(SquareOverride { side: Some(2) }),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(merged, Shape::Square(Square { side: 2 }));

        // And back again: the old circle fields are gone for good
        let merged = merge::merge(
            &merged,
            &ShapeOverride {
                circle: Some(CircleOverride::default()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(merged, Shape::Circle(Circle::default()));
    }

    #[test]
    fn discriminator_alone_switches_kind() {
        let merged = merge::merge(
            &circle(),
            &ShapeOverride {
                shape_type: Some(ShapeKind::Square),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(merged, Shape::Square(Square::default()));

        let merged = merge::merge(
            &circle(),
            &ShapeOverride {
                shape_type: Some(ShapeKind::Circle),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(merged, circle());
    }

    #[test]
    fn malformed_overrides_are_rejected() {
        let err = merge::merge(
            &circle(),
            &ShapeOverride {
                circle: Some(CircleOverride::default()),
                square: Some(SquareOverride::default()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidUnion {
                source: UnionError::MultipleVariants {
                    kinds: vec!["Circle".to_string(), "Square".to_string()]
                }
            }
        );

        let err = merge::merge(
            &circle(),
            &ShapeOverride {
                shape_type: Some(ShapeKind::Circle),
                square: Some(SquareOverride::default()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidUnion {
                source: UnionError::DiscriminatorMismatch {
                    declared: "Circle".to_string(),
                    populated: "Square".to_string(),
                }
            }
        );
    }

    #[rstest]
    #[case(None, &[("a", false), ("b", false)], Ok(None))]
    #[case(None, &[("a", false), ("b", true)], Ok(Some("b")))]
    #[case(Some("b"), &[("a", false), ("b", true)], Ok(Some("b")))]
    #[case(Some("a"), &[("a", false), ("b", false)], Ok(Some("a")))]
    #[case(Some("c"), &[("a", false), ("b", false)], Err(UnionError::UnsupportedVariant { kind: "c".to_string() }))]
    #[case(None, &[("a", true), ("b", true)], Err(UnionError::MultipleVariants { kinds: vec!["a".to_string(), "b".to_string()] }))]
    fn active_kind_rules(
        #[case] declared: Option<&'static str>,
        #[case] populated: &[(&'static str, bool)],
        #[case] expected: Result<Option<&'static str>, UnionError>,
    ) {
        assert_eq!(active_kind(declared, populated), expected);
    }
}
