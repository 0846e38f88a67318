//! Merging of sequences whose elements are identified by a key (name, id, ...).
use std::{
    collections::{HashMap, HashSet},
    fmt::{self, Display},
};

use snafu::{ResultExt, ensure};

use super::{Override, OverrideElementSnafu, Result, UnknownReferencesSnafu};

/// An element of a sequence that is merged by identity key rather than by position
pub trait Keyed {
    /// Human readable name of the element kind, used in error messages
    const KIND: &'static str;

    fn key(&self) -> &str;
}

/// The keys of one top-level list of an override document that do not match any base element
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownReference {
    pub kind: &'static str,
    pub keys: Vec<String>,
}

impl Display for UnknownReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{kind} elements {keys} do not override any existing element",
            kind = self.kind,
            keys = self.keys.join(", ")
        )
    }
}

/// Returns the keys of `overrides` that have no counterpart in `base`, if there are any
pub fn unknown_references<T, O>(base: &[T], overrides: &[O]) -> Option<UnknownReference>
where
    T: Keyed,
    O: Keyed,
{
    let base_keys = base.iter().map(Keyed::key).collect::<HashSet<_>>();
    let keys = overrides
        .iter()
        .map(Keyed::key)
        .filter(|key| !base_keys.contains(key))
        .map(str::to_owned)
        .collect::<Vec<_>>();

    if keys.is_empty() {
        None
    } else {
        Some(UnknownReference { kind: O::KIND, keys })
    }
}

/// Merges two keyed sequences, following strategic merge patch list semantics.
///
/// 1. Every `base` element keeps its position. If `overrides` has an element with the same key,
///    the override is applied to it.
/// 2. Override elements whose key is not in `base` are new elements. Each is inserted right after
///    the closest preceding override element that matched a base element, or at the head of the
///    sequence if there is none. Consecutive new elements keep their relative order.
///
/// New elements are created by applying the override element to the default element.
pub fn merge_by_key<T, O>(base: &[T], overrides: &[O]) -> Result<Vec<T>>
where
    T: Keyed + Clone + Default,
    O: Keyed + Override<Target = T>,
{
    merge_keyed(base, overrides, |overrides| {
        tracing::trace!(kind = O::KIND, key = overrides.key(), "inserting new element");
        overrides.apply_to(&T::default())
    })
}

/// Like [`merge_by_key`], but `overrides` may only customize elements that already exist in
/// `base`.
///
/// This is the rule for the top-level lists of a document: an override document describes changes
/// to something defined elsewhere, new elements belong in the main document body.
pub fn merge_referenced<T, O>(base: &[T], overrides: &[O]) -> Result<Vec<T>>
where
    T: Keyed + Clone,
    O: Keyed + Override<Target = T>,
{
    let unknown = unknown_references(base, overrides);
    ensure!(
        unknown.is_none(),
        UnknownReferencesSnafu {
            references: Vec::from_iter(unknown),
        }
    );
    merge_keyed(base, overrides, |overrides| {
        UnknownReferencesSnafu {
            references: vec![UnknownReference {
                kind: O::KIND,
                keys: vec![overrides.key().to_owned()],
            }],
        }
        .fail()
    })
}

fn merge_keyed<T, O>(
    base: &[T],
    overrides: &[O],
    mut insert: impl FnMut(&O) -> Result<T>,
) -> Result<Vec<T>>
where
    T: Keyed + Clone,
    O: Keyed + Override<Target = T>,
{
    let overrides_by_key = overrides
        .iter()
        .map(|element| (element.key(), element))
        .collect::<HashMap<_, _>>();

    let mut merged = base
        .iter()
        .map(|element| match overrides_by_key.get(element.key()) {
            Some(overrides) => overrides.apply_to(element).context(OverrideElementSnafu {
                kind: O::KIND,
                key: element.key(),
            }),
            None => Ok(element.clone()),
        })
        .collect::<Result<Vec<_>>>()?;

    let base_keys = base.iter().map(Keyed::key).collect::<HashSet<_>>();
    // Insertion point for new elements, right behind the last matched element seen so far
    let mut cursor = 0;
    for element in overrides {
        if base_keys.contains(element.key()) {
            if let Some(position) = merged.iter().position(|m| m.key() == element.key()) {
                cursor = position + 1;
            }
        } else {
            merged.insert(cursor, insert(element)?);
            cursor += 1;
        }
    }

    Ok(merged)
}
