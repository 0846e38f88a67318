//! Combining several resolved templates into one.
//!
//! The layers are, from lowest to highest precedence: the plugins (in the order they are given),
//! the parent and the main document. Top-level lists are unioned by key, where an element of a
//! higher layer replaces the element with the same key of a lower layer in place. Attributes are
//! merged key by key, events are unioned per lifecycle event.
use std::collections::{BTreeSet, HashMap};

use snafu::{ResultExt, Snafu};
use strum::Display;
use tracing::instrument;

use crate::{
    merge::{self, Keyed, merge_map},
    model::{Attributes, Events, PluginOverrides, TemplateSpec, TemplateSpecContent},
    overriding::override_content,
};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Snafu)]
pub enum Error {
    #[snafu(display("{kind} {key:?} is defined differently by {first} and {second}"))]
    LayerCollision {
        kind: &'static str,
        key: String,
        first: String,
        second: String,
    },

    #[snafu(display("the document references a parent, but no parent content was provided"))]
    ParentNotResolved,

    #[snafu(display("failed to apply the parent overrides"))]
    ApplyParentOverrides { source: merge::Error },

    #[snafu(display("failed to apply the overrides of {plugin}"))]
    ApplyPluginOverrides { plugin: String, source: merge::Error },
}

/// The precedence tier of a layer, ordered from lowest to highest
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Display)]
#[strum(serialize_all = "lowercase")]
enum Tier {
    Plugin,
    Parent,
    Main,
}

struct Layer<'a> {
    tier: Tier,
    name: &'a str,
    content: &'a TemplateSpecContent,
}

/// A resolved plugin template, with the customizations the main document applies to it
pub struct Plugin<'a> {
    /// Used to identify the plugin in error messages
    pub name: &'a str,
    pub content: &'a TemplateSpecContent,
    pub overrides: Option<&'a PluginOverrides>,
}

/// Merges a main template with its (already overridden) parent and plugins.
///
/// Plugins are named by their position in error messages, use [`merge_named_layers`] to choose
/// the names.
pub fn merge_layers(
    main: &TemplateSpecContent,
    parent: Option<&TemplateSpecContent>,
    plugins: &[TemplateSpecContent],
) -> Result<TemplateSpecContent> {
    let names = (0..plugins.len())
        .map(|index| format!("plugin #{index}"))
        .collect::<Vec<_>>();
    let plugins = names
        .iter()
        .map(String::as_str)
        .zip(plugins)
        .collect::<Vec<_>>();
    merge_named_layers(main, parent, &plugins)
}

/// Like [`merge_layers`], with a name for every plugin.
///
/// Two plugins that define the same key with different content are a [`Error::LayerCollision`].
/// If the content is equal, the element is kept once.
#[instrument(skip_all, fields(plugins = plugins.len(), parent = parent.is_some()))]
pub fn merge_named_layers(
    main: &TemplateSpecContent,
    parent: Option<&TemplateSpecContent>,
    plugins: &[(&str, &TemplateSpecContent)],
) -> Result<TemplateSpecContent> {
    let layers = plugins
        .iter()
        .map(|(name, content)| Layer {
            tier: Tier::Plugin,
            name,
            content,
        })
        .chain(parent.map(|content| Layer {
            tier: Tier::Parent,
            name: "the parent",
            content,
        }))
        .chain([Layer {
            tier: Tier::Main,
            name: "the main document",
            content: main,
        }])
        .collect::<Vec<_>>();
    tracing::debug!(layers = layers.len(), "merging layers");

    Ok(TemplateSpecContent {
        attributes: layers.iter().fold(Attributes::new(), |merged, layer| {
            merge_map(&merged, &layer.content.attributes)
        }),
        components: union_by_key(&layers, |content| &content.components)?,
        projects: union_by_key(&layers, |content| &content.projects)?,
        starter_projects: union_by_key(&layers, |content| &content.starter_projects)?,
        commands: union_by_key(&layers, |content| &content.commands)?,
        events: union_events(&layers),
    })
}

/// Applies the customizations `spec` makes to its parent and plugins, then merges all of them.
///
/// `parent` must be given if and only if `spec` references a parent. Resolving the reference
/// (fetching and decoding the parent document) is up to the caller.
#[instrument(skip_all)]
pub fn compose(
    spec: &TemplateSpec,
    parent: Option<&TemplateSpecContent>,
    plugins: &[Plugin<'_>],
) -> Result<TemplateSpecContent> {
    let parent = match (&spec.parent, parent) {
        (Some(reference), Some(parent)) => {
            Some(override_content(parent, &reference.overrides).context(ApplyParentOverridesSnafu)?)
        }
        (Some(_), None) => return ParentNotResolvedSnafu.fail(),
        (None, parent) => parent.cloned(),
    };

    let mut resolved = Vec::with_capacity(plugins.len());
    for plugin in plugins {
        let content = match plugin.overrides {
            Some(overrides) => override_content(plugin.content, overrides).context(
                ApplyPluginOverridesSnafu {
                    plugin: plugin.name,
                },
            )?,
            None => plugin.content.clone(),
        };
        resolved.push((plugin.name, content));
    }
    let plugins = resolved
        .iter()
        .map(|(name, content)| (*name, content))
        .collect::<Vec<_>>();

    merge_named_layers(&spec.content, parent.as_ref(), &plugins)
}

fn union_by_key<T>(
    layers: &[Layer<'_>],
    list: impl Fn(&TemplateSpecContent) -> &[T],
) -> Result<Vec<T>>
where
    T: Keyed + Clone + PartialEq,
{
    let mut merged = Vec::<T>::new();
    // Position in `merged` and defining layer, by key
    let mut origins = HashMap::<&str, (usize, &Layer<'_>)>::new();

    for layer in layers {
        for element in list(layer.content) {
            match origins.get(element.key()) {
                None => {
                    origins.insert(element.key(), (merged.len(), layer));
                    merged.push(element.clone());
                }
                Some(&(position, origin)) if origin.tier == layer.tier => {
                    if merged[position] != *element {
                        return LayerCollisionSnafu {
                            kind: T::KIND,
                            key: element.key(),
                            first: origin.name,
                            second: layer.name,
                        }
                        .fail();
                    }
                }
                Some(&(position, origin)) => {
                    tracing::trace!(
                        kind = T::KIND,
                        key = element.key(),
                        replaced = %origin.tier,
                        by = %layer.tier,
                        "replacing element of a lower layer"
                    );
                    merged[position] = element.clone();
                    origins.insert(element.key(), (position, layer));
                }
            }
        }
    }

    Ok(merged)
}

/// Per-event union of the command ids of all layers, sorted
fn union_events(layers: &[Layer<'_>]) -> Option<Events> {
    let events = layers
        .iter()
        .filter_map(|layer| layer.content.events.as_ref())
        .collect::<Vec<_>>();
    if events.is_empty() {
        return None;
    }

    let union = |select: fn(&Events) -> &Vec<String>| {
        events
            .iter()
            .flat_map(|events| select(events))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    };
    Some(Events {
        pre_start: union(|events| &events.pre_start),
        post_start: union(|events| &events.post_start),
        pre_stop: union(|events| &events.pre_stop),
        post_stop: union(|events| &events.post_stop),
    })
}
