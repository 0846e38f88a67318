use serde::{Deserialize, Serialize};

use super::{
    Attributes, CommandOverride, ComponentOverride, ProjectOverride, StarterProjectOverride,
    TemplateSpecContent,
};
use crate::merge::Override;

/// Customizations of a parent template, written inline in the `parent` section of the child.
///
/// Top-level elements may only override elements the parent already defines. New elements belong
/// in the body of the child document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "TemplateSpecContent")]
pub struct ParentOverrides {
    /// Overrides of the parent's attributes, keys the parent does not define are added
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    #[merge(strategy = "map_merge")]
    pub attributes: Attributes,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[merge(strategy = "merge_referenced")]
    pub components: Vec<ComponentOverride>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[merge(strategy = "merge_referenced")]
    pub projects: Vec<ProjectOverride>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[merge(strategy = "merge_referenced")]
    pub starter_projects: Vec<StarterProjectOverride>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[merge(strategy = "merge_referenced")]
    pub commands: Vec<CommandOverride>,
}

/// Customizations of a plugin template.
///
/// Plugins contribute tooling, not sources, so there is nothing to say about projects here.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "TemplateSpecContent")]
pub struct PluginOverrides {
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    #[merge(strategy = "map_merge")]
    pub attributes: Attributes,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[merge(strategy = "merge_referenced")]
    pub components: Vec<ComponentOverride>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[merge(strategy = "merge_referenced")]
    pub commands: Vec<CommandOverride>,
}
