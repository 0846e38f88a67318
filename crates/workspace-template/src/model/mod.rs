//! The workspace template schema.
//!
//! Every content type has an override counterpart (suffixed `Override`) that mirrors it with all
//! non-key fields optional. The top-level override documents are [`ParentOverrides`] and
//! [`PluginOverrides`].
//!
//! Discriminated unions (component kinds, command kinds, project sources, ...) are plain enums in
//! the content tree. On the wire they use one key per variant plus an optional discriminator key,
//! for example:
//!
//! ```yaml
//! id: build
//! commandType: Exec # optional
//! exec:
//!   component: tools
//!   commandLine: make
//! ```
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumDiscriminants};

use crate::merge::{Keyed, UnionError, active_kind};

mod command;
mod component;
mod overrides;
mod project;

pub use command::{
    ApplyCommand, ApplyCommandOverride, Command, CommandGroup, CommandGroupKind,
    CommandGroupOverride, CommandOverride, CommandType, CommandUnion, CommandUnionOverride,
    CompositeCommand, CompositeCommandOverride, ExecCommand, ExecCommandOverride,
};
pub use component::{
    Component, ComponentLocation, ComponentLocationOverride, ComponentOverride, ComponentType,
    ComponentUnion, ComponentUnionOverride, ContainerComponent, ContainerComponentOverride,
    Endpoint, EndpointExposure, EndpointOverride, EndpointProtocol, EnvVar, EnvVarOverride,
    KubernetesComponent, KubernetesComponentOverride, LocationType, VolumeComponent,
    VolumeComponentOverride, VolumeMount, VolumeMountOverride,
};
pub use overrides::{ParentOverrides, PluginOverrides};
pub use project::{
    CheckoutFrom, CheckoutFromOverride, GitProjectSource, GitProjectSourceOverride, Project,
    ProjectOverride, ProjectSource, ProjectSourceOverride, SourceType, StarterProject,
    StarterProjectOverride, ZipProjectSource, ZipProjectSourceOverride,
};

/// Free-form string attributes, ordered by key
pub type Attributes = BTreeMap<String, String>;

/// The resolvable body of a workspace template
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSpecContent {
    /// Map of key-value variables used for string replacement in the template, see
    /// [`crate::substitution`]
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<Project>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub starter_projects: Vec<StarterProject>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<Command>,

    /// Bindings of commands to workspace lifecycle events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Events>,
}

/// Command ids to run at each workspace lifecycle event
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Events {
    /// Apply commands run before the main containers start
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_start: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_start: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_stop: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_stop: Vec<String>,
}

impl Events {
    pub fn is_empty(&self) -> bool {
        self.pre_start.is_empty()
            && self.post_start.is_empty()
            && self.pre_stop.is_empty()
            && self.post_stop.is_empty()
    }
}

/// A workspace template document as written by users: its own content plus an optional parent it
/// inherits from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentReference>,

    #[serde(flatten)]
    pub content: TemplateSpecContent,
}

/// Where to find the parent template, and how to customize it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentReference {
    #[serde(flatten)]
    pub import: ImportReference,

    #[serde(flatten)]
    pub overrides: ParentOverrides,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReference {
    #[serde(flatten)]
    pub source: ImportSource,

    /// Registry to resolve an `id` against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, EnumDiscriminants)]
#[serde(try_from = "ImportSourceRepr", into = "ImportSourceRepr")]
#[strum_discriminants(name(ImportReferenceType), derive(Display, Serialize, Deserialize))]
pub enum ImportSource {
    /// URI of a template document
    Uri(String),

    /// Id of a template in a registry
    Id(String),

    /// A template stored as a Kubernetes custom resource
    Kubernetes(KubernetesReference),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesReference {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportSourceRepr {
    #[serde(default, skip_serializing)]
    import_reference_type: Option<ImportReferenceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kubernetes: Option<KubernetesReference>,
}

impl TryFrom<ImportSourceRepr> for ImportSource {
    type Error = UnionError;

    fn try_from(repr: ImportSourceRepr) -> Result<Self, Self::Error> {
        let kind = active_kind(
            repr.import_reference_type,
            &[
                (ImportReferenceType::Uri, repr.uri.is_some()),
                (ImportReferenceType::Id, repr.id.is_some()),
                (ImportReferenceType::Kubernetes, repr.kubernetes.is_some()),
            ],
        )?;
        Ok(match kind.ok_or(UnionError::NoVariant)? {
            ImportReferenceType::Uri => Self::Uri(repr.uri.unwrap_or_default()),
            ImportReferenceType::Id => Self::Id(repr.id.unwrap_or_default()),
            ImportReferenceType::Kubernetes => {
                Self::Kubernetes(repr.kubernetes.unwrap_or_default())
            }
        })
    }
}

impl From<ImportSource> for ImportSourceRepr {
    fn from(value: ImportSource) -> Self {
        let mut repr = Self::default();
        match value {
            ImportSource::Uri(uri) => repr.uri = Some(uri),
            ImportSource::Id(id) => repr.id = Some(id),
            ImportSource::Kubernetes(kubernetes) => repr.kubernetes = Some(kubernetes),
        }
        repr
    }
}

macro_rules! keyed {
    ($kind:literal by $key:ident: $($ty:ty),+ $(,)?) => {
        $(
            impl Keyed for $ty {
                const KIND: &'static str = $kind;

                fn key(&self) -> &str {
                    &self.$key
                }
            }
        )+
    };
}

keyed!("component" by name: Component, ComponentOverride);
keyed!("command" by id: Command, CommandOverride);
keyed!("project" by name: Project, ProjectOverride);
keyed!("starter project" by name: StarterProject, StarterProjectOverride);
keyed!("endpoint" by name: Endpoint, EndpointOverride);
keyed!("env" by name: EnvVar, EnvVarOverride);
keyed!("volume mount" by name: VolumeMount, VolumeMountOverride);
