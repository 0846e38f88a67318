use serde::{Deserialize, Serialize};
use strum::{Display, EnumDiscriminants};

use super::Attributes;
use crate::merge::{Atomic, Override, UnionError, active_kind};

/// A piece of the workspace runtime: a container, a Kubernetes resource, a volume, ...
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Mandatory name that allows referencing the component from other elements (such as
    /// commands) or from an external template that may reference this component through a parent
    /// or a plugin.
    pub name: String,

    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,

    #[serde(flatten)]
    pub union: ComponentUnion,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, EnumDiscriminants)]
#[serde(try_from = "ComponentUnionRepr", into = "ComponentUnionRepr")]
#[strum_discriminants(name(ComponentType), derive(Display, Serialize, Deserialize))]
pub enum ComponentUnion {
    /// Allows adding and configuring workspace-related containers
    Container(ContainerComponent),

    /// Allows importing into the workspace the Kubernetes resources defined in a given manifest
    Kubernetes(KubernetesComponent),

    /// Allows importing into the workspace the OpenShift resources defined in a given manifest
    Openshift(KubernetesComponent),

    /// Allows specifying the definition of a volume shared by several other components
    Volume(VolumeComponent),
}

#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComponentUnionRepr {
    #[serde(default, skip_serializing)]
    component_type: Option<ComponentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    container: Option<ContainerComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kubernetes: Option<KubernetesComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    openshift: Option<KubernetesComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    volume: Option<VolumeComponent>,
}

impl TryFrom<ComponentUnionRepr> for ComponentUnion {
    type Error = UnionError;

    fn try_from(repr: ComponentUnionRepr) -> Result<Self, Self::Error> {
        let kind = active_kind(
            repr.component_type,
            &[
                (ComponentType::Container, repr.container.is_some()),
                (ComponentType::Kubernetes, repr.kubernetes.is_some()),
                (ComponentType::Openshift, repr.openshift.is_some()),
                (ComponentType::Volume, repr.volume.is_some()),
            ],
        )?;
        Ok(match kind.ok_or(UnionError::NoVariant)? {
            ComponentType::Container => Self::Container(repr.container.unwrap_or_default()),
            ComponentType::Kubernetes => Self::Kubernetes(repr.kubernetes.unwrap_or_default()),
            ComponentType::Openshift => Self::Openshift(repr.openshift.unwrap_or_default()),
            ComponentType::Volume => Self::Volume(repr.volume.unwrap_or_default()),
        })
    }
}

impl From<ComponentUnion> for ComponentUnionRepr {
    fn from(value: ComponentUnion) -> Self {
        let mut repr = Self::default();
        match value {
            ComponentUnion::Container(container) => repr.container = Some(container),
            ComponentUnion::Kubernetes(kubernetes) => repr.kubernetes = Some(kubernetes),
            ComponentUnion::Openshift(openshift) => repr.openshift = Some(openshift),
            ComponentUnion::Volume(volume) => repr.volume = Some(volume),
        }
        repr
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerComponent {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,

    /// Environment variables used in this container
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,

    /// List of volumes mounts that should be mounted in this container
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_request: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_limit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_request: Option<String>,

    /// The command to run in the container, overriding the image entrypoint
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,

    /// The arguments to supply to the command running in the container
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Whether the project sources should be mounted into this container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_sources: Option<bool>,

    /// Path where the project sources are mounted, defaults to `/projects`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_mapping: Option<String>,

    /// Whether the container runs in its own separate pod
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dedicated_pod: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<Endpoint>,
}

/// Shared by the `kubernetes` and `openshift` component kinds
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesComponent {
    #[serde(flatten)]
    pub location: ComponentLocation,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<Endpoint>,
}

/// Where the manifest of a Kubernetes-like component comes from
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, EnumDiscriminants)]
#[serde(try_from = "ComponentLocationRepr", into = "ComponentLocationRepr")]
#[strum_discriminants(name(LocationType), derive(Display, Serialize, Deserialize))]
pub enum ComponentLocation {
    /// Location in a file fetched from a URI
    Uri(String),

    /// Inlined manifest
    Inlined(String),
}

impl Default for ComponentLocation {
    fn default() -> Self {
        Self::Uri(String::new())
    }
}

#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComponentLocationRepr {
    #[serde(default, skip_serializing)]
    location_type: Option<LocationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inlined: Option<String>,
}

impl TryFrom<ComponentLocationRepr> for ComponentLocation {
    type Error = UnionError;

    fn try_from(repr: ComponentLocationRepr) -> Result<Self, Self::Error> {
        let kind = active_kind(
            repr.location_type,
            &[
                (LocationType::Uri, repr.uri.is_some()),
                (LocationType::Inlined, repr.inlined.is_some()),
            ],
        )?;
        Ok(match kind.ok_or(UnionError::NoVariant)? {
            LocationType::Uri => Self::Uri(repr.uri.unwrap_or_default()),
            LocationType::Inlined => Self::Inlined(repr.inlined.unwrap_or_default()),
        })
    }
}

impl From<ComponentLocation> for ComponentLocationRepr {
    fn from(value: ComponentLocation) -> Self {
        match value {
            ComponentLocation::Uri(uri) => Self {
                uri: Some(uri),
                ..Self::default()
            },
            ComponentLocation::Inlined(inlined) => Self {
                inlined: Some(inlined),
                ..Self::default()
            },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeComponent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Ephemeral volumes are not stored persistently across restarts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub name: String,

    #[serde(default)]
    pub target_port: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure: Option<EndpointExposure>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<EndpointProtocol>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,

    /// Path of the endpoint URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

/// How an endpoint is exposed on the network
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EndpointExposure {
    /// Exposed on the public network, typically through an ingress or a route
    Public,
    /// Exposed to the cluster network only
    Internal,
    /// Only reachable from inside the workspace pod
    None,
}
impl Atomic for EndpointExposure {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EndpointProtocol {
    Http,
    Https,
    Ws,
    Wss,
    Tcp,
    Udp,
}
impl Atomic for EndpointProtocol {}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvVar {
    pub name: String,

    #[serde(default)]
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    /// Name of an existing volume component
    pub name: String,

    /// Mount path inside the container, defaults to `/<name>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "Component")]
pub struct ComponentOverride {
    #[merge(strategy = "key")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    #[merge(strategy = "map_merge")]
    pub attributes: Attributes,

    #[serde(flatten)]
    #[merge(strategy = "recurse")]
    pub union: ComponentUnionOverride,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "ComponentUnion", kind = "ComponentType")]
pub struct ComponentUnionOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(discriminator)]
    pub component_type: Option<ComponentType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(variant = "Container")]
    pub container: Option<ContainerComponentOverride>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(variant = "Kubernetes")]
    pub kubernetes: Option<KubernetesComponentOverride>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(variant = "Openshift")]
    pub openshift: Option<KubernetesComponentOverride>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(variant = "Volume")]
    pub volume: Option<VolumeComponentOverride>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "ContainerComponent")]
pub struct ContainerComponentOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[merge(strategy = "merge_by_key")]
    pub env: Vec<EnvVarOverride>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[merge(strategy = "merge_by_key")]
    pub volume_mounts: Vec<VolumeMountOverride>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub memory_limit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub memory_request: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub cpu_limit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub cpu_request: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "replace")]
    pub command: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "replace")]
    pub args: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub mount_sources: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub source_mapping: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub dedicated_pod: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[merge(strategy = "merge_by_key")]
    pub endpoints: Vec<EndpointOverride>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "KubernetesComponent")]
pub struct KubernetesComponentOverride {
    #[serde(flatten)]
    #[merge(strategy = "recurse")]
    pub location: ComponentLocationOverride,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[merge(strategy = "merge_by_key")]
    pub endpoints: Vec<EndpointOverride>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "ComponentLocation", kind = "LocationType")]
pub struct ComponentLocationOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(discriminator)]
    pub location_type: Option<LocationType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(variant = "Uri")]
    pub uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(variant = "Inlined")]
    pub inlined: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "VolumeComponent")]
pub struct VolumeComponentOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub size: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub ephemeral: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "Endpoint")]
pub struct EndpointOverride {
    #[merge(strategy = "key")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub exposure: Option<EndpointExposure>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub protocol: Option<EndpointProtocol>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub secure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    #[merge(strategy = "map_merge")]
    pub attributes: Attributes,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "EnvVar")]
pub struct EnvVarOverride {
    #[merge(strategy = "key")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "VolumeMount")]
pub struct VolumeMountOverride {
    #[merge(strategy = "key")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub path: Option<String>,
}
