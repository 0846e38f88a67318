use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumDiscriminants};

use super::Attributes;
use crate::merge::{Override, UnionError, active_kind};

/// A project whose sources are cloned into the workspace
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,

    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,

    /// Path relative to the root of the projects to which this project should be cloned,
    /// defaults to the project name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_path: Option<String>,

    #[serde(flatten)]
    pub source: ProjectSource,
}

/// A project template a user can pick to bootstrap a new project
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarterProject {
    pub name: String,

    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Sub-directory of the source to use as the project root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_dir: Option<String>,

    #[serde(flatten)]
    pub source: ProjectSource,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, EnumDiscriminants)]
#[serde(try_from = "ProjectSourceRepr", into = "ProjectSourceRepr")]
#[strum_discriminants(name(SourceType), derive(Display, Serialize, Deserialize))]
pub enum ProjectSource {
    Git(GitProjectSource),
    Zip(ZipProjectSource),
}

#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectSourceRepr {
    #[serde(default, skip_serializing)]
    source_type: Option<SourceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    git: Option<GitProjectSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    zip: Option<ZipProjectSource>,
}

impl TryFrom<ProjectSourceRepr> for ProjectSource {
    type Error = UnionError;

    fn try_from(repr: ProjectSourceRepr) -> Result<Self, Self::Error> {
        let kind = active_kind(
            repr.source_type,
            &[
                (SourceType::Git, repr.git.is_some()),
                (SourceType::Zip, repr.zip.is_some()),
            ],
        )?;
        Ok(match kind.ok_or(UnionError::NoVariant)? {
            SourceType::Git => Self::Git(repr.git.unwrap_or_default()),
            SourceType::Zip => Self::Zip(repr.zip.unwrap_or_default()),
        })
    }
}

impl From<ProjectSource> for ProjectSourceRepr {
    fn from(value: ProjectSource) -> Self {
        match value {
            ProjectSource::Git(git) => Self {
                git: Some(git),
                ..Self::default()
            },
            ProjectSource::Zip(zip) => Self {
                zip: Some(zip),
                ..Self::default()
            },
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitProjectSource {
    /// The remotes map, by name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub remotes: BTreeMap<String, String>,

    /// Defines from what the project should be checked out. Required if there are more than one
    /// remote configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_from: Option<CheckoutFrom>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutFrom {
    /// The revision to checkout from, either a branch, a tag or a commit id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,

    /// The remote name should be used as init
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipProjectSource {
    /// Zip project's source location address, a URL or a path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "Project")]
pub struct ProjectOverride {
    #[merge(strategy = "key")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    #[merge(strategy = "map_merge")]
    pub attributes: Attributes,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub clone_path: Option<String>,

    #[serde(flatten)]
    #[merge(strategy = "recurse")]
    pub source: ProjectSourceOverride,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "StarterProject")]
pub struct StarterProjectOverride {
    #[merge(strategy = "key")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    #[merge(strategy = "map_merge")]
    pub attributes: Attributes,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub sub_dir: Option<String>,

    #[serde(flatten)]
    #[merge(strategy = "recurse")]
    pub source: ProjectSourceOverride,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "ProjectSource", kind = "SourceType")]
pub struct ProjectSourceOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(discriminator)]
    pub source_type: Option<SourceType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(variant = "Git")]
    pub git: Option<GitProjectSourceOverride>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(variant = "Zip")]
    pub zip: Option<ZipProjectSourceOverride>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "GitProjectSource")]
pub struct GitProjectSourceOverride {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[merge(strategy = "map_merge")]
    pub remotes: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "recurse_optional")]
    pub checkout_from: Option<CheckoutFromOverride>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "CheckoutFrom")]
pub struct CheckoutFromOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub revision: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub remote: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "ZipProjectSource")]
pub struct ZipProjectSourceOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub location: Option<String>,
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::merge::merge;

    #[test]
    fn checkout_revision_is_overridden_in_place() {
        let base: Project = serde_yaml::from_str(indoc! {"
            name: api
            clonePath: src/api
            git:
              remotes:
                origin: https://github.com/example/api.git
              checkoutFrom:
                remote: origin
                revision: main
        "})
        .expect("test YAML is valid");
        let overrides: ProjectOverride = serde_yaml::from_str(indoc! {"
            name: api
            git:
              remotes:
                fork: https://github.com/me/api.git
              checkoutFrom:
                revision: v1.2.0
        "})
        .expect("test YAML is valid");

        let merged = merge(&base, &overrides).unwrap();
        assert_eq!(merged.clone_path.as_deref(), Some("src/api"));
        assert_eq!(
            merged.source,
            ProjectSource::Git(GitProjectSource {
                remotes: BTreeMap::from([
                    (
                        "fork".to_string(),
                        "https://github.com/me/api.git".to_string()
                    ),
                    (
                        "origin".to_string(),
                        "https://github.com/example/api.git".to_string()
                    ),
                ]),
                checkout_from: Some(CheckoutFrom {
                    revision: Some("v1.2.0".to_string()),
                    remote: Some("origin".to_string()),
                }),
            })
        );
    }

    #[test]
    fn starter_project_switches_to_zip() {
        let base: StarterProject = serde_yaml::from_str(indoc! {"
            name: quarkus
            description: A quarkus starter
            git:
              remotes:
                origin: https://github.com/example/quarkus-starter.git
        "})
        .expect("test YAML is valid");
        let overrides = StarterProjectOverride {
            name: "quarkus".to_string(),
            source: ProjectSourceOverride {
                zip: Some(ZipProjectSourceOverride {
                    location: Some("https://example.com/quarkus.zip".to_string()),
                }),
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = merge(&base, &overrides).unwrap();
        assert_eq!(merged.description.as_deref(), Some("A quarkus starter"));
        assert_eq!(
            merged.source,
            ProjectSource::Zip(ZipProjectSource {
                location: Some("https://example.com/quarkus.zip".to_string()),
            })
        );
    }
}
