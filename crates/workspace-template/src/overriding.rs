//! Applying a single override document to a template.
use snafu::{ResultExt, Snafu, ensure};
use tracing::instrument;

use crate::{
    merge::{self, Override, UnknownReference, UnknownReferencesSnafu, unknown_references},
    model::{ParentOverrides, PluginOverrides, TemplateSpecContent},
    yaml,
};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to decode the base document"))]
    DecodeBase { source: yaml::Error },

    #[snafu(display("failed to decode the override document"))]
    DecodeOverrides { source: yaml::Error },

    #[snafu(display("failed to apply overrides"))]
    ApplyOverrides { source: merge::Error },
}

/// A top-level override document
pub trait Overrides: Override<Target = TemplateSpecContent> {
    /// Every element of the document that does not customize an element of `base`, per list
    fn unknown_references(&self, base: &TemplateSpecContent) -> Vec<UnknownReference>;
}

impl Overrides for ParentOverrides {
    fn unknown_references(&self, base: &TemplateSpecContent) -> Vec<UnknownReference> {
        [
            unknown_references(&base.components, &self.components),
            unknown_references(&base.projects, &self.projects),
            unknown_references(&base.starter_projects, &self.starter_projects),
            unknown_references(&base.commands, &self.commands),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl Overrides for PluginOverrides {
    fn unknown_references(&self, base: &TemplateSpecContent) -> Vec<UnknownReference> {
        [
            unknown_references(&base.components, &self.components),
            unknown_references(&base.commands, &self.commands),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Applies an override document to `base` and returns the result.
///
/// All unknown references of the document are reported together, before anything is merged.
#[instrument(skip_all)]
pub fn override_content<O: Overrides>(
    base: &TemplateSpecContent,
    overrides: &O,
) -> merge::Result<TemplateSpecContent> {
    let references = overrides.unknown_references(base);
    ensure!(references.is_empty(), UnknownReferencesSnafu { references });
    overrides.apply_to(base)
}

/// Decodes a base document and a [`ParentOverrides`] document (YAML or JSON), and applies the
/// latter to the former.
pub fn override_content_str(base: &str, overrides: &str) -> Result<TemplateSpecContent> {
    let base = yaml::decode::<TemplateSpecContent>(base).context(DecodeBaseSnafu)?;
    let overrides = yaml::decode::<ParentOverrides>(overrides).context(DecodeOverridesSnafu)?;
    override_content(&base, &overrides).context(ApplyOverridesSnafu)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::model::{CommandOverride, ComponentOverride};

    fn base() -> TemplateSpecContent {
        yaml::decode(indoc! {"
            components:
              - name: tools
                container:
                  image: busybox
            commands:
              - id: build
                exec:
                  component: tools
                  commandLine: make
        "})
        .expect("test YAML is valid")
    }

    #[test]
    fn empty_overrides_are_identity() {
        assert_eq!(
            override_content(&base(), &ParentOverrides::default()).unwrap(),
            base()
        );
        assert_eq!(
            override_content(&base(), &PluginOverrides::default()).unwrap(),
            base()
        );
    }

    #[test]
    fn unknown_references_are_aggregated_across_lists() {
        let overrides = ParentOverrides {
            components: vec![ComponentOverride {
                name: "nope".to_string(),
                ..Default::default()
            }],
            commands: vec![
                CommandOverride {
                    id: "build".to_string(),
                    ..Default::default()
                },
                CommandOverride {
                    id: "missing".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let err = override_content(&base(), &overrides).unwrap_err();
        assert_eq!(
            err,
            merge::Error::UnknownReferences {
                references: vec![
                    UnknownReference {
                        kind: "component",
                        keys: vec!["nope".to_string()],
                    },
                    UnknownReference {
                        kind: "command",
                        keys: vec!["missing".to_string()],
                    },
                ]
            }
        );
        assert_eq!(
            err.to_string(),
            indoc! {"
                some overrides do not match any existing element and should be defined in the main body instead:
                component elements nope do not override any existing element
                command elements missing do not override any existing element"}
        );
    }

    #[test]
    fn decode_errors_pass_through() {
        let err = override_content_str("components: 3", "").unwrap_err();
        assert!(matches!(err, Error::DecodeBase { .. }), "{err:?}");

        let err = override_content_str("{}", "commands: [{exec: {}}]").unwrap_err();
        assert!(matches!(err, Error::DecodeOverrides { .. }), "{err:?}");
    }

    #[test]
    fn override_from_strings() {
        let merged = override_content_str(
            indoc! {"
                attributes:
                  version: main
            "},
            r#"{"attributes": {"version": "patch"}}"#,
        )
        .unwrap();
        assert_eq!(merged.attributes["version"], "patch");
    }
}
