//! Replacement of `{{key}}` attribute references with the values of the template's top-level
//! attributes.
//!
//! This is done on a fully merged template, after all layers and overrides have been applied, so
//! that every layer can reference attributes defined by any other layer.
use std::sync::LazyLock;

use regex::{Captures, Regex};
use snafu::{Snafu, ensure};
use tracing::instrument;

use crate::model::{
    Attributes, CommandUnion, ComponentUnion, Endpoint, EnvVar, TemplateSpecContent,
};

static ATTRIBUTE_REFERENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{(.*?)\}\}").expect("failed to compile attribute reference regex")
});

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum Error {
    #[snafu(display("{location} references undefined attributes: {}", keys.join(", ")))]
    UnknownAttribute { location: String, keys: Vec<String> },
}

/// Returns a copy of `content` with all attribute references replaced.
///
/// References are resolved in:
///
/// - exec commands: `commandLine`, `workingDir`, `label` and the values of `env`
/// - apply and composite commands: `label`
/// - container components: the values of `env`
/// - container, kubernetes and openshift components: the `path` of every endpoint
#[instrument(skip_all)]
pub fn substitute_attributes(content: &TemplateSpecContent) -> Result<TemplateSpecContent> {
    let attributes = &content.attributes;
    let mut resolved = content.clone();

    for command in &mut resolved.commands {
        let id = &command.id;
        match &mut command.union {
            CommandUnion::Exec(exec) => {
                substitute(&mut exec.command_line, attributes, || {
                    format!("command {id:?} commandLine")
                })?;
                substitute_optional(&mut exec.working_dir, attributes, || {
                    format!("command {id:?} workingDir")
                })?;
                substitute_optional(&mut exec.label, attributes, || {
                    format!("command {id:?} label")
                })?;
                substitute_env(&mut exec.env, attributes, &format!("command {id:?}"))?;
            }
            CommandUnion::Apply(apply) => {
                substitute_optional(&mut apply.label, attributes, || {
                    format!("command {id:?} label")
                })?;
            }
            CommandUnion::Composite(composite) => {
                substitute_optional(&mut composite.label, attributes, || {
                    format!("command {id:?} label")
                })?;
            }
        }
    }

    for component in &mut resolved.components {
        let location = format!("component {:?}", component.name);
        match &mut component.union {
            ComponentUnion::Container(container) => {
                substitute_env(&mut container.env, attributes, &location)?;
                substitute_endpoints(&mut container.endpoints, attributes, &location)?;
            }
            ComponentUnion::Kubernetes(kubernetes) | ComponentUnion::Openshift(kubernetes) => {
                substitute_endpoints(&mut kubernetes.endpoints, attributes, &location)?;
            }
            ComponentUnion::Volume(_) => {}
        }
    }

    Ok(resolved)
}

fn substitute_env(env: &mut [EnvVar], attributes: &Attributes, location: &str) -> Result<()> {
    for var in env {
        let name = &var.name;
        substitute(&mut var.value, attributes, || {
            format!("{location} env {name:?}")
        })?;
    }
    Ok(())
}

fn substitute_endpoints(
    endpoints: &mut [Endpoint],
    attributes: &Attributes,
    location: &str,
) -> Result<()> {
    for endpoint in endpoints {
        let name = &endpoint.name;
        substitute_optional(&mut endpoint.path, attributes, || {
            format!("{location} endpoint {name:?} path")
        })?;
    }
    Ok(())
}

fn substitute_optional(
    value: &mut Option<String>,
    attributes: &Attributes,
    location: impl FnOnce() -> String,
) -> Result<()> {
    match value {
        Some(value) => substitute(value, attributes, location),
        None => Ok(()),
    }
}

/// Replaces every reference in `value`, or reports all the keys that are not defined
fn substitute(
    value: &mut String,
    attributes: &Attributes,
    location: impl FnOnce() -> String,
) -> Result<()> {
    let mut unknown = Vec::<String>::new();
    let replaced = ATTRIBUTE_REFERENCE_REGEX.replace_all(value, |captures: &Captures<'_>| {
        let key = &captures[1];
        if let Some(attribute) = attributes.get(key) {
            attribute.clone()
        } else {
            if !unknown.iter().any(|known| known == key) {
                unknown.push(key.to_owned());
            }
            String::new()
        }
    });

    ensure!(
        unknown.is_empty(),
        UnknownAttributeSnafu {
            location: location(),
            keys: unknown,
        }
    );
    *value = replaced.into_owned();
    Ok(())
}
