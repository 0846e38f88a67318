use serde::{Deserialize, Serialize};
use strum::{Display, EnumDiscriminants};

use super::{Attributes, EnvVar, EnvVarOverride};
use crate::merge::{Atomic, Override, UnionError, active_kind};

/// Predefined, ready-to-use, workspace-related command
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    /// Identifier that allows referencing this command in composite commands, from a parent, or
    /// in events.
    pub id: String,

    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,

    #[serde(flatten)]
    pub union: CommandUnion,
}

/// The kind of a [`Command`], exactly one of them is active.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, EnumDiscriminants)]
#[serde(try_from = "CommandUnionRepr", into = "CommandUnionRepr")]
#[strum_discriminants(name(CommandType), derive(Display, Serialize, Deserialize))]
pub enum CommandUnion {
    /// CLI command executed in an existing component container
    Exec(ExecCommand),

    /// Applies a given component definition, typically bound to a workspace event
    Apply(ApplyCommand),

    /// Executes several sub-commands either sequentially or concurrently
    Composite(CompositeCommand),
}

/// Wire shape of [`CommandUnion`]: an optional discriminator plus one key per variant
#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommandUnionRepr {
    #[serde(default, skip_serializing)]
    command_type: Option<CommandType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exec: Option<ExecCommand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    apply: Option<ApplyCommand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    composite: Option<CompositeCommand>,
}

impl TryFrom<CommandUnionRepr> for CommandUnion {
    type Error = UnionError;

    fn try_from(repr: CommandUnionRepr) -> Result<Self, Self::Error> {
        let kind = active_kind(
            repr.command_type,
            &[
                (CommandType::Exec, repr.exec.is_some()),
                (CommandType::Apply, repr.apply.is_some()),
                (CommandType::Composite, repr.composite.is_some()),
            ],
        )?;
        Ok(match kind.ok_or(UnionError::NoVariant)? {
            CommandType::Exec => Self::Exec(repr.exec.unwrap_or_default()),
            CommandType::Apply => Self::Apply(repr.apply.unwrap_or_default()),
            CommandType::Composite => Self::Composite(repr.composite.unwrap_or_default()),
        })
    }
}

impl From<CommandUnion> for CommandUnionRepr {
    fn from(value: CommandUnion) -> Self {
        let mut repr = Self::default();
        match value {
            CommandUnion::Exec(exec) => repr.exec = Some(exec),
            CommandUnion::Apply(apply) => repr.apply = Some(apply),
            CommandUnion::Composite(composite) => repr.composite = Some(composite),
        }
        repr
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecCommand {
    /// Label for this command, to be used in editor UI menus for example
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<CommandGroup>,

    /// The actual command-line string
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command_line: String,

    /// The component to which the command relates
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub component: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,

    /// Environment variables that have to be set before running the command
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,

    /// Whether the command handles source changes on its own rather than being restarted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hot_reload_capable: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<CommandGroup>,

    /// The component that will be applied
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub component: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<CommandGroup>,

    /// Ids of the commands that comprise this composite command
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,

    /// Whether the sub-commands are executed concurrently
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandGroup {
    pub kind: CommandGroupKind,

    /// Identifies the default command for a given group kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CommandGroupKind {
    #[default]
    Build,
    Run,
    Test,
    Debug,
}
impl Atomic for CommandGroupKind {}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "Command")]
pub struct CommandOverride {
    #[merge(strategy = "key")]
    pub id: String,

    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    #[merge(strategy = "map_merge")]
    pub attributes: Attributes,

    #[serde(flatten)]
    #[merge(strategy = "recurse")]
    pub union: CommandUnionOverride,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "CommandUnion", kind = "CommandType")]
pub struct CommandUnionOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(discriminator)]
    pub command_type: Option<CommandType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(variant = "Exec")]
    pub exec: Option<ExecCommandOverride>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(variant = "Apply")]
    pub apply: Option<ApplyCommandOverride>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(variant = "Composite")]
    pub composite: Option<CompositeCommandOverride>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "ExecCommand")]
pub struct ExecCommandOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "recurse_optional")]
    pub group: Option<CommandGroupOverride>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_line: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub working_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[merge(strategy = "merge_by_key")]
    pub env: Vec<EnvVarOverride>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub hot_reload_capable: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "ApplyCommand")]
pub struct ApplyCommandOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "recurse_optional")]
    pub group: Option<CommandGroupOverride>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "CompositeCommand")]
pub struct CompositeCommandOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "recurse_optional")]
    pub group: Option<CommandGroupOverride>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "replace")]
    pub commands: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub parallel: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Override)]
#[serde(rename_all = "camelCase")]
#[merge(target = "CommandGroup")]
pub struct CommandGroupOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<CommandGroupKind>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[merge(strategy = "optional")]
    pub is_default: Option<bool>,
}
