use std::{
    io::Write,
    path::{Path, PathBuf},
};

use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use snafu::{ResultExt, Snafu};
use workspace_template::{
    ParentOverrides, PluginOverrides, TemplateSpec, TemplateSpecContent,
    layers::{self, Plugin},
    merge,
    overriding::override_content,
    substitution::{self, substitute_attributes},
    yaml::{self, Format},
};

mod logging;

const APP_NAME: &str = "wstpl";

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to initialize logging"))]
    InitLogging { source: logging::Error },

    #[snafu(display("failed to read {path:?}"))]
    ReadFile {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to decode {path:?}"))]
    DecodeFile { source: yaml::Error, path: PathBuf },

    #[snafu(display("failed to apply the overrides from {path:?}"))]
    ApplyOverrides {
        source: merge::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to merge the template layers"))]
    MergeLayers { source: layers::Error },

    #[snafu(display("failed to substitute attributes"))]
    SubstituteAttributes { source: substitution::Error },

    #[snafu(display("failed to encode the result"))]
    EncodeResult { source: yaml::Error },

    #[snafu(display("failed to write the result to stdout"))]
    WriteStdout { source: std::io::Error },
}

/// Resolves layered workspace templates
#[derive(Debug, Parser)]
#[command(name = APP_NAME, version, about)]
struct Cli {
    /// Format of the resulting document
    #[arg(long, short, global = true, default_value_t = Format::Yaml, env = "WSTPL_OUTPUT")]
    output: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Applies an override document to a template
    Override(OverrideArgs),

    /// Merges a template with its parent and plugins
    Merge(MergeArgs),

    /// Replaces `{{key}}` attribute references in a template
    Substitute(SubstituteArgs),
}

#[derive(Debug, Args)]
struct OverrideArgs {
    /// The template to override
    #[arg(long, env = "WSTPL_BASE")]
    base: PathBuf,

    /// The override document
    #[arg(long, env = "WSTPL_PATCH")]
    patch: PathBuf,

    /// Read the override document as plugin overrides rather than parent overrides
    #[arg(long, env = "WSTPL_PLUGIN")]
    plugin: bool,
}

#[derive(Debug, Args)]
struct MergeArgs {
    /// The main template, possibly carrying overrides for its parent
    #[arg(long, env = "WSTPL_MAIN")]
    main: PathBuf,

    /// The resolved parent template
    #[arg(long, env = "WSTPL_PARENT")]
    parent: Option<PathBuf>,

    /// Resolved plugin template, repeat for every plugin from lowest to highest precedence
    #[arg(long = "plugin", env = "WSTPL_PLUGIN")]
    plugins: Vec<PathBuf>,

    /// Also replace attribute references in the merged template
    #[arg(long, env = "WSTPL_SUBSTITUTE")]
    substitute: bool,
}

#[derive(Debug, Args)]
struct SubstituteArgs {
    #[arg(long, env = "WSTPL_FILE")]
    file: PathBuf,
}

#[snafu::report]
fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::initialize_logging("WSTPL_LOG", APP_NAME).context(InitLoggingSnafu)?;

    let output = run(&cli)?;
    std::io::stdout()
        .write_all(output.as_bytes())
        .context(WriteStdoutSnafu)
}

fn run(cli: &Cli) -> Result<String> {
    let content = match &cli.command {
        Command::Override(args) => override_file(args)?,
        Command::Merge(args) => merge_files(args)?,
        Command::Substitute(args) => {
            substitute_attributes(&read(&args.file)?).context(SubstituteAttributesSnafu)?
        }
    };
    yaml::to_string(&content, cli.output).context(EncodeResultSnafu)
}

fn override_file(args: &OverrideArgs) -> Result<TemplateSpecContent> {
    let base = read::<TemplateSpecContent>(&args.base)?;
    let context = ApplyOverridesSnafu { path: &args.patch };
    if args.plugin {
        override_content(&base, &read::<PluginOverrides>(&args.patch)?).context(context)
    } else {
        override_content(&base, &read::<ParentOverrides>(&args.patch)?).context(context)
    }
}

fn merge_files(args: &MergeArgs) -> Result<TemplateSpecContent> {
    let main = read::<TemplateSpec>(&args.main)?;
    let parent = args
        .parent
        .as_deref()
        .map(read::<TemplateSpecContent>)
        .transpose()?;
    let plugins = args
        .plugins
        .iter()
        .map(|path| Ok::<_, Error>((path.display().to_string(), read(path)?)))
        .collect::<Result<Vec<(String, TemplateSpecContent)>>>()?;
    tracing::debug!(
        parent = parent.is_some(),
        plugins = plugins.len(),
        "read template layers"
    );

    let merged = layers::compose(
        &main,
        parent.as_ref(),
        &plugins
            .iter()
            .map(|(name, content)| Plugin {
                name,
                content,
                overrides: None,
            })
            .collect::<Vec<_>>(),
    )
    .context(MergeLayersSnafu)?;

    if args.substitute {
        substitute_attributes(&merged).context(SubstituteAttributesSnafu)
    } else {
        Ok(merged)
    }
}

fn read<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let input = std::fs::read_to_string(path).context(ReadFileSnafu { path })?;
    yaml::decode(&input).context(DecodeFileSnafu { path })
}
