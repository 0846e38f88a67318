use std::path::PathBuf;

use snafu::{ResultExt, Snafu};
use tracing_appender::rolling::{InitError, RollingFileAppender};
use tracing_subscriber::{
    EnvFilter, Registry,
    filter::ParseError,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to parse the default log filter"))]
    ParseDefaultFilter { source: ParseError },

    #[snafu(display("failed to initialize rolling file appender in {directory:?}"))]
    InitFileAppender {
        source: InitError,
        directory: PathBuf,
    },

    #[snafu(display("failed to install the global tracing subscriber"))]
    InstallSubscriber { source: TryInitError },
}

/// Initializes `tracing` logging with the filter directives from the environment variable `env`,
/// falling back to INFO.
///
/// Logs are written to stderr, so that they never mix with documents written to stdout. They are
/// additionally copied to a file if `{env}_DIRECTORY` (e.g. `WSTPL_LOG_DIRECTORY`) is set to a
/// directory path.
pub fn initialize_logging(env: &str, app_name: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_env(env) {
        Ok(env_filter) => env_filter,
        _ => EnvFilter::try_new(tracing::Level::INFO.to_string()).context(ParseDefaultFilterSnafu)?,
    };

    let file_appender_directory = std::env::var_os(format!("{env}_DIRECTORY")).map(PathBuf::from);
    let file_layer = file_appender_directory
        .as_deref()
        .map(|directory| {
            RollingFileAppender::builder()
                .filename_suffix(format!("{app_name}.log"))
                .max_log_files(6)
                .build(directory)
                .context(InitFileAppenderSnafu { directory })
        })
        .transpose()?
        .map(|appender| {
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(appender)
        });

    Registry::default()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context(InstallSubscriberSnafu)?;

    // Logging is only possible once the subscriber is installed
    match file_appender_directory {
        Some(directory) => tracing::debug!(directory = %directory.display(), "file logging enabled"),
        None => tracing::trace!("file logging disabled, because no log directory set"),
    }
    Ok(())
}
