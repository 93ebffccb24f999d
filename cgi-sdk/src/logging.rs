use {
    crate::{
        config::{ProbeConfig, LOG_VAR},
        Result, SdkError,
    },
    std::io,
    tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter},
};

/// Parses a `CGI_PROBES_LOG` directive. An invalid one is a config error
/// rather than a silent `off`.
pub fn filter(directive: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directive).map_err(|_| SdkError::Config {
        key: LOG_VAR,
        value: directive.to_owned(),
    })
}

/// Sends `tracing` output to stderr; stdout belongs to the response.
///
/// Some servers splice stderr into the response too, which is why the
/// default filter is `off`.
pub fn init(config: &ProbeConfig) -> Result<()> {
    let filter = filter(&config.log_filter)?;

    // a second call leaves the first subscriber in place
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(false),
        )
        .try_init();
    Ok(())
}
