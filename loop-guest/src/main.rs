use {
    anyhow::Result,
    cgi_sdk::{logging, ProbeConfig},
    loop_guest::LoopSettings,
    std::io,
};

fn main() -> Result<()> {
    let config = ProbeConfig::from_env()?;
    logging::init(&config)?;

    // only returns once stdout is gone
    match loop_guest::handle(io::stdout().lock(), &LoopSettings::from(&config))? {}
}
