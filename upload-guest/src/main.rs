use {
    anyhow::Result,
    cgi_sdk::{logging, CgiRequest, ProbeConfig},
    std::io,
};

fn main() -> Result<()> {
    let config = ProbeConfig::from_env()?;
    logging::init(&config)?;

    upload_guest::handle(
        &CgiRequest::from_env(),
        io::stdin().lock(),
        io::stdout().lock(),
        &config,
    )
}
