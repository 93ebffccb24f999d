use {
    anyhow::Result,
    cgi_sdk::{logging, CgiRequest, ProbeConfig},
    std::io,
};

fn main() -> Result<()> {
    logging::init(&ProbeConfig::from_env()?)?;

    form_guest::handle(
        &CgiRequest::from_env(),
        io::stdin().lock(),
        io::stdout().lock(),
    )
}
