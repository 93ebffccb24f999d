use {
    anyhow::{Context, Result},
    cgi_sdk::{write_header, CgiRequest, ContentType},
    std::io::{Read, Write},
};

const ECHOED_VARIABLES: [&str; 3] = ["REQUEST_METHOD", "CONTENT_LENGTH", "CONTENT_TYPE"];

/// Echoes the request metadata and the raw POST body back as HTML.
///
/// The body is only read for a POST whose `CONTENT_LENGTH` is all digits, and
/// then exactly that many bytes are taken from stdin.
pub fn handle(request: &CgiRequest, stdin: impl Read, mut stdout: impl Write) -> Result<()> {
    write_header(&mut stdout, ContentType::HTML)?;

    writeln!(stdout, "<html><body>")?;
    writeln!(stdout, "<h1>POST Test</h1>")?;
    writeln!(stdout, "<h2>Environment Variables:</h2>")?;
    for name in ECHOED_VARIABLES {
        writeln!(
            stdout,
            "{name}: {}<br>",
            request.var(name).unwrap_or("Not set")
        )?;
    }

    let body = if request.is_post() && request.content_length().is_some() {
        request.read_body(stdin).context("unable to read POST body")?
    } else {
        Vec::new()
    };
    tracing::debug!(bytes = body.len(), "echoing POST body");

    writeln!(stdout, "<h2>POST Data:</h2>")?;
    stdout.write_all(b"<pre>")?;
    stdout.write_all(&body)?;
    stdout.write_all(b"</pre>\n")?;
    writeln!(stdout, "</body></html>")?;

    stdout.flush()?;
    Ok(())
}
