use {
    anyhow::{Context, Result},
    cgi_sdk::{write_header, CgiRequest, ContentType, FormData},
    std::io::{Read, Write},
};

pub const FIELD: &str = "data";

/// Echoes the `data` field back as plain text, preceded by the names of all
/// submitted fields.
pub fn handle(request: &CgiRequest, stdin: impl Read, mut stdout: impl Write) -> Result<()> {
    write_header(&mut stdout, ContentType::PLAIN)?;

    let form = FormData::parse(request, stdin).context("unable to decode form")?;
    tracing::debug!(fields = form.fields().len(), "decoded form");

    writeln!(stdout, "DEBUG: keys -> {}", key_list(&form.keys()))?;

    match form.get_value(FIELD).filter(|value| !value.is_empty()) {
        Some(value) => writeln!(stdout, "Data received: {value}")?,
        None => writeln!(stdout, "No data provided.")?,
    }

    stdout.flush()?;
    Ok(())
}

/// Renders `keys` the way Python prints a list of strings.
fn key_list(keys: &[&str]) -> String {
    let items: Vec<String> = keys.iter().map(|key| quoted(key)).collect();
    format!("[{}]", items.join(", "))
}

fn quoted(key: &str) -> String {
    let quote = if key.contains('\'') && !key.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(key.len() + 2);
    out.push(quote);
    for c in key.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}
