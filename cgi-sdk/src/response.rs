use std::io::{self, Write};

pub struct ContentType;

impl ContentType {
    pub const HTML: &'static str = "text/html";
    pub const PLAIN: &'static str = "text/plain";
}

/// Writes the CGI header block: a single `Content-Type` line followed by the
/// blank line that ends the headers.
pub fn write_header(out: &mut impl Write, content_type: &str) -> io::Result<()> {
    write!(out, "Content-Type: {content_type}\n\n")
}
