//! Turning raw CGI output into the HTTP response sent to the client.

use {memchr::memmem, std::time::Duration};

const DEFAULT_CONTENT_TYPE: &str = "text/html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    fn html(status: u16, reason: &str, body: String) -> Self {
        Self {
            headers: vec![("Content-Type".to_owned(), DEFAULT_CONTENT_TYPE.to_owned())],
            body: body.into_bytes(),
            ..Self::new(status, reason)
        }
    }

    pub fn internal_server_error() -> Self {
        Self::html(
            500,
            "Internal Server Error",
            "<h1>500 Internal Server Error</h1>".to_owned(),
        )
    }

    pub fn gateway_timeout(timeout: Duration) -> Self {
        Self::html(
            504,
            "Gateway Timeout",
            format!(
                "<h1>504 Gateway Timeout</h1><p>CGI script exceeded {} second timeout</p>",
                seconds(timeout)
            ),
        )
    }

    /// First header named `name`, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = format!("HTTP/1.1 {} {}\r\n", self.status, self.reason).into_bytes();
        for (name, value) in &self.headers {
            bytes.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }
        bytes.extend_from_slice(b"\r\n");
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

fn seconds(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        duration.as_secs().to_string()
    } else {
        duration.as_secs_f64().to_string()
    }
}

/// Frames the stdout of a CGI program as an HTTP response.
///
/// The header block ends at the first `\r\n\r\n`, or failing that the first
/// `\n\n`. It only counts as a header block when it names `Content-Type`;
/// otherwise the whole output becomes the body of a `text/html` response.
/// A `Status` header sets the status line and is not forwarded.
pub fn frame_output(output: &[u8]) -> HttpResponse {
    let split = memmem::find(output, b"\r\n\r\n")
        .map(|end| (end, end + 4))
        .or_else(|| memmem::find(output, b"\n\n").map(|end| (end, end + 2)));

    if let Some((end, body_start)) = split {
        let headers = parse_headers(&output[..end]);
        if headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        {
            return with_status(headers, output[body_start..].to_vec());
        }
    }

    tracing::debug!(bytes = output.len(), "no CGI header block, using default content type");
    HttpResponse {
        headers: vec![("Content-Type".to_owned(), DEFAULT_CONTENT_TYPE.to_owned())],
        body: output.to_vec(),
        ..HttpResponse::new(200, "OK")
    }
}

fn parse_headers(block: &[u8]) -> Vec<(String, String)> {
    String::from_utf8_lossy(block)
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter_map(|line| match line.split_once(':') {
            Some((name, value)) => Some((name.trim().to_owned(), value.trim().to_owned())),
            None => {
                if !line.is_empty() {
                    tracing::warn!(line, "ignoring malformed CGI header");
                }
                None
            }
        })
        .collect()
}

fn with_status(headers: Vec<(String, String)>, body: Vec<u8>) -> HttpResponse {
    let mut response = HttpResponse::new(200, "OK");
    for (name, value) in headers {
        if name.eq_ignore_ascii_case("status") {
            match parse_status(&value) {
                Some((status, reason)) => {
                    response.status = status;
                    response.reason = reason;
                }
                None => tracing::warn!(%value, "ignoring malformed Status header"),
            }
        } else {
            response.headers.push((name, value));
        }
    }
    response.body = body;
    response
}

fn parse_status(value: &str) -> Option<(u16, String)> {
    let (code, reason) = value.split_once(' ').unwrap_or((value, ""));
    let code = code.parse::<u16>().ok().filter(|code| (100..=999).contains(code))?;
    Some((code, reason.trim().to_owned()))
}
