//! CGI meta-variables for a single invocation.

use {
    crate::Result,
    std::{
        collections::HashMap,
        env,
        io::Read,
    },
};

pub const DEFAULT_POST_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

const META_VARIABLES: &[&str] = &[
    "REQUEST_METHOD",
    "CONTENT_LENGTH",
    "CONTENT_TYPE",
    "QUERY_STRING",
    "REQUEST_URI",
    "SCRIPT_NAME",
    "PATH_INFO",
    "SERVER_NAME",
    "SERVER_PORT",
    "SERVER_PROTOCOL",
    "GATEWAY_INTERFACE",
];

/// The request as the web server described it through the environment.
///
/// Every variable is optional: servers differ in what they set, and the
/// probes report absence rather than failing on it.
#[derive(Debug, Clone, Default)]
pub struct CgiRequest {
    vars: HashMap<&'static str, String>,
}

impl CgiRequest {
    pub fn from_env() -> Self {
        Self::from_vars(env::vars())
    }

    /// Keeps only the known meta-variables from `vars`.
    pub fn from_vars<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut map = HashMap::new();
        for (key, value) in vars {
            if let Some(name) = META_VARIABLES.iter().find(|name| **name == key.as_ref()) {
                map.insert(*name, value.into());
            }
        }
        Self { vars: map }
    }

    /// Raw value of a meta-variable.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn method(&self) -> Option<&str> {
        self.var("REQUEST_METHOD")
    }

    pub fn is_post(&self) -> bool {
        self.method() == Some("POST")
    }

    /// `CONTENT_LENGTH` exactly as the server sent it.
    pub fn raw_content_length(&self) -> Option<&str> {
        self.var("CONTENT_LENGTH")
    }

    /// Declared body length. Only a non-empty run of ASCII digits counts.
    pub fn content_length(&self) -> Option<usize> {
        self.raw_content_length()
            .filter(|text| !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|text| text.parse().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.var("CONTENT_TYPE")
    }

    pub fn effective_content_type(&self) -> Option<&str> {
        match self.content_type() {
            Some(content_type) => Some(content_type),
            None if self.is_post() => Some(DEFAULT_POST_CONTENT_TYPE),
            None => None,
        }
    }

    pub fn query_string(&self) -> Option<&str> {
        self.var("QUERY_STRING")
    }

    /// Reads the request body from `stdin`.
    ///
    /// With a declared length at most that many bytes are read, so a short
    /// stdin yields a short body. A POST without a usable length is read to
    /// EOF, and any other request has no body.
    pub fn read_body(&self, mut stdin: impl Read) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        match self.content_length() {
            Some(length) => {
                stdin.take(length as u64).read_to_end(&mut body)?;
            }
            None if self.is_post() => {
                stdin.read_to_end(&mut body)?;
            }
            None => {}
        }
        tracing::debug!(bytes = body.len(), "read request body");
        Ok(body)
    }
}
