use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_POST_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

const CGI_EXTENSIONS: [&str; 3] = ["cgi", "py", "php"];

/// Whether `path` names a script the server hands to a CGI interpreter.
pub fn is_cgi_script(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|extension| CGI_EXTENSIONS.contains(&extension))
}

/// One request to be served by a CGI program.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Interpreter or executable to launch.
    pub program: PathBuf,
    /// Script passed to `program`; its directory becomes the working directory.
    pub script: PathBuf,
    pub method: String,
    pub uri: String,
    pub query_string: Option<String>,
    pub server_name: String,
    pub server_port: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
    pub timeout: Duration,
    pub extra_env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            script: script.into(),
            method: "GET".to_owned(),
            uri: "/".to_owned(),
            query_string: None,
            server_name: "localhost".to_owned(),
            server_port: 8080,
            content_type: None,
            body: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            extra_env: Vec::new(),
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Sets the request URI; anything after `?` becomes the query string.
    pub fn uri(mut self, uri: &str) -> Self {
        match uri.split_once('?') {
            Some((path, query)) => {
                self.uri = path.to_owned();
                self.query_string = Some(query.to_owned());
            }
            None => {
                self.uri = uri.to_owned();
                self.query_string = None;
            }
        }
        self
    }

    pub fn server(mut self, name: impl Into<String>, port: u16) -> Self {
        self.server_name = name.into();
        self.server_port = port;
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a variable on top of the CGI meta-variables.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_env.push((key.into(), value.into()));
        self
    }

    pub fn is_post(&self) -> bool {
        self.method == "POST"
    }

    /// The complete environment of the CGI process. Nothing from the host
    /// environment leaks in.
    pub fn environment(&self) -> Vec<(String, String)> {
        let mut env = vec![
            ("REQUEST_METHOD".to_owned(), self.method.clone()),
            ("SERVER_PROTOCOL".to_owned(), "HTTP/1.1".to_owned()),
            ("GATEWAY_INTERFACE".to_owned(), "CGI/1.1".to_owned()),
            ("REQUEST_URI".to_owned(), self.uri.clone()),
            ("PATH_INFO".to_owned(), self.uri.clone()),
            (
                "SCRIPT_NAME".to_owned(),
                self.script.to_string_lossy().into_owned(),
            ),
        ];
        if let Some(query) = &self.query_string {
            env.push(("QUERY_STRING".to_owned(), query.clone()));
        }
        env.push(("SERVER_NAME".to_owned(), self.server_name.clone()));
        env.push(("SERVER_PORT".to_owned(), self.server_port.to_string()));

        if self.is_post() {
            env.push(("CONTENT_LENGTH".to_owned(), self.body.len().to_string()));
            env.push((
                "CONTENT_TYPE".to_owned(),
                self.content_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_POST_CONTENT_TYPE.to_owned()),
            ));
        }

        env.extend(self.extra_env.iter().cloned());
        env
    }
}
