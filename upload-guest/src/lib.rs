use {
    anyhow::{Context, Result},
    cgi_sdk::{save_upload, write_header, CgiRequest, ContentType, FormData, ProbeConfig, SdkError},
    std::io::{Read, Write},
};

pub const FIELD: &str = "file";

/// Stores the `file` field of a multipart upload under the configured
/// directory and reports where it went.
pub fn handle(
    request: &CgiRequest,
    stdin: impl Read,
    mut stdout: impl Write,
    config: &ProbeConfig,
) -> Result<()> {
    write_header(&mut stdout, ContentType::HTML)?;

    let form = FormData::parse(request, stdin).context("unable to decode upload")?;

    let Some(field) = form.get(FIELD) else {
        tracing::warn!(keys = ?form.keys(), "no file part");
        writeln!(stdout, "<h1>Error: No file part</h1>")?;
        return Ok(());
    };

    let file_name = field.file_name.as_deref().unwrap_or_default();
    match save_upload(&config.upload_dir, file_name, &field.value) {
        Ok(path) => writeln!(
            stdout,
            "<h1>Upload successful</h1><p>File saved as: {}</p>",
            path.display()
        )?,
        Err(SdkError::EmptyFileName) => {
            tracing::warn!(file_name, "empty filename");
            writeln!(stdout, "<h1>Error: Empty filename</h1>")?
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!("unable to save {file_name:?} to {}", config.upload_dir.display())
            })
        }
    }

    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use {super::*, std::fs};

    const BOUNDARY: &str = "----probe";

    fn multipart(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, file_name, value) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match file_name {
                Some(file_name) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(value);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn run(body: &[u8], config: &ProbeConfig) -> Result<String> {
        let request = CgiRequest::from_vars([
            ("REQUEST_METHOD", "POST".to_owned()),
            (
                "CONTENT_TYPE",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ),
            ("CONTENT_LENGTH", body.len().to_string()),
        ]);
        let mut out = Vec::new();
        handle(&request, body, &mut out, config)?;
        Ok(String::from_utf8(out)?)
    }

    fn config(dir: &std::path::Path) -> ProbeConfig {
        ProbeConfig {
            upload_dir: dir.join("uploads"),
            ..ProbeConfig::default()
        }
    }

    #[test]
    fn saves_file_under_its_basename() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = config(dir.path());
        let content: &[u8] = b"\x89PNG\r\n\x1a\n\x00binary";

        let output = run(
            &multipart(&[("file", Some("/home/user/../pics/cat.png"), content)]),
            &config,
        )?;

        let saved = config.upload_dir.join("cat.png");
        assert_eq!(
            format!(
                "Content-Type: text/html\n\n<h1>Upload successful</h1><p>File saved as: {}</p>\n",
                saved.display()
            ),
            output
        );
        assert_eq!(content, &fs::read(saved)?[..]);
        Ok(())
    }

    #[test]
    fn reports_missing_file_part() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = config(dir.path());

        let output = run(&multipart(&[("other", Some("a.txt"), &b"x"[..])]), &config)?;

        assert_eq!(
            "Content-Type: text/html\n\n<h1>Error: No file part</h1>\n",
            output
        );
        assert!(!config.upload_dir.exists());
        Ok(())
    }

    #[test]
    fn reports_empty_filename() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = config(dir.path());

        for body in [
            multipart(&[("file", Some(""), &b"data"[..])]),
            multipart(&[("file", None, &b"plain field"[..])]),
        ] {
            assert_eq!(
                "Content-Type: text/html\n\n<h1>Error: Empty filename</h1>\n",
                run(&body, &config)?
            );
        }
        assert!(!config.upload_dir.exists());
        Ok(())
    }

    #[test]
    fn get_request_has_no_file_part() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let request = CgiRequest::from_vars([("REQUEST_METHOD", "GET")]);
        let mut out = Vec::new();

        handle(&request, &b""[..], &mut out, &config(dir.path()))?;

        assert!(String::from_utf8(out)?.ends_with("<h1>Error: No file part</h1>\n"));
        Ok(())
    }
}
