//! Decoding of submitted form fields.
//!
//! Field order follows the order of appearance: body fields first, then the
//! query string, which is how the probed servers' own scripts saw them.

use {
    crate::{request::CgiRequest, Result, SdkError},
    bytes::Bytes,
    std::{borrow::Cow, convert::Infallible, io::Read},
    url::form_urlencoded,
};

const URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART: &str = "multipart/form-data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    /// Present when the part was sent as a file, even if empty.
    pub file_name: Option<String>,
    pub value: Bytes,
}

impl FormField {
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FormData {
    fields: Vec<FormField>,
}

impl FormData {
    /// Decodes the fields submitted with `request`, reading the body from
    /// `stdin` when the request is a POST.
    pub fn parse(request: &CgiRequest, stdin: impl Read) -> Result<Self> {
        let mut fields = Vec::new();

        if request.is_post() {
            let content_type = request.effective_content_type().unwrap_or(URLENCODED);
            let body = request.read_body(stdin)?;

            match essence(content_type).as_str() {
                URLENCODED => fields.extend(urlencoded_fields(&body)),
                MULTIPART => fields.extend(multipart_fields(content_type, body)?),
                other => tracing::debug!(content_type = other, "no form fields in body"),
            }
        }

        if let Some(query) = request.query_string() {
            fields.extend(urlencoded_fields(query.as_bytes()));
        }

        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Distinct field names, in the order they first appear.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for field in &self.fields {
            if !keys.contains(&field.name.as_str()) {
                keys.push(&field.name);
            }
        }
        keys
    }

    pub fn get(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn get_value(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(FormField::text)
    }
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn urlencoded_fields(input: &[u8]) -> impl Iterator<Item = FormField> + '_ {
    form_urlencoded::parse(input).map(|(name, value)| FormField {
        name: name.into_owned(),
        file_name: None,
        value: Bytes::from(value.into_owned()),
    })
}

fn multipart_fields(content_type: &str, body: Vec<u8>) -> Result<Vec<FormField>> {
    let boundary = multer::parse_boundary(content_type)?;
    let stream = futures_util::stream::once(async move { Ok::<_, Infallible>(Bytes::from(body)) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(SdkError::Runtime)?;

    runtime.block_on(async {
        let mut fields = Vec::new();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_owned();
            let file_name = field.file_name().map(str::to_owned);
            let value = field.bytes().await?;
            tracing::debug!(%name, ?file_name, bytes = value.len(), "multipart field");
            fields.push(FormField {
                name,
                file_name,
                value,
            });
        }
        Ok::<_, SdkError>(fields)
    })
}

#[cfg(test)]
mod tests {
    use {super::*, anyhow::Result};

    fn post(content_type: &str, body: &[u8]) -> CgiRequest {
        CgiRequest::from_vars([
            ("REQUEST_METHOD", "POST".to_owned()),
            ("CONTENT_TYPE", content_type.to_owned()),
            ("CONTENT_LENGTH", body.len().to_string()),
        ])
    }

    #[test]
    fn query_string_fields_for_get() -> Result<()> {
        let request = CgiRequest::from_vars([
            ("REQUEST_METHOD", "GET"),
            ("QUERY_STRING", "data=hello+there&x=%41"),
        ]);
        let form = FormData::parse(&request, &b""[..])?;

        assert_eq!(vec!["data", "x"], form.keys());
        assert_eq!(Some("hello there"), form.get_value("data").as_deref());
        assert_eq!(Some("A"), form.get_value("x").as_deref());
        Ok(())
    }

    #[test]
    fn urlencoded_body_precedes_query_string() -> Result<()> {
        let body = b"data=from-body";
        let request = CgiRequest::from_vars([
            ("REQUEST_METHOD", "POST".to_owned()),
            ("CONTENT_TYPE", URLENCODED.to_owned()),
            ("CONTENT_LENGTH", body.len().to_string()),
            ("QUERY_STRING", "data=from-query".to_owned()),
        ]);
        let form = FormData::parse(&request, &body[..])?;

        assert_eq!(2, form.fields().len());
        assert_eq!(Some("from-body"), form.get_value("data").as_deref());
        assert_eq!(vec!["data"], form.keys());
        Ok(())
    }

    #[test]
    fn post_without_content_type_is_urlencoded() -> Result<()> {
        let body = b"data=42";
        let request = CgiRequest::from_vars([
            ("REQUEST_METHOD", "POST".to_owned()),
            ("CONTENT_LENGTH", body.len().to_string()),
        ]);
        let form = FormData::parse(&request, &body[..])?;
        assert_eq!(Some("42"), form.get_value("data").as_deref());
        Ok(())
    }

    #[test]
    fn multipart_fields_keep_file_names() -> Result<()> {
        let body = b"--XyZ\r\n\
            Content-Disposition: form-data; name=\"note\"\r\n\
            \r\n\
            hi\r\n\
            --XyZ\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"a.bin\"\r\n\
            Content-Type: application/octet-stream\r\n\
            \r\n\
            \x00\x01\x02\r\n\
            --XyZ--\r\n";
        let request = post("multipart/form-data; boundary=XyZ", body);
        let form = FormData::parse(&request, &body[..])?;

        assert_eq!(vec!["note", "file"], form.keys());
        assert_eq!(None, form.get("note").and_then(|f| f.file_name.as_deref()));

        let file = form.get("file").expect("file field");
        assert_eq!(Some("a.bin"), file.file_name.as_deref());
        assert_eq!(&b"\x00\x01\x02"[..], &file.value[..]);
        Ok(())
    }

    #[test]
    fn multipart_without_boundary_is_an_error() {
        let request = post("multipart/form-data", b"whatever");
        assert!(matches!(
            FormData::parse(&request, &b"whatever"[..]),
            Err(SdkError::Multipart(_))
        ));
    }

    #[test]
    fn other_content_types_have_no_body_fields() -> Result<()> {
        let request = post("text/plain", b"data=1");
        let form = FormData::parse(&request, &b"data=1"[..])?;
        assert!(form.fields().is_empty());
        Ok(())
    }
}
