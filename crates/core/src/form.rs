//! Multipart form payloads sent to the service

use std::path::PathBuf;

/// Body of the `fileToUpload` part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileBody {
    /// In-memory content
    Bytes(Vec<u8>),
    /// File on disk, streamed when the request is sent
    File { path: PathBuf, len: u64 },
}

/// A file part of the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: FileBody,
}

/// One form field, in send order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    Text { name: &'static str, value: String },
    File { name: &'static str, part: FilePart },
}

/// Ordered multipart/form-data payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadForm {
    fields: Vec<FormField>,
}

impl UploadForm {
    /// Start a form for the given `reqtype`
    pub fn new(reqtype: &str) -> Self {
        Self::default().text("reqtype", reqtype)
    }

    /// Append a text field
    pub fn text(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.fields.push(FormField::Text {
            name,
            value: value.into(),
        });
        self
    }

    /// Append a text field when a value is present
    pub fn text_opt(self, name: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.text(name, value),
            None => self,
        }
    }

    /// Append a file part (sent as `application/octet-stream`)
    pub fn file(mut self, name: &'static str, file_name: String, body: FileBody) -> Self {
        self.fields.push(FormField::File {
            name,
            part: FilePart {
                file_name,
                content_type: "application/octet-stream",
                body,
            },
        });
        self
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<FormField> {
        self.fields
    }

    /// Value of the first text field called `name`
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.fields.iter().find_map(|f| match f {
            FormField::Text { name: n, value } if *n == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// Whether a field called `name` exists
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| match f {
            FormField::Text { name: n, .. } | FormField::File { name: n, .. } => *n == name,
        })
    }

    /// The first file part, if any
    pub fn file_part(&self) -> Option<&FilePart> {
        self.fields.iter().find_map(|f| match f {
            FormField::File { part, .. } => Some(part),
            _ => None,
        })
    }
}
