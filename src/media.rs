//! Client-side checks for staged uploads, and the multipart bodies the
//! upload endpoints expect. The shell hands over raw file bytes; nothing
//! here touches the filesystem.

use crate::{AppError, AppResult, ErrorKind, MAX_UPLOAD_BYTES};

/// A file the user picked, before it has been uploaded.
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StagedFile {
    pub name: String,
    pub data: Vec<u8>,
}

// Bytes are elided; a staged photo can be megabytes.
impl std::fmt::Debug for StagedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedFile")
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Validate a staged image and sniff its MIME type from the magic bytes.
/// The extension the user's file had is not trusted.
pub fn validate_image(data: &[u8]) -> AppResult<&'static str> {
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::new(
            ErrorKind::ImageTooLarge,
            format!(
                "Image is {} MB, maximum is {} MB",
                data.len() / 1_000_000,
                MAX_UPLOAD_BYTES / 1_000_000
            ),
        ));
    }

    let format = image::guess_format(data)
        .map_err(|e| AppError::new(ErrorKind::ImageFormatUnsupported, e.to_string()))?;

    match format {
        image::ImageFormat::Png => Ok("image/png"),
        image::ImageFormat::Jpeg => Ok("image/jpeg"),
        image::ImageFormat::Gif => Ok("image/gif"),
        image::ImageFormat::WebP => Ok("image/webp"),
        other => Err(AppError::new(
            ErrorKind::ImageFormatUnsupported,
            format!("{other:?} uploads are not supported"),
        )),
    }
}

/// Like [`validate_image`], but also accepts PDFs, which the document
/// upload inputs allow alongside photos.
pub fn validate_document(data: &[u8]) -> AppResult<&'static str> {
    if data.starts_with(b"%PDF-") {
        if data.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::new(
                ErrorKind::ImageTooLarge,
                format!(
                    "Document is {} MB, maximum is {} MB",
                    data.len() / 1_000_000,
                    MAX_UPLOAD_BYTES / 1_000_000
                ),
            ));
        }
        return Ok("application/pdf");
    }
    validate_image(data)
}

/// Incremental `multipart/form-data` encoder for the upload endpoints.
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    #[must_use]
    pub fn new() -> Self {
        Self {
            boundary: format!("----xemarket-{}", uuid::Uuid::new_v4().simple()),
            body: Vec::new(),
        }
    }

    pub fn add_file(
        &mut self,
        field: &str,
        filename: &str,
        mime_type: &str,
        data: &[u8],
    ) -> &mut Self {
        self.body
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                sanitize_token(field),
                sanitize_token(filename)
            )
            .as_bytes(),
        );
        self.body
            .extend_from_slice(format!("Content-Type: {mime_type}\r\n\r\n").as_bytes());
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn add_text(&mut self, field: &str, value: &str) -> &mut Self {
        self.body
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                sanitize_token(field)
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Close the form. Returns the `Content-Type` header value and the body.
    #[must_use]
    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip characters that would break out of a quoted disposition value.
fn sanitize_token(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '"' | '\r' | '\n' | '\\'))
        .collect()
}
