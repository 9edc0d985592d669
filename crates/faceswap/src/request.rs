use axum::{
    body::Body,
    extract::{FromRequest, Multipart, multipart::Field},
};
use bytes::Bytes;

use crate::{
    error::FaceSwapError,
    types::{ScenarioKey, SwapUpload},
};

/// Body limit for photo uploads (16 MiB)
pub(crate) const BODY_LIMIT_BYTES: usize = 16 << 20;

/// Extractor for `multipart/form-data` swap submissions
///
/// Expects a `file` part holding an `image/*` upload plus `category`,
/// `scenario` and `subject` text parts. `enhance` is optional.
pub struct ExtractUpload(pub SwapUpload);

impl<S> FromRequest<S> for ExtractUpload
where
    S: Send + Sync,
{
    type Rejection = FaceSwapError;

    async fn from_request(request: http::Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| FaceSwapError::InvalidRequest(format!("expected a multipart form: {}", e.body_text())))?;

        let mut image: Option<(Bytes, Option<String>, String)> = None;
        let mut category = None;
        let mut scenario = None;
        let mut subject = None;
        let mut enhance = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| FaceSwapError::InvalidRequest(format!("failed to read multipart form: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();

            match name.as_str() {
                "file" => {
                    let filename = field.file_name().map(str::to_string);
                    let content_type = field.content_type().unwrap_or_default().to_string();

                    if !content_type.starts_with("image/") {
                        return Err(FaceSwapError::InvalidRequest(format!(
                            "file must be an image, got content type '{content_type}'"
                        )));
                    }

                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| FaceSwapError::InvalidRequest(format!("failed to read file: {e}")))?;

                    if bytes.is_empty() {
                        return Err(FaceSwapError::InvalidRequest("file is empty".to_string()));
                    }

                    image = Some((bytes, filename, content_type));
                }
                "category" => category = Some(text(field, "category").await?),
                "scenario" => scenario = Some(text(field, "scenario").await?),
                "subject" => subject = Some(text(field, "subject").await?),
                "enhance" => enhance = Some(parse_flag(&text(field, "enhance").await?)?),
                other => tracing::debug!(field = other, "ignoring unknown multipart field"),
            }
        }

        let (image, filename, content_type) = image.ok_or_else(|| missing("file"))?;

        let key = ScenarioKey {
            category: category.ok_or_else(|| missing("category"))?,
            scenario: scenario.ok_or_else(|| missing("scenario"))?,
            subject: subject.ok_or_else(|| missing("subject"))?,
        };

        Ok(Self(SwapUpload {
            image,
            filename,
            content_type,
            key,
            enhance,
        }))
    }
}

async fn text(field: Field<'_>, name: &str) -> Result<String, FaceSwapError> {
    let value = field
        .text()
        .await
        .map_err(|e| FaceSwapError::InvalidRequest(format!("failed to read {name}: {e}")))?;

    let value = value.trim();
    if value.is_empty() {
        return Err(FaceSwapError::InvalidRequest(format!("{name} must not be empty")));
    }

    Ok(value.to_string())
}

fn parse_flag(value: &str) -> Result<bool, FaceSwapError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(FaceSwapError::InvalidRequest(format!(
            "enhance must be a boolean, got '{value}'"
        ))),
    }
}

fn missing(name: &str) -> FaceSwapError {
    FaceSwapError::InvalidRequest(format!("missing required '{name}' field in multipart form"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "mirage-boundary";

    fn form(parts: &[(&str, Option<(&str, &str)>, &[u8])]) -> http::Request<Body> {
        let mut body = Vec::new();
        for (name, file, value) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match file {
                Some((filename, content_type)) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes()),
            }
            body.extend_from_slice(value);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        http::Request::builder()
            .method("POST")
            .uri("/api/faceswap/image")
            .header(http::header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn extract(request: http::Request<Body>) -> Result<SwapUpload, FaceSwapError> {
        ExtractUpload::from_request(request, &()).await.map(|ExtractUpload(upload)| upload)
    }

    #[tokio::test]
    async fn complete_form_is_extracted() {
        let request = form(&[
            ("file", Some(("me.jpg", "image/jpeg")), b"\xff\xd8\xff"),
            ("category", None, b"FAKE_NEWS"),
            ("scenario", None, b"SCENARIO1"),
            ("subject", None, b"male"),
            ("enhance", None, b"true"),
        ]);

        let upload = extract(request).await.unwrap();

        assert_eq!(upload.image.as_ref(), b"\xff\xd8\xff");
        assert_eq!(upload.filename.as_deref(), Some("me.jpg"));
        assert_eq!(upload.content_type, "image/jpeg");
        assert_eq!(upload.key.to_string(), "FAKE_NEWS/SCENARIO1/male");
        assert_eq!(upload.enhance, Some(true));
    }

    #[tokio::test]
    async fn missing_subject_is_rejected() {
        let request = form(&[
            ("file", Some(("me.png", "image/png")), b"png"),
            ("category", None, b"FAKE_NEWS"),
            ("scenario", None, b"SCENARIO1"),
        ]);

        let err = extract(request).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid request: missing required 'subject' field in multipart form"
        );
    }

    #[tokio::test]
    async fn non_image_upload_is_rejected() {
        let request = form(&[
            ("file", Some(("voice.mp3", "audio/mpeg")), b"ID3"),
            ("category", None, b"FAKE_NEWS"),
            ("scenario", None, b"SCENARIO1"),
            ("subject", None, b"male"),
        ]);

        let err = extract(request).await.unwrap_err();
        assert!(matches!(err, FaceSwapError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn json_body_is_rejected() {
        let request = http::Request::builder()
            .method("POST")
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let err = extract(request).await.unwrap_err();
        assert!(matches!(err, FaceSwapError::InvalidRequest(_)));
    }

    #[test]
    fn enhance_flag_accepts_common_spellings() {
        assert!(parse_flag("1").unwrap());
        assert!(parse_flag("TRUE").unwrap());
        assert!(!parse_flag("off").unwrap());
        assert!(parse_flag("maybe").is_err());
    }
}
