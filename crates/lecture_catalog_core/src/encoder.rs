//! crates/lecture_catalog_core/src/encoder.rs
//!
//! Turns uploaded bytes into a self-contained `data:` URI and classifies the
//! file as a PDF or an image. Only these two kinds are admitted; the gate runs
//! before any byte is read.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::{EncodedFile, FileKind};
use crate::error::{CatalogError, CatalogResult};

const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Lowercased media type without parameters (`image/PNG; q=1` -> `image/png`).
fn essence(media_type: &str) -> String {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Classification policy: images are special-cased, everything else is a PDF.
pub fn classify(media_type: &str) -> FileKind {
    if essence(media_type).starts_with("image/") {
        FileKind::Image
    } else {
        FileKind::Pdf
    }
}

/// Rejects anything that is not a PDF document or an image.
pub fn accept_media_type(media_type: &str) -> CatalogResult<FileKind> {
    let essence = essence(media_type);
    if essence.starts_with("image/") && essence.len() > "image/".len() {
        Ok(FileKind::Image)
    } else if essence == PDF_MEDIA_TYPE {
        Ok(FileKind::Pdf)
    } else {
        Err(CatalogError::UnsupportedFileKind(media_type.to_string()))
    }
}

/// Builds `data:<media type>;base64,<payload>`.
pub fn encode_bytes(bytes: &[u8], media_type: &str) -> String {
    format!("data:{};base64,{}", essence(media_type), STANDARD.encode(bytes))
}

/// Inverse of [`encode_bytes`]: returns the media type and the raw bytes.
pub fn decode_data_uri(uri: &str) -> CatalogResult<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| CatalogError::MalformedDataUri("missing `data:` scheme".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| CatalogError::MalformedDataUri("missing `,` separator".to_string()))?;
    let media_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| CatalogError::MalformedDataUri("payload is not base64".to_string()))?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| CatalogError::MalformedDataUri(e.to_string()))?;
    Ok((media_type.to_string(), bytes))
}

/// Reads the whole stream and encodes it.
///
/// The media type is checked first, so an unsupported file is never read.
pub async fn encode_file<R>(mut reader: R, name: &str, media_type: &str) -> CatalogResult<EncodedFile>
where
    R: AsyncRead + Unpin,
{
    let kind = accept_media_type(media_type)?;

    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .await
        .map_err(CatalogError::FileReadError)?;
    debug!(name, size = bytes.len(), kind = kind.as_str(), "Encoded lecture file");

    Ok(EncodedFile {
        encoded: encode_bytes(&bytes, media_type),
        kind,
        name: name.to_string(),
    })
}

/// Like [`encode_file`], but yields `Ok(None)` once `cancel` fires.
///
/// Used when the submitting form may be abandoned while the read is still in
/// flight; whatever was read so far is dropped.
pub async fn encode_file_cancellable<R>(
    reader: R,
    name: &str,
    media_type: &str,
    cancel: &CancellationToken,
) -> CatalogResult<Option<EncodedFile>>
where
    R: AsyncRead + Unpin,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            warn!(name, "File encoding abandoned before completion");
            Ok(None)
        }
        result = encode_file(reader, name, media_type) => result.map(Some),
    }
}
