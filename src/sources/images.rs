//! Thumbnail URL construction and response validation.

use crate::error::FetchError;
use crate::state::Movie;

/// Raw image returned by an [`crate::sources::ImageSource`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageData {
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
    /// MIME type reported by the server (or sniffed from the bytes).
    pub content_type: Option<String>,
}

/// What: Build the URL of a movie's thumbnail.
///
/// Inputs:
/// - `base_url`: Image CDN base, e.g. `https://image.tmdb.org/t/p`
/// - `width`: Requested rendition width in pixels
/// - `movie`: Movie whose poster (else backdrop) is used
///
/// Output:
/// - `{base_url}/w{width}{path}`, or `FetchError::MissingResource` when the movie has no path
pub fn image_url(base_url: &str, width: u32, movie: &Movie) -> Result<String, FetchError> {
    let path = movie.image_path().ok_or_else(|| {
        FetchError::MissingResource(format!("movie {} has no poster or backdrop", movie.id))
    })?;
    let sep = if path.starts_with('/') { "" } else { "/" };
    Ok(format!(
        "{}/w{width}{sep}{path}",
        base_url.trim_end_matches('/')
    ))
}

/// What: Accept a downloaded body only if it is an image.
///
/// Inputs:
/// - `bytes`: Response body
/// - `content_type`: `Content-Type` header, if any
///
/// Output:
/// - `ImageData` on success; `FetchError::Decode` for an empty body, a non-image
///   content type, or (without a content type) unrecognised magic bytes
pub fn validate_image(bytes: Vec<u8>, content_type: Option<String>) -> Result<ImageData, FetchError> {
    if bytes.is_empty() {
        return Err(FetchError::Decode("empty image body".into()));
    }
    let content_type = match content_type {
        Some(ct) if ct.trim().to_ascii_lowercase().starts_with("image/") => ct,
        Some(ct) => {
            return Err(FetchError::Decode(format!(
                "expected an image, got content type {ct}"
            )));
        }
        None => sniff(&bytes)
            .ok_or_else(|| FetchError::Decode("unrecognised image data".into()))?
            .to_string(),
    };
    Ok(ImageData {
        bytes,
        content_type: Some(content_type),
    })
}

fn sniff(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("image/png")
    } else if bytes.starts_with(b"GIF8") {
        Some("image/gif")
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}
