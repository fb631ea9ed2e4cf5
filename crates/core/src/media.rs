//! Media URL and payload normalization.
//!
//! Every outbound media reference is rewritten to the CDN form
//! `https://images.aipg.art/{filename}`; workers upload both images and
//! videos under a `.webp` key, and the CDN serves the correct content type.
//! Inline image payloads are normalized to `data:` URIs, and generation
//! entries are classified into image/video kinds with the guarantee that an
//! image view carries exactly one of `url` and `base64`.

/// Public CDN base for generated media.
pub const CDN_BASE: &str = "https://images.aipg.art/";

/// What a generation produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// Normalized media reference for one generation.
///
/// For [`MediaKind::Image`], exactly one of `url` and `base64` is non-empty
/// (or both empty when the upstream sent nothing usable). The same bytes are
/// never reported both ways.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationMedia {
    pub kind_is_video: bool,
    pub url: String,
    pub base64: String,
}

impl GenerationMedia {
    pub fn kind(&self) -> MediaKind {
        if self.kind_is_video {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }
}

/// Classify one upstream generation and normalize its media fields.
///
/// An explicit `video` field always wins; a video MIME type is next; every
/// other entry is an image. Field order within a kind follows the upstream
/// precedence: `video` > `img_url` > `img` for URLs, the inline `image`
/// payload for base64.
pub fn classify_generation(
    video: &str,
    mime: &str,
    img_url: &str,
    img: &str,
    image: &str,
) -> GenerationMedia {
    if !video.is_empty() {
        return GenerationMedia {
            kind_is_video: true,
            url: convert_to_cdn_url(video),
            base64: String::new(),
        };
    }

    if mime.to_lowercase().contains("video") {
        let raw = first_non_empty(&[video, img_url, img]);
        return GenerationMedia {
            kind_is_video: true,
            url: if raw.is_empty() {
                String::new()
            } else {
                convert_to_cdn_url(raw)
            },
            base64: String::new(),
        };
    }

    let raw_url = first_non_empty(&[img_url, img]);
    let base64 = normalize_base64(image);

    if !base64.is_empty() {
        return GenerationMedia {
            kind_is_video: false,
            url: String::new(),
            base64,
        };
    }

    // A data-URI in the URL-looking field is inline bytes, not a URL; move
    // it over and clear the URL.
    if raw_url.starts_with("data:image") {
        return GenerationMedia {
            kind_is_video: false,
            url: String::new(),
            base64: raw_url.to_string(),
        };
    }

    GenerationMedia {
        kind_is_video: false,
        url: if raw_url.is_empty() {
            String::new()
        } else {
            convert_to_cdn_url(raw_url)
        },
        base64: String::new(),
    }
}

/// Rewrite any storage URL to CDN form.
///
/// Already-CDN URLs and `data:` URIs pass through. Otherwise the last path
/// segment becomes the CDN object key, with `.webp` appended when the
/// filename has no extension. Unparseable input is returned unchanged.
pub fn convert_to_cdn_url(media_url: &str) -> String {
    if media_url.is_empty() {
        return String::new();
    }
    if media_url.starts_with(CDN_BASE) || media_url.starts_with("data:") {
        return media_url.to_string();
    }

    // Drop query string and fragment before taking the last path segment.
    let without_query = media_url
        .split_once('?')
        .map_or(media_url, |(path, _)| path);
    let without_fragment = without_query
        .split_once('#')
        .map_or(without_query, |(path, _)| path);

    let filename = without_fragment.rsplit('/').next().unwrap_or("");
    if filename.is_empty() || filename.contains(':') {
        // No usable path segment (e.g. a bare scheme/host); keep the input.
        return media_url.to_string();
    }

    if filename.contains('.') {
        format!("{CDN_BASE}{filename}")
    } else {
        format!("{CDN_BASE}{filename}.webp")
    }
}

/// Build the CDN URL for a generation id.
pub fn cdn_url_for_id(generation_id: &str) -> String {
    format!("{CDN_BASE}{generation_id}.webp")
}

/// Normalize an inline image payload into a `data:` URI.
///
/// Payloads already in `data:image…` form pass through; bare base64 longer
/// than 50 chars gets the webp prefix; anything shorter is junk and is
/// dropped.
pub fn normalize_base64(raw: &str) -> String {
    let data = raw.trim();
    if data.is_empty() {
        return String::new();
    }
    if data.starts_with("data:image") {
        return data.to_string();
    }
    if data.len() > 50 {
        return format!("data:image/webp;base64,{data}");
    }
    String::new()
}

fn first_non_empty<'a>(values: &[&'a str]) -> &'a str {
    values
        .iter()
        .copied()
        .find(|v| !v.trim().is_empty())
        .unwrap_or("")
}
