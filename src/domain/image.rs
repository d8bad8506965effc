use bytes::Bytes;

/// Image formats the validator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SIGNATURE: [u8; 3] = [0xFF, 0xD8, 0xFF];

impl ImageFormat {
    /// Identify a format from its leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&PNG_SIGNATURE) {
            Some(Self::Png)
        } else if bytes.starts_with(&JPEG_SIGNATURE) {
            Some(Self::Jpeg)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::WebP)
        } else {
            None
        }
    }

    /// Map a `Content-Type` header to a format, ignoring parameters.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }
}

/// An image whose body passed the magic-byte check for its declared type.
#[derive(Debug, Clone)]
pub struct ValidatedImage {
    pub bytes: Bytes,
    pub content_type: String,
    pub source_url: String,
    pub format: ImageFormat,
}

impl ValidatedImage {
    /// Build a validated image, or `None` when the body does not match the
    /// declared content type.
    pub fn validate(source_url: &str, content_type: &str, bytes: Bytes) -> Option<Self> {
        let declared = ImageFormat::from_content_type(content_type)?;
        let detected = ImageFormat::sniff(&bytes)?;
        if declared != detected {
            return None;
        }
        Some(Self {
            bytes,
            content_type: content_type.to_string(),
            source_url: source_url.to_string(),
            format: detected,
        })
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}
