use base64::{engine::general_purpose::STANDARD, Engine};

/// Decoded 8-bit RGB raster ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image payload is empty")]
    Empty,
    #[error("data URL is missing its base64 marker")]
    UnsupportedDataUrl,
    #[error("image payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image has zero width or height")]
    ZeroSized,
}

impl RasterImage {
    pub fn from_rgb(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::ZeroSized);
        }
        Ok(Self { width, height, rgb })
    }

    /// Decodes PNG or JPEG bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        let decoded = image::load_from_memory(bytes)?.to_rgb8();
        let (width, height) = decoded.dimensions();
        Self::from_rgb(width, height, decoded.into_raw())
    }

    /// Accepts `data:image/...;base64,<payload>` or a bare base64 string.
    pub fn from_payload(payload: &str) -> Result<Self, ImageError> {
        let bytes = payload_bytes(payload)?;
        Self::decode(&bytes)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgb(&self) -> &[u8] {
        &self.rgb
    }

    /// Height that keeps the aspect ratio at the given display width.
    pub fn scaled_height(&self, display_width: f32) -> f32 {
        self.height as f32 * display_width / self.width as f32
    }
}

/// Encodes raw image bytes the way capture devices hand frames over.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

pub fn payload_bytes(payload: &str) -> Result<Vec<u8>, ImageError> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Err(ImageError::Empty);
    }

    let encoded = match trimmed.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .ok_or(ImageError::UnsupportedDataUrl)?;
            if !header.ends_with(";base64") {
                return Err(ImageError::UnsupportedDataUrl);
            }
            data
        }
        None => trimmed,
    };

    Ok(STANDARD.decode(encoded)?)
}
