//! Minimal drawing surface over `lopdf`: standard Helvetica faces, filled
//! text, stroked rules and RGB image XObjects. Coordinates passed in are
//! measured from the top-left corner of the page and converted to PDF user
//! space on emission.

use super::images::RasterImage;
use super::layout::PageGeometry;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

impl FontStyle {
    const fn resource_name(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
            Self::Italic => "F3",
        }
    }

    const fn base_font(self) -> &'static str {
        match self {
            Self::Regular => "Helvetica",
            Self::Bold => "Helvetica-Bold",
            Self::Italic => "Helvetica-Oblique",
        }
    }

    const ALL: [Self; 3] = [Self::Regular, Self::Bold, Self::Italic];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Self = Self(0, 0, 0);
    pub const RED: Self = Self(255, 0, 0);

    pub const fn gray(level: u8) -> Self {
        Self(level, level, level)
    }

    /// Parses `#RRGGBB`.
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().strip_prefix('#')?;
        if hex.len() != 6 || !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    fn components(self) -> Vec<Object> {
        [self.0, self.1, self.2]
            .into_iter()
            .map(|channel| Object::Real(f32::from(channel) / 255.0))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub font: FontStyle,
    pub color: Rgb,
}

impl TextStyle {
    pub const fn new(size: f32, font: FontStyle, color: Rgb) -> Self {
        Self { size, font, color }
    }

    /// Baseline-to-baseline distance for wrapped lines.
    pub fn leading(&self) -> f32 {
        self.size * 1.15
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Handle to an image already written into the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    name: String,
    object_id: ObjectId,
}

#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    #[error("failed to compress image data: {0}")]
    Compression(#[source] std::io::Error),
    #[error("image dimensions {width}x{height} do not match {len} bytes of RGB data")]
    ImageData { width: u32, height: u32, len: usize },
    #[error("failed to encode page content: {0}")]
    Content(String),
    #[error("failed to serialize PDF: {0}")]
    Save(String),
}

#[derive(Debug, Default)]
struct PageContent {
    operations: Vec<Operation>,
    images: Vec<ImageHandle>,
}

pub struct PdfCanvas {
    document: Document,
    geometry: PageGeometry,
    pages_id: ObjectId,
    fonts: Dictionary,
    pages: Vec<PageContent>,
    image_count: usize,
}

impl PdfCanvas {
    /// Starts a document with one empty page.
    pub fn new(geometry: PageGeometry) -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();

        let mut fonts = Dictionary::new();
        for style in FontStyle::ALL {
            let font_id = document.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => style.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(style.resource_name(), Object::Reference(font_id));
        }

        Self {
            document,
            geometry,
            pages_id,
            fonts,
            pages: vec![PageContent::default()],
            image_count: 0,
        }
    }

    pub fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn add_page(&mut self) {
        self.pages.push(PageContent::default());
    }

    fn current(&mut self) -> &mut PageContent {
        if self.pages.is_empty() {
            self.pages.push(PageContent::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn to_pdf_y(&self, y: f32) -> f32 {
        self.geometry.height - y
    }

    /// Draws a single line of text with its baseline at `y`.
    pub fn text(&mut self, text: &str, x: f32, y: f32, style: TextStyle, align: TextAlign) {
        let width = super::layout::text_width(text, style.size);
        let x = match align {
            TextAlign::Left => x,
            TextAlign::Center => x - width / 2.0,
            TextAlign::Right => x - width,
        };
        let pdf_y = self.to_pdf_y(y);

        let operations = vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(style.font.resource_name().as_bytes().to_vec()),
                    Object::Real(style.size),
                ],
            ),
            Operation::new("rg", style.color.components()),
            Operation::new("Td", vec![Object::Real(x), Object::Real(pdf_y)]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ];
        self.current().operations.extend(operations);
    }

    /// Draws consecutive left-aligned lines starting at baseline `y`.
    pub fn text_lines(&mut self, lines: &[String], x: f32, y: f32, style: TextStyle) {
        let leading = style.leading();
        for (index, line) in lines.iter().enumerate() {
            self.text(line, x, y + index as f32 * leading, style, TextAlign::Left);
        }
    }

    pub fn horizontal_rule(&mut self, x1: f32, x2: f32, y: f32, color: Rgb, width: f32) {
        let pdf_y = self.to_pdf_y(y);
        let stroke = [
            Operation::new("q", vec![]),
            Operation::new("RG", color.components()),
            Operation::new("w", vec![Object::Real(width)]),
            Operation::new("m", vec![Object::Real(x1), Object::Real(pdf_y)]),
            Operation::new("l", vec![Object::Real(x2), Object::Real(pdf_y)]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ];
        self.current().operations.extend(stroke);
    }

    /// Writes the image into the document so it can be placed on any page.
    pub fn embed_image(&mut self, image: &RasterImage) -> Result<ImageHandle, CanvasError> {
        let expected = image.width() as usize * image.height() as usize * 3;
        if image.rgb().len() != expected {
            return Err(CanvasError::ImageData {
                width: image.width(),
                height: image.height(),
                len: image.rgb().len(),
            });
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(image.rgb())
            .map_err(CanvasError::Compression)?;
        let compressed = encoder.finish().map_err(CanvasError::Compression)?;

        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(image.width()),
                "Height" => i64::from(image.height()),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            compressed,
        );

        self.image_count += 1;
        Ok(ImageHandle {
            name: format!("Im{}", self.image_count),
            object_id: self.document.add_object(stream),
        })
    }

    /// Places an embedded image with its top-left corner at (`x`, `y`).
    pub fn draw_image(&mut self, handle: &ImageHandle, x: f32, y: f32, width: f32, height: f32) {
        let bottom = self.to_pdf_y(y + height);
        let page = self.current();
        if !page.images.contains(handle) {
            page.images.push(handle.clone());
        }
        page.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(width),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(height),
                    Object::Real(x),
                    Object::Real(bottom),
                ],
            ),
            Operation::new("Do", vec![Object::Name(handle.name.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ]);
    }

    /// Assembles the page tree and serializes the document.
    pub fn finish(mut self) -> Result<Vec<u8>, CanvasError> {
        let font_resources = self.document.add_object(self.fonts.clone());
        let mut kids = Vec::with_capacity(self.pages.len());

        for page in std::mem::take(&mut self.pages) {
            let content = Content {
                operations: page.operations,
            };
            let encoded = content
                .encode()
                .map_err(|err| CanvasError::Content(err.to_string()))?;
            let content_id = self
                .document
                .add_object(Stream::new(Dictionary::new(), encoded));

            let mut xobjects = Dictionary::new();
            for image in &page.images {
                xobjects.set(image.name.as_str(), Object::Reference(image.object_id));
            }

            let page_id = self.document.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => self.pages_id,
                "MediaBox" => vec![
                    0.into(),
                    0.into(),
                    Object::Real(self.geometry.width),
                    Object::Real(self.geometry.height),
                ],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => font_resources,
                    "XObject" => xobjects,
                },
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.document.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        self.document
            .save_to(&mut buffer)
            .map_err(|err| CanvasError::Save(err.to_string()))?;
        Ok(buffer)
    }
}

/// Helvetica is set up with WinAnsiEncoding; characters outside Latin-1 are
/// replaced with `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            '\u{2018}' | '\u{2019}' => b'\'',
            '\u{201C}' | '\u{201D}' => b'"',
            '\u{2013}' | '\u{2014}' => b'-',
            ch if (ch as u32) < 0x100 => ch as u32 as u8,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_accent_hex() {
        assert_eq!(Rgb::from_hex("#009639"), Some(Rgb(0, 150, 57)));
        assert_eq!(Rgb::from_hex("009639"), None);
        assert_eq!(Rgb::from_hex("#00963"), None);
        assert_eq!(Rgb::from_hex("#zz9639"), None);
    }

    #[test]
    fn encodes_text_for_standard_fonts() {
        assert_eq!(encode_win_ansi("Café \u{2019}A\u{2019}"), b"Caf\xe9 'A'".to_vec());
        assert_eq!(encode_win_ansi("\u{4e2d}"), b"?".to_vec());
    }

    #[test]
    fn finished_canvas_loads_back_with_all_pages() {
        let mut canvas = PdfCanvas::new(PageGeometry::a4());
        canvas.text(
            "Site Inspection Report",
            297.0,
            40.0,
            TextStyle::new(20.0, FontStyle::Bold, Rgb(0, 150, 57)),
            TextAlign::Center,
        );
        let image = RasterImage::from_rgb(2, 2, vec![255; 12]).expect("valid image");
        let handle = canvas.embed_image(&image).expect("embeds");
        canvas.add_page();
        canvas.draw_image(&handle, 40.0, 40.0, 100.0, 100.0);
        canvas.horizontal_rule(40.0, 555.0, 200.0, Rgb::BLACK, 1.0);

        assert_eq!(canvas.page_count(), 2);
        let bytes = canvas.finish().expect("serializes");
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let document = Document::load_mem(&bytes).expect("valid pdf");
        assert_eq!(document.get_pages().len(), 2);
    }

    #[test]
    fn rejects_mismatched_image_buffer() {
        let mut canvas = PdfCanvas::new(PageGeometry::a4());
        let image = RasterImage::from_rgb(4, 4, vec![0; 3]).expect("dimensions non-zero");
        assert!(matches!(
            canvas.embed_image(&image),
            Err(CanvasError::ImageData { .. })
        ));
    }
}
