//! Minimal PDF drawing surface over `lopdf`.
//!
//! Callers work in millimetres from the top-left corner, like the layout
//! module; conversion to PDF user space (points, bottom-left origin) happens
//! here. All pages share one resource dictionary holding the two Helvetica
//! faces and every image added to the document.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use super::layout::Rect;
use super::metrics::{encode_win_ansi, Font};
use super::PT_PER_MM;
use crate::error::Result;
use crate::signature::SignatureImage;

/// Handle to an image stored in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHandle(usize);

/// A PDF under construction.
#[derive(Debug)]
pub struct PdfWriter {
    doc: Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    page_width: f32,
    page_height: f32,
    page_ids: Vec<ObjectId>,
    images: Vec<ObjectId>,
    operations: Option<Vec<Operation>>,
}

impl PdfWriter {
    /// Start an empty document with pages of the given size in millimetres.
    #[must_use]
    pub fn new(page_width: f32, page_height: f32) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let resources_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            resources_id,
            page_width,
            page_height,
            page_ids: Vec::new(),
            images: Vec::new(),
            operations: None,
        }
    }

    /// Finish the current page, if any, and start a new one.
    pub fn add_page(&mut self) -> Result<()> {
        self.finish_page()?;
        self.operations = Some(Vec::new());
        Ok(())
    }

    /// Number of pages started so far.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_ids.len() + usize::from(self.operations.is_some())
    }

    /// Draw `text` with its baseline at (`x`, `y`).
    pub fn text(&mut self, x: f32, y: f32, font: Font, size: f32, color: [u8; 3], text: &str) {
        let (px, py) = self.to_pdf(x, y);
        let ops = [
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.resource_name().into(), Object::Real(size)]),
            fill_color(color),
            Operation::new("Td", vec![Object::Real(px), Object::Real(py)]),
            Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(text))]),
            Operation::new("ET", vec![]),
        ];
        self.push(ops);
    }

    /// Fill `rect` with a solid color.
    pub fn fill_rect(&mut self, rect: Rect, color: [u8; 3]) {
        let ops = [
            Operation::new("q", vec![]),
            fill_color(color),
            self.rect_op(rect),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ];
        self.push(ops);
    }

    /// Outline `rect`.
    pub fn stroke_rect(&mut self, rect: Rect, color: [u8; 3], line_width: f32) {
        let [r, g, b] = unit_rgb(color);
        let ops = [
            Operation::new("q", vec![]),
            Operation::new("w", vec![Object::Real(line_width * PT_PER_MM)]),
            Operation::new("RG", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
            self.rect_op(rect),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ];
        self.push(ops);
    }

    /// Store an image in the document. Transparency becomes a soft mask.
    pub fn add_image(&mut self, image: &SignatureImage) -> ImageHandle {
        let width = i64::from(image.width());
        let height = i64::from(image.height());

        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
        };
        if let Some(alpha) = image.alpha() {
            let mask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width,
                    "Height" => height,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8_i64,
                },
                alpha.to_vec(),
            );
            dict.set("SMask", self.doc.add_object(mask));
        }

        let id = self.doc.add_object(Stream::new(dict, image.rgb().to_vec()));
        self.images.push(id);
        ImageHandle(self.images.len() - 1)
    }

    /// Paint a stored image into `rect`.
    pub fn draw_image(&mut self, image: ImageHandle, rect: Rect) {
        let (x, y) = self.to_pdf(rect.x, rect.bottom());
        let ops = [
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(rect.width * PT_PER_MM),
                    Object::Real(0.0),
                    Object::Real(0.0),
                    Object::Real(rect.height * PT_PER_MM),
                    Object::Real(x),
                    Object::Real(y),
                ],
            ),
            Operation::new("Do", vec![image_name(image).into()]),
            Operation::new("Q", vec![]),
        ];
        self.push(ops);
    }

    /// Serialize the document.
    ///
    /// # Errors
    ///
    /// Returns an error if a content stream cannot be encoded or the document
    /// cannot be written.
    pub fn finish(mut self, title: &str) -> Result<Vec<u8>> {
        self.finish_page()?;

        let mut xobjects = Dictionary::new();
        for (index, &id) in self.images.iter().enumerate() {
            xobjects.set(image_name(ImageHandle(index)), id);
        }
        let mut fonts = Dictionary::new();
        for font in [Font::Regular, Font::Bold] {
            let id = self.doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_name(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(font.resource_name(), id);
        }
        self.doc.objects.insert(
            self.resources_id,
            Object::Dictionary(dictionary! {
                "Font" => fonts,
                "XObject" => xobjects,
            }),
        );

        let kids: Vec<Object> = self.page_ids.iter().map(|&id| id.into()).collect();
        let count = i64::try_from(kids.len()).unwrap_or(i64::MAX);
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.doc.add_object(dictionary! {
            "Title" => Object::string_literal(encode_win_ansi(title)),
            "Producer" => Object::string_literal(concat!("checkin ", env!("CARGO_PKG_VERSION"))),
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.trailer.set("Info", info_id);
        self.doc.compress();

        let mut bytes = Vec::new();
        self.doc.save_to(&mut bytes)?;
        Ok(bytes)
    }

    fn finish_page(&mut self) -> Result<()> {
        let Some(operations) = self.operations.take() else {
            return Ok(());
        };

        let content = Content { operations };
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => self.resources_id,
            "MediaBox" => vec![
                0_i64.into(),
                0_i64.into(),
                Object::Real(self.page_width * PT_PER_MM),
                Object::Real(self.page_height * PT_PER_MM),
            ],
        });
        self.page_ids.push(page_id);
        Ok(())
    }

    fn push(&mut self, ops: impl IntoIterator<Item = Operation>) {
        self.operations.get_or_insert_with(Vec::new).extend(ops);
    }

    fn to_pdf(&self, x: f32, y: f32) -> (f32, f32) {
        (x * PT_PER_MM, (self.page_height - y) * PT_PER_MM)
    }

    fn rect_op(&self, rect: Rect) -> Operation {
        let (x, y) = self.to_pdf(rect.x, rect.bottom());
        Operation::new(
            "re",
            vec![
                Object::Real(x),
                Object::Real(y),
                Object::Real(rect.width * PT_PER_MM),
                Object::Real(rect.height * PT_PER_MM),
            ],
        )
    }
}

fn image_name(image: ImageHandle) -> String {
    format!("Im{}", image.0 + 1)
}

fn unit_rgb(color: [u8; 3]) -> [f32; 3] {
    color.map(|c| f32::from(c) / 255.0)
}

fn fill_color(color: [u8; 3]) -> Operation {
    let [r, g, b] = unit_rgb(color);
    Operation::new("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::encode_png;

    fn count_images(bytes: &[u8], color_space: &[u8]) -> usize {
        let doc = Document::load_mem(bytes).unwrap();
        doc.objects
            .values()
            .filter(|obj| match obj {
                Object::Stream(stream) => {
                    stream.dict.get(b"Subtype").ok() == Some(&Object::Name(b"Image".to_vec()))
                        && stream.dict.get(b"ColorSpace").ok()
                            == Some(&Object::Name(color_space.to_vec()))
                }
                _ => false,
            })
            .count()
    }

    fn image(alpha: u8) -> SignatureImage {
        let rgba: Vec<u8> = (0..6).flat_map(|_| [0, 0, 0, alpha]).collect();
        SignatureImage::from_png(&encode_png(3, 2, &rgba).unwrap()).unwrap()
    }

    #[test]
    fn test_empty_document_has_no_pages() {
        let writer = PdfWriter::new(210.0, 297.0);
        assert_eq!(writer.page_count(), 0);
        let bytes = writer.finish("t").unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
    }

    #[test]
    fn test_pages_are_written() {
        let mut writer = PdfWriter::new(210.0, 297.0);
        writer.add_page().unwrap();
        writer.text(14.0, 22.0, Font::Bold, 18.0, [0, 0, 0], "Título");
        writer.add_page().unwrap();
        writer.fill_rect(Rect::new(10.0, 10.0, 50.0, 8.0), [41, 128, 185]);
        assert_eq!(writer.page_count(), 2);

        let bytes = writer.finish("Registro").unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_transparent_image_gets_soft_mask() {
        let mut writer = PdfWriter::new(210.0, 297.0);
        writer.add_page().unwrap();
        let handle = writer.add_image(&image(128));
        writer.draw_image(handle, Rect::new(20.0, 20.0, 30.0, 20.0));

        let bytes = writer.finish("t").unwrap();
        assert_eq!(count_images(&bytes, b"DeviceRGB"), 1);
        assert_eq!(count_images(&bytes, b"DeviceGray"), 1);
    }

    #[test]
    fn test_opaque_image_has_no_mask() {
        let mut writer = PdfWriter::new(210.0, 297.0);
        writer.add_page().unwrap();
        let handle = writer.add_image(&image(255));
        writer.draw_image(handle, Rect::new(20.0, 20.0, 30.0, 20.0));

        let bytes = writer.finish("t").unwrap();
        assert_eq!(count_images(&bytes, b"DeviceRGB"), 1);
        assert_eq!(count_images(&bytes, b"DeviceGray"), 0);
    }

    #[test]
    fn test_coordinates_flip_to_bottom_left() {
        let writer = PdfWriter::new(210.0, 297.0);
        let (x, y) = writer.to_pdf(0.0, 297.0);
        assert!(x.abs() < 1e-4);
        assert!(y.abs() < 1e-4);

        let (_, top) = writer.to_pdf(0.0, 0.0);
        assert!((top - 297.0 * PT_PER_MM).abs() < 1e-2);
    }
}
