//! Attendee capture.
//!
//! This module collects the attendee form (name and ID) together with a
//! signature, then hands a complete [`AttendeeRecord`] to the store.
//!
//! Signatures come from a [`SignatureSource`]: either a [`SignaturePad`]
//! that records freehand strokes and rasterizes them to PNG, or an
//! [`ImportedSignature`] wrapping an existing PNG file.

pub mod raster;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::attendee::AttendeeRecord;
use crate::config::CaptureConfig;
use crate::error::{Error, Result};
use crate::signature::{encode_png, to_data_url, SignatureImage};
use crate::storage::ItemStore;
use crate::store::{AttendeeStore, Persisted};

use raster::Canvas;

/// A position on the signature pad, in pixels from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal offset.
    pub x: f32,
    /// Vertical offset.
    pub y: f32,
}

/// One continuous pen-down movement.
pub type Stroke = Vec<Point>;

/// Something that can provide a signature for a submission.
pub trait SignatureSource {
    /// True if there is nothing to sign with.
    fn is_empty(&self) -> bool;

    /// Encode the current signature as a PNG data URL.
    ///
    /// Repeated calls without intervening changes return identical output.
    ///
    /// # Errors
    ///
    /// Returns an error if the signature cannot be encoded.
    fn signature(&self) -> Result<String>;

    /// Discard the current signature.
    fn clear(&mut self);
}

/// Freehand signature surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SignaturePad {
    width: u32,
    height: u32,
    pen_width: f32,
    pen_color: [u8; 3],
    strokes: Vec<Stroke>,
}

impl SignaturePad {
    /// Create an empty pad with a black 2.5 px pen.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pen_width: 2.5,
            pen_color: [0, 0, 0],
            strokes: Vec::new(),
        }
    }

    /// Create an empty pad from configuration.
    #[must_use]
    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(config.width, config.height).with_pen(config.pen_width, config.pen_rgb())
    }

    /// Set the pen width and color.
    #[must_use]
    pub fn with_pen(mut self, width: f32, color: [u8; 3]) -> Self {
        self.pen_width = width;
        self.pen_color = color;
        self
    }

    /// Put the pen down at `point`, starting a new stroke.
    pub fn begin_stroke(&mut self, point: Point) {
        self.strokes.push(vec![point]);
    }

    /// Move the pen to `point`, continuing the current stroke.
    pub fn line_to(&mut self, point: Point) {
        match self.strokes.last_mut() {
            Some(stroke) => stroke.push(point),
            None => self.begin_stroke(point),
        }
    }

    /// Add a whole stroke. Empty strokes are ignored.
    pub fn add_stroke(&mut self, points: impl IntoIterator<Item = Point>) {
        let stroke: Stroke = points.into_iter().collect();
        if !stroke.is_empty() {
            self.strokes.push(stroke);
        }
    }

    /// Add strokes from JSON of the form `[[{"x": 1, "y": 2}, ...], ...]`.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` does not describe a list of strokes.
    pub fn load_strokes(&mut self, json: &str) -> Result<()> {
        let strokes: Vec<Stroke> = serde_json::from_str(json)?;
        for stroke in strokes {
            self.add_stroke(stroke);
        }
        debug!("Loaded {} strokes", self.strokes.len());
        Ok(())
    }

    /// Recorded strokes.
    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// Rasterize the recorded strokes.
    #[must_use]
    pub fn render(&self) -> Canvas {
        let mut canvas = Canvas::new(self.width, self.height);
        for stroke in &self.strokes {
            canvas.stroke_path(stroke, self.pen_width);
        }
        canvas
    }
}

impl SignatureSource for SignaturePad {
    fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    fn signature(&self) -> Result<String> {
        let canvas = self.render();
        let png = encode_png(
            canvas.width(),
            canvas.height(),
            &canvas.to_rgba(self.pen_color),
        )?;
        Ok(to_data_url(&png))
    }

    fn clear(&mut self) {
        self.strokes.clear();
    }
}

/// A signature taken from an existing PNG image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportedSignature {
    png: Vec<u8>,
}

impl ImportedSignature {
    /// Wrap PNG bytes, checking that they decode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SignatureDecode`] if `png` is not a usable PNG.
    pub fn from_png(png: Vec<u8>) -> Result<Self> {
        SignatureImage::from_png(&png)?;
        Ok(Self { png })
    }

    /// Read and check a PNG file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a usable PNG.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_png(std::fs::read(path)?)
    }
}

impl SignatureSource for ImportedSignature {
    fn is_empty(&self) -> bool {
        self.png.is_empty()
    }

    fn signature(&self) -> Result<String> {
        Ok(to_data_url(&self.png))
    }

    fn clear(&mut self) {
        self.png.clear();
    }
}

/// User-entered attendee details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendeeForm {
    /// Full name.
    pub name: String,
    /// Identification number.
    pub id_number: String,
}

impl AttendeeForm {
    /// Create a form from its two fields.
    #[must_use]
    pub fn new(name: impl Into<String>, id_number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id_number: id_number.into(),
        }
    }

    /// Check that both fields have content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first empty field.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation { field: "name" });
        }
        if self.id_number.trim().is_empty() {
            return Err(Error::Validation { field: "id_number" });
        }
        Ok(())
    }
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// The record that was appended.
    pub record: AttendeeRecord,
    /// Whether the updated list reached storage.
    pub persisted: Persisted,
}

/// Create a record from the form and signature and append it to the store.
///
/// The signature is left empty when `signature.is_empty()`.
///
/// # Errors
///
/// Returns [`Error::Validation`] if the name or ID is blank, in which case the
/// store is untouched. Signature encoding and duplicate-id errors are also
/// propagated.
pub fn submit<S: ItemStore>(
    form: &AttendeeForm,
    signature: &dyn SignatureSource,
    store: &mut AttendeeStore<S>,
) -> Result<Submission> {
    form.validate()?;

    let signature_image = if signature.is_empty() {
        String::new()
    } else {
        signature.signature()?
    };

    let record = AttendeeRecord::new(form.name.trim(), form.id_number.trim(), signature_image);
    let persisted = store.append(record.clone())?;
    info!(
        "Registered attendee {} (signature: {})",
        record.id,
        record.has_signature()
    );

    Ok(Submission { record, persisted })
}
