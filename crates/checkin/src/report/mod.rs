//! Attendance sheet export.
//!
//! An export decodes every signature, lays the table out on A4 pages and
//! only then draws the PDF. An empty attendee list produces nothing.

pub mod layout;
pub mod metrics;
pub mod pdf;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};
use tracing::{debug, info, warn};

use crate::attendee::AttendeeRecord;
use crate::config::ReportConfig;
use crate::error::{Error, Result};
use crate::signature::SignatureImage;

use layout::{
    layout_table, Column, ColumnWidth, PageGeometry, TableLayout, TableData, TableStyle,
};
use metrics::Font;
use pdf::{ImageHandle, PdfWriter};

/// Points per millimetre.
pub const PT_PER_MM: f32 = 72.0 / 25.4;

/// File name the sheet is saved under.
pub const REPORT_FILE_NAME: &str = "registro_asistencia.pdf";

/// Document title.
pub const TITLE: &str = "Registro de Asistencia a Capacitación";

/// Prefix of the generation date line.
pub const GENERATED_LABEL: &str = "Fecha de generación";

/// Table column labels, left to right.
pub const COLUMN_HEADERS: [&str; 4] = [
    "Nombre y Apellido",
    "Número de ID",
    "Fecha de Registro",
    "Firma",
];

/// Column holding the signature images.
pub const SIGNATURE_COLUMN: usize = 3;

/// Width of the signature column in millimetres.
pub const SIGNATURE_COLUMN_WIDTH: f32 = 40.0;

const TITLE_POSITION: (f32, f32) = (14.0, 22.0);
const TITLE_SIZE: f32 = 18.0;
const SUBTITLE_POSITION: (f32, f32) = (14.0, 30.0);
const SUBTITLE_SIZE: f32 = 11.0;
const SUBTITLE_COLOR: [u8; 3] = [100, 100, 100];

/// Format a registration time, e.g. `5/3/2024, 9:07:05`.
pub fn format_registration<Tz>(at: &DateTime<Utc>, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    at.with_timezone(zone).format("%-d/%-m/%Y, %-H:%M:%S").to_string()
}

/// Format a generation date, e.g. `5/3/2024`.
pub fn format_generation_date<Tz>(at: &DateTime<Utc>, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    at.with_timezone(zone).format("%-d/%-m/%Y").to_string()
}

/// A fully laid out sheet, ready to draw.
#[derive(Debug, Clone)]
pub struct AttendanceSheet {
    /// Text of the generation date line.
    pub subtitle: String,
    /// Table geometry.
    pub table: TableLayout,
    images: Vec<Option<SignatureImage>>,
}

impl AttendanceSheet {
    /// Number of pages the sheet spans.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.table.pages.len()
    }

    /// Number of rows that carry a signature image.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.images.iter().flatten().count()
    }

    /// Decoded signature of the body row at `index`.
    #[must_use]
    pub fn image(&self, index: usize) -> Option<&SignatureImage> {
        self.images.get(index).and_then(Option::as_ref)
    }
}

/// A rendered PDF.
#[derive(Debug, Clone)]
pub struct Report {
    bytes: Vec<u8>,
    pages: usize,
}

impl Report {
    /// Raw PDF bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of pages.
    #[must_use]
    pub fn pages(&self) -> usize {
        self.pages
    }

    /// Write the report to [`REPORT_FILE_NAME`] inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the file
    /// cannot be written.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir).map_err(|e| Error::DirectoryCreate {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = dir.join(REPORT_FILE_NAME);
        fs::write(&path, &self.bytes)?;
        info!("Wrote {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

/// Builds the attendance sheet.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    page: PageGeometry,
    style: TableStyle,
    offset: Option<FixedOffset>,
    generated_at: Option<DateTime<Utc>>,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportBuilder {
    /// Builder with A4 pages, the default table style and local time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            page: PageGeometry::a4(),
            style: TableStyle::default(),
            offset: None,
            generated_at: None,
        }
    }

    /// Builder configured from the `[report]` section.
    #[must_use]
    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new().with_min_row_height(config.min_row_height)
    }

    /// Format times in a fixed offset instead of the local time zone.
    #[must_use]
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Use a fixed generation time instead of now.
    #[must_use]
    pub fn with_generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = Some(at);
        self
    }

    /// Minimum body row height in millimetres.
    #[must_use]
    pub fn with_min_row_height(mut self, height: f32) -> Self {
        self.style.min_row_height = height;
        self
    }

    /// Decode signatures and lay out the sheet. `None` when there are no records.
    #[must_use]
    pub fn layout(&self, records: &[AttendeeRecord]) -> Option<AttendanceSheet> {
        if records.is_empty() {
            return None;
        }

        let images: Vec<Option<SignatureImage>> = records.iter().map(decode_signature).collect();

        let columns = COLUMN_HEADERS
            .iter()
            .enumerate()
            .map(|(c, header)| Column {
                header: (*header).to_string(),
                width: if c == SIGNATURE_COLUMN {
                    ColumnWidth::Fixed(SIGNATURE_COLUMN_WIDTH)
                } else {
                    ColumnWidth::Auto
                },
            })
            .collect();
        let rows = records
            .iter()
            .map(|r| {
                vec![
                    r.name.clone(),
                    r.id_number.clone(),
                    self.registration_text(&r.registered_at),
                    String::new(),
                ]
            })
            .collect();
        let data = TableData {
            columns,
            rows,
            images: images
                .iter()
                .map(|img| img.as_ref().map(|i| (i.width(), i.height())))
                .collect(),
            image_column: Some(SIGNATURE_COLUMN),
        };

        let table = layout_table(&self.page, &self.style, &data);
        debug!(
            "Laid out {} rows on {} pages",
            records.len(),
            table.pages.len()
        );

        let generated_at = self.generated_at.unwrap_or_else(Utc::now);
        Some(AttendanceSheet {
            subtitle: format!("{GENERATED_LABEL}: {}", self.generation_text(&generated_at)),
            table,
            images,
        })
    }

    /// Render the sheet for `records`. `None` when there are no records.
    ///
    /// # Errors
    ///
    /// Returns an error if the PDF cannot be serialized.
    pub fn build(&self, records: &[AttendeeRecord]) -> Result<Option<Report>> {
        match self.layout(records) {
            Some(sheet) => self.render(&sheet).map(Some),
            None => Ok(None),
        }
    }

    /// Render and save the sheet into `dir`.
    ///
    /// Returns the written path, or `None` without touching the file system
    /// when there are no records.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub fn export(&self, records: &[AttendeeRecord], dir: &Path) -> Result<Option<PathBuf>> {
        let Some(report) = self.build(records)? else {
            debug!("No attendees to export");
            return Ok(None);
        };
        report.save(dir).map(Some)
    }

    /// Draw a laid out sheet.
    ///
    /// # Errors
    ///
    /// Returns an error if the PDF cannot be serialized.
    pub fn render(&self, sheet: &AttendanceSheet) -> Result<Report> {
        let style = &self.style;
        let mut pdf = PdfWriter::new(self.page.width, self.page.height);
        let handles: Vec<Option<ImageHandle>> = sheet
            .images
            .iter()
            .map(|img| img.as_ref().map(|i| pdf.add_image(i)))
            .collect();

        for (n, page) in sheet.table.pages.iter().enumerate() {
            pdf.add_page()?;
            if n == 0 {
                let (x, y) = TITLE_POSITION;
                pdf.text(x, y, Font::Regular, TITLE_SIZE, [0, 0, 0], TITLE);
                let (x, y) = SUBTITLE_POSITION;
                pdf.text(x, y, Font::Regular, SUBTITLE_SIZE, SUBTITLE_COLOR, &sheet.subtitle);
            }

            for row in &page.rows {
                if let Some(fill) = row.fill {
                    pdf.fill_rect(row.rect, fill);
                }
                for cell in &row.cells {
                    pdf.stroke_rect(cell.rect, style.line_color, style.line_width);
                    for (line, &baseline) in cell.lines.iter().zip(&cell.baselines) {
                        if !line.is_empty() {
                            pdf.text(
                                cell.text_x,
                                baseline,
                                row.font,
                                style.font_size,
                                row.text_color,
                                line,
                            );
                        }
                    }
                }

                let handle = row
                    .index
                    .and_then(|i| handles.get(i).copied().flatten());
                if let (Some(handle), Some(rect)) = (handle, row.image) {
                    pdf.draw_image(handle, rect);
                }
            }
        }

        let pages = pdf.page_count();
        let bytes = pdf.finish(TITLE)?;
        info!(
            "Rendered attendance sheet: {} pages, {} signatures",
            pages,
            sheet.image_count()
        );
        Ok(Report { bytes, pages })
    }

    fn registration_text(&self, at: &DateTime<Utc>) -> String {
        match self.offset {
            Some(offset) => format_registration(at, &offset),
            None => format_registration(at, &Local),
        }
    }

    fn generation_text(&self, at: &DateTime<Utc>) -> String {
        match self.offset {
            Some(offset) => format_generation_date(at, &offset),
            None => format_generation_date(at, &Local),
        }
    }
}

fn decode_signature(record: &AttendeeRecord) -> Option<SignatureImage> {
    if !record.has_signature() {
        return None;
    }
    match SignatureImage::from_data_url(&record.signature_image) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!("Skipping signature of attendee {}: {}", record.id, e);
            None
        }
    }
}
