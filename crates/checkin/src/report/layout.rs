//! Table geometry.
//!
//! Everything here is in millimetres with the origin at the top-left corner
//! of the page, y growing downwards. The layout is computed completely before
//! anything is drawn: column widths first, then row heights, then pages.

use super::metrics::{longest_word_width, natural_width, wrap_text, Font};
use super::PT_PER_MM;

/// Height removed from a row before sizing its image.
pub const IMAGE_VERTICAL_PADDING: f32 = 4.0;

/// Gap between the top of a cell and its image.
pub const IMAGE_TOP_PADDING: f32 = 2.0;

const EPSILON: f32 = 1e-4;

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Create a rectangle.
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Place an image of the given natural size inside `cell`.
///
/// The image takes the cell height minus [`IMAGE_VERTICAL_PADDING`], keeps
/// its aspect ratio, is centered horizontally and sits
/// [`IMAGE_TOP_PADDING`] below the cell top. Returns `None` when the image
/// has no pixels or the cell leaves no room for it.
#[must_use]
pub fn fit_image(cell: Rect, natural_width: u32, natural_height: u32) -> Option<Rect> {
    if natural_width == 0 || natural_height == 0 {
        return None;
    }
    let height = cell.height - IMAGE_VERTICAL_PADDING;
    if height <= 0.0 {
        return None;
    }

    let aspect_ratio = natural_width as f32 / natural_height as f32;
    let width = height * aspect_ratio;
    Some(Rect {
        x: cell.x + (cell.width - width) / 2.0,
        y: cell.y + IMAGE_TOP_PADDING,
        width,
        height,
    })
}

/// Page size and the area the table may occupy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Page width.
    pub width: f32,
    /// Page height.
    pub height: f32,
    /// Left margin.
    pub margin_left: f32,
    /// Right margin.
    pub margin_right: f32,
    /// Top margin of continuation pages.
    pub margin_top: f32,
    /// Bottom margin.
    pub margin_bottom: f32,
    /// Where the table starts on the first page.
    pub start_y: f32,
}

impl PageGeometry {
    /// A4 portrait with 40 pt margins, table starting at 35 mm.
    #[must_use]
    pub fn a4() -> Self {
        let margin = 40.0 / PT_PER_MM;
        Self {
            width: 210.0,
            height: 297.0,
            margin_left: margin,
            margin_right: margin,
            margin_top: margin,
            margin_bottom: margin,
            start_y: 35.0,
        }
    }

    /// Horizontal space between the margins.
    #[must_use]
    pub fn content_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    /// Lowest y a row may reach.
    #[must_use]
    pub fn content_bottom(&self) -> f32 {
        self.height - self.margin_bottom
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

/// Fonts, spacing and colors of the table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableStyle {
    /// Font size in points.
    pub font_size: f32,
    /// Line height as a multiple of the font size.
    pub line_height_factor: f32,
    /// Padding on every side of a cell's text.
    pub cell_padding: f32,
    /// Minimum height of body rows.
    pub min_row_height: f32,
    /// Header row background.
    pub head_fill: [u8; 3],
    /// Header row text color.
    pub head_text: [u8; 3],
    /// Body text color.
    pub body_text: [u8; 3],
    /// Background of every other body row, starting with the first.
    pub alternate_fill: [u8; 3],
    /// Grid line color.
    pub line_color: [u8; 3],
    /// Grid line width.
    pub line_width: f32,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            font_size: 10.0,
            line_height_factor: 1.15,
            cell_padding: 5.0 / PT_PER_MM,
            min_row_height: 0.0,
            head_fill: [41, 128, 185],
            head_text: [255, 255, 255],
            body_text: [20, 20, 20],
            alternate_fill: [245, 245, 245],
            line_color: [200, 200, 200],
            line_width: 0.1,
        }
    }
}

impl TableStyle {
    /// Height of one line of text.
    #[must_use]
    pub fn line_height(&self) -> f32 {
        self.font_size * self.line_height_factor / PT_PER_MM
    }
}

/// How a column gets its width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnWidth {
    /// Share of the leftover width, proportional to content.
    Auto,
    /// Exactly this wide.
    Fixed(f32),
}

/// A table column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Header label.
    pub header: String,
    /// Width rule.
    pub width: ColumnWidth,
}

/// Content to lay out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableData {
    /// Columns, left to right.
    pub columns: Vec<Column>,
    /// Body cell text, one entry per column per row.
    pub rows: Vec<Vec<String>>,
    /// Natural pixel size of each row's image, if it has one.
    pub images: Vec<Option<(u32, u32)>>,
    /// Column that holds the row images.
    pub image_column: Option<usize>,
}

/// A positioned cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellLayout {
    /// Cell bounds.
    pub rect: Rect,
    /// Wrapped text lines.
    pub lines: Vec<String>,
    /// Baseline of each line, text block middle-aligned.
    pub baselines: Vec<f32>,
    /// Left edge of the text.
    pub text_x: f32,
}

/// A positioned row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    /// Body row index, `None` for the header row.
    pub index: Option<usize>,
    /// Row bounds.
    pub rect: Rect,
    /// Cells, left to right.
    pub cells: Vec<CellLayout>,
    /// Text font.
    pub font: Font,
    /// Text color.
    pub text_color: [u8; 3],
    /// Background, `None` to leave the page white.
    pub fill: Option<[u8; 3]>,
    /// Where the row image goes.
    pub image: Option<Rect>,
}

impl RowLayout {
    /// Whether this is a repeated header row.
    #[must_use]
    pub fn is_header(&self) -> bool {
        self.index.is_none()
    }
}

/// Rows placed on one page; the first row is always the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    /// Rows in drawing order.
    pub rows: Vec<RowLayout>,
}

impl PageLayout {
    /// Body rows on this page.
    pub fn body_rows(&self) -> impl Iterator<Item = &RowLayout> {
        self.rows.iter().filter(|r| !r.is_header())
    }
}

/// The whole table, split into pages.
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    /// Width of each column.
    pub column_widths: Vec<f32>,
    /// Pages in order.
    pub pages: Vec<PageLayout>,
}

impl TableLayout {
    /// All body rows across pages, in order.
    pub fn body_rows(&self) -> impl Iterator<Item = &RowLayout> {
        self.pages.iter().flat_map(PageLayout::body_rows)
    }
}

struct MeasuredRow {
    lines: Vec<Vec<String>>,
    height: f32,
}

/// Lay out `table` on pages of the given geometry.
///
/// Rows are never split: a row that does not fit below the previous one
/// starts a new page, which begins with a repeated header row.
#[must_use]
pub fn layout_table(page: &PageGeometry, style: &TableStyle, table: &TableData) -> TableLayout {
    let widths = column_widths(page.content_width(), style, table);

    let headers: Vec<&str> = table.columns.iter().map(|c| c.header.as_str()).collect();
    let head = measure_row(&headers, &widths, Font::Bold, style, 0.0);
    let body: Vec<MeasuredRow> = table
        .rows
        .iter()
        .map(|row| {
            let cells: Vec<&str> = (0..widths.len())
                .map(|c| row.get(c).map_or("", String::as_str))
                .collect();
            measure_row(&cells, &widths, Font::Regular, style, style.min_row_height)
        })
        .collect();

    let head_row = |y: f32| RowLayout {
        index: None,
        rect: Rect::new(page.margin_left, y, widths.iter().sum(), head.height),
        cells: place_cells(&head, y, page.margin_left, &widths, style),
        font: Font::Bold,
        text_color: style.head_text,
        fill: Some(style.head_fill),
        image: None,
    };

    let bottom = page.content_bottom();
    let mut pages = Vec::new();
    let mut current = PageLayout::default();
    let mut page_top = page.start_y;
    current.rows.push(head_row(page_top));
    let mut cursor = page_top + head.height;

    for (index, row) in body.iter().enumerate() {
        let fits = cursor + row.height <= bottom + EPSILON;
        let page_has_rows = current.rows.len() > 1;
        if !fits && (page_has_rows || page_top > page.margin_top) {
            pages.push(std::mem::take(&mut current));
            page_top = page.margin_top;
            current.rows.push(head_row(page_top));
            cursor = page_top + head.height;
        }

        let cells = place_cells(row, cursor, page.margin_left, &widths, style);
        let image = table.image_column.and_then(|column| {
            let (w, h) = table.images.get(index).copied().flatten()?;
            fit_image(cells.get(column)?.rect, w, h)
        });

        current.rows.push(RowLayout {
            index: Some(index),
            rect: Rect::new(page.margin_left, cursor, widths.iter().sum(), row.height),
            cells,
            font: Font::Regular,
            text_color: style.body_text,
            fill: (index % 2 == 0).then_some(style.alternate_fill),
            image,
        });
        cursor += row.height;
    }
    pages.push(current);

    TableLayout {
        column_widths: widths,
        pages,
    }
}

/// Compute column widths filling `available`.
///
/// Fixed columns keep their width. Auto columns share what is left in
/// proportion to their unwrapped content width, but none gets less than its
/// longest word needs.
#[must_use]
pub fn column_widths(available: f32, style: &TableStyle, table: &TableData) -> Vec<f32> {
    let count = table.columns.len();
    let padding = 2.0 * style.cell_padding;
    let mut natural = vec![0.0_f32; count];
    let mut minimum = vec![0.0_f32; count];

    for (c, column) in table.columns.iter().enumerate() {
        let head = (column.header.as_str(), Font::Bold);
        let cells = table
            .rows
            .iter()
            .filter_map(|row| row.get(c))
            .map(|text| (text.as_str(), Font::Regular));
        for (text, font) in std::iter::once(head).chain(cells) {
            natural[c] = natural[c].max(natural_width(text, font, style.font_size) + padding);
            minimum[c] = minimum[c].max(longest_word_width(text, font, style.font_size) + padding);
        }
    }

    let mut widths = vec![0.0_f32; count];
    let mut remaining = available;
    let mut flexible = Vec::new();
    for (c, column) in table.columns.iter().enumerate() {
        match column.width {
            ColumnWidth::Fixed(width) => {
                widths[c] = width;
                remaining -= width;
            }
            ColumnWidth::Auto => flexible.push(c),
        }
    }
    remaining = remaining.max(0.0);

    while !flexible.is_empty() {
        let total: f32 = flexible.iter().map(|&c| natural[c]).sum();
        for &c in &flexible {
            widths[c] = if total > 0.0 {
                natural[c] * remaining / total
            } else {
                remaining / flexible.len() as f32
            };
        }

        let (narrow, rest): (Vec<usize>, Vec<usize>) = flexible
            .iter()
            .copied()
            .partition(|&c| widths[c] + EPSILON < minimum[c]);
        if narrow.is_empty() {
            break;
        }
        for c in narrow {
            widths[c] = minimum[c];
            remaining = (remaining - minimum[c]).max(0.0);
        }
        flexible = rest;
    }

    widths
}

fn measure_row(
    cells: &[&str],
    widths: &[f32],
    font: Font,
    style: &TableStyle,
    min_height: f32,
) -> MeasuredRow {
    let text_width = |w: f32| (w - 2.0 * style.cell_padding).max(0.0);
    let lines: Vec<Vec<String>> = cells
        .iter()
        .zip(widths)
        .map(|(text, &w)| wrap_text(text, font, style.font_size, text_width(w)))
        .collect();

    let tallest = lines.iter().map(Vec::len).max().unwrap_or(1);
    let height = (tallest as f32 * style.line_height() + 2.0 * style.cell_padding).max(min_height);
    MeasuredRow { lines, height }
}

fn place_cells(
    row: &MeasuredRow,
    y: f32,
    left: f32,
    widths: &[f32],
    style: &TableStyle,
) -> Vec<CellLayout> {
    let line_height = style.line_height();
    let size = style.font_size / PT_PER_MM;
    let mut x = left;

    row.lines
        .iter()
        .zip(widths)
        .map(|(lines, &width)| {
            let rect = Rect::new(x, y, width, row.height);
            x += width;

            let block = lines.len() as f32 * line_height;
            let top = y + (row.height - block) / 2.0;
            let baselines = (0..lines.len())
                .map(|i| top + (i as f32 + 0.5) * line_height + 0.35 * size)
                .collect();

            CellLayout {
                rect,
                lines: lines.clone(),
                baselines,
                text_x: rect.x + style.cell_padding,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    fn table_data(rows: usize) -> TableData {
        TableData {
            columns: vec![
                Column {
                    header: "Nombre".to_string(),
                    width: ColumnWidth::Auto,
                },
                Column {
                    header: "ID".to_string(),
                    width: ColumnWidth::Auto,
                },
                Column {
                    header: "Firma".to_string(),
                    width: ColumnWidth::Fixed(40.0),
                },
            ],
            rows: (0..rows)
                .map(|i| vec![format!("Persona {i}"), format!("{i:08}"), String::new()])
                .collect(),
            images: vec![None; rows],
            image_column: Some(2),
        }
    }

    #[test]
    fn test_fit_image_two_to_one() {
        let cell = Rect::new(150.0, 60.0, 40.0, 24.0);
        let placed = fit_image(cell, 400, 200).unwrap();

        assert!(approx(placed.width, 40.0));
        assert!(approx(placed.height, 20.0));
        assert!(approx(placed.x - cell.x, 0.0));
        assert!(approx(placed.y, 62.0));
    }

    #[test]
    fn test_fit_image_centers_narrow_image() {
        let cell = Rect::new(0.0, 0.0, 40.0, 14.0);
        let placed = fit_image(cell, 100, 100).unwrap();

        assert!(approx(placed.width, 10.0));
        assert!(approx(placed.x, 15.0));
    }

    #[test]
    fn test_fit_image_rejects_zero_dimensions() {
        let cell = Rect::new(0.0, 0.0, 40.0, 24.0);
        assert!(fit_image(cell, 100, 0).is_none());
        assert!(fit_image(cell, 0, 100).is_none());
    }

    #[test]
    fn test_fit_image_rejects_short_cell() {
        assert!(fit_image(Rect::new(0.0, 0.0, 40.0, 4.0), 10, 10).is_none());
    }

    #[test]
    fn test_column_widths_fill_content_width() {
        let page = PageGeometry::a4();
        let widths = column_widths(page.content_width(), &TableStyle::default(), &table_data(3));

        assert!(approx(widths[2], 40.0));
        assert!(approx(widths.iter().sum::<f32>(), page.content_width()));
        // Longer content gets the larger share
        assert!(widths[0] > widths[1]);
    }

    #[test]
    fn test_column_widths_respect_longest_word() {
        let style = TableStyle::default();
        let mut table = table_data(1);
        table.rows[0][0] = "word ".repeat(60);
        table.rows[0][1] = "Supercalifragilistic".to_string();

        let widths = column_widths(120.0, &style, &table);
        let needed = longest_word_width("Supercalifragilistic", Font::Regular, style.font_size)
            + 2.0 * style.cell_padding;
        assert!(widths[1] + 1e-3 >= needed);
        assert!(approx(widths.iter().sum::<f32>(), 120.0));
    }

    #[test]
    fn test_rows_keep_input_order() {
        let layout = layout_table(&PageGeometry::a4(), &TableStyle::default(), &table_data(3));
        let indices: Vec<_> = layout.body_rows().map(|r| r.index).collect();
        assert_eq!(indices, vec![Some(0), Some(1), Some(2)]);
        assert_eq!(layout.pages.len(), 1);
        assert!(layout.pages[0].rows[0].is_header());
    }

    #[test]
    fn test_rows_are_stacked_below_header() {
        let layout = layout_table(&PageGeometry::a4(), &TableStyle::default(), &table_data(2));
        let rows = &layout.pages[0].rows;

        assert!(approx(rows[0].rect.y, 35.0));
        assert!(approx(rows[1].rect.y, rows[0].rect.bottom()));
        assert!(approx(rows[2].rect.y, rows[1].rect.bottom()));
    }

    #[test]
    fn test_single_line_row_height() {
        let style = TableStyle::default();
        let layout = layout_table(&PageGeometry::a4(), &style, &table_data(1));
        let row = layout.body_rows().next().unwrap();

        let expected = style.line_height() + 2.0 * style.cell_padding;
        assert!(approx(row.rect.height, expected));
    }

    #[test]
    fn test_min_row_height_applies_to_body_only() {
        let style = TableStyle {
            min_row_height: 24.0,
            ..TableStyle::default()
        };
        let layout = layout_table(&PageGeometry::a4(), &style, &table_data(1));

        assert!(layout.pages[0].rows[0].rect.height < 24.0);
        assert!(approx(layout.body_rows().next().unwrap().rect.height, 24.0));
    }

    #[test]
    fn test_image_placed_in_signature_column() {
        let style = TableStyle {
            min_row_height: 24.0,
            ..TableStyle::default()
        };
        let mut table = table_data(2);
        table.images = vec![Some((300, 150)), None];

        let layout = layout_table(&PageGeometry::a4(), &style, &table);
        let rows: Vec<_> = layout.body_rows().collect();
        let cell = rows[0].cells[2].rect;
        let image = rows[0].image.unwrap();

        assert!(approx(image.width, 40.0));
        assert!(approx(image.height, 20.0));
        assert!(approx(image.x, cell.x));
        assert!(approx(image.y, cell.y + 2.0));
        assert!(rows[1].image.is_none());
    }

    #[test]
    fn test_rows_never_split_across_pages() {
        let style = TableStyle {
            min_row_height: 30.0,
            ..TableStyle::default()
        };
        let page = PageGeometry::a4();
        let layout = layout_table(&page, &style, &table_data(20));

        assert!(layout.pages.len() > 1);
        assert_eq!(layout.body_rows().count(), 20);
        for p in &layout.pages {
            assert!(p.rows[0].is_header());
            for row in &p.rows {
                assert!(row.rect.bottom() <= page.content_bottom() + 1e-3);
            }
        }
        assert!(approx(layout.pages[1].rows[0].rect.y, page.margin_top));
    }

    #[test]
    fn test_oversized_row_gets_its_own_page() {
        let style = TableStyle {
            min_row_height: 400.0,
            ..TableStyle::default()
        };
        let page = PageGeometry::a4();
        let layout = layout_table(&page, &style, &table_data(2));

        // Each row moves to a fresh page and is placed there even though it overflows
        assert_eq!(layout.pages.len(), 3);
        assert_eq!(layout.pages[0].body_rows().count(), 0);
        assert_eq!(layout.pages[1].body_rows().count(), 1);
        assert_eq!(layout.pages[2].body_rows().count(), 1);
    }

    #[test]
    fn test_alternate_rows_are_filled() {
        let style = TableStyle::default();
        let layout = layout_table(&PageGeometry::a4(), &style, &table_data(3));
        let fills: Vec<_> = layout.body_rows().map(|r| r.fill).collect();

        assert_eq!(
            fills,
            vec![Some(style.alternate_fill), None, Some(style.alternate_fill)]
        );
    }

    #[test]
    fn test_text_is_vertically_centered() {
        let style = TableStyle {
            min_row_height: 20.0,
            ..TableStyle::default()
        };
        let layout = layout_table(&PageGeometry::a4(), &style, &table_data(1));
        let row = layout.body_rows().next().unwrap();
        let cell = &row.cells[0];

        let size = style.font_size / PT_PER_MM;
        let middle = cell.rect.y + cell.rect.height / 2.0;
        assert!(approx(cell.baselines[0], middle + 0.35 * size));
        assert!(approx(cell.text_x, cell.rect.x + style.cell_padding));
    }
}
