//! Page model and table layout for generated documents
//!
//! Layout places text runs, rules and images on pages; `pdf` turns the
//! result into bytes. Coordinates are millimetres from the top-left corner
//! of the page and text is positioned by its baseline.

use image::DynamicImage;
use tracing::debug;

use crate::constants;

const PT_TO_MM: f32 = 0.352_778;

/// Line height as a multiple of the font size
const LINE_HEIGHT_FACTOR: f32 = 1.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub enum Element {
    Text {
        x: f32,
        y: f32,
        size: f32,
        weight: FontWeight,
        text: String,
    },
    Rule {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        thickness: f32,
    },
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image: DynamicImage,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub elements: Vec<Element>,
}

/// Page size and margin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry {
        width: constants::PAGE_WIDTH_MM,
        height: constants::PAGE_HEIGHT_MM,
        margin: constants::PAGE_MARGIN_MM,
    };

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    pub fn right(&self) -> f32 {
        self.width - self.margin
    }

    /// Lowest Y content may reach
    pub fn bottom(&self) -> f32 {
        self.height - self.margin
    }
}

/// Position where the next block starts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub page: usize,
    pub y: f32,
}

impl Cursor {
    pub fn advance(self, dy: f32) -> Self {
        Cursor {
            page: self.page,
            y: self.y + dy,
        }
    }
}

/// A table to be laid out across the content width
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub align: Vec<Align>,
    /// Relative column widths
    pub weights: Vec<f32>,
    pub font_size: f32,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let align = vec![Align::Left; headers.len()];
        let weights = vec![1.0; headers.len()];
        Table {
            headers,
            rows: Vec::new(),
            align,
            weights,
            font_size: constants::TABLE_FONT_SIZE,
        }
    }

    /// Set relative column widths; columns without a weight get 1.0
    pub fn with_weights(mut self, weights: &[f32]) -> Self {
        for (slot, weight) in self.weights.iter_mut().zip(weights) {
            *slot = weight.max(0.0);
        }
        self
    }

    /// Right-align the given columns
    pub fn align_right(mut self, columns: &[usize]) -> Self {
        for &col in columns {
            if let Some(align) = self.align.get_mut(col) {
                *align = Align::Right;
            }
        }
        self
    }

    pub fn push_row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }
}

/// Laid-out document: a title plus pages of positioned elements
#[derive(Debug, Clone)]
pub struct DocumentLayout {
    pub title: String,
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
}

impl DocumentLayout {
    pub fn new(title: impl Into<String>, geometry: PageGeometry) -> Self {
        DocumentLayout {
            title: title.into(),
            geometry,
            pages: vec![Page::default()],
        }
    }

    /// Append a page and return its index
    pub fn add_page(&mut self) -> usize {
        self.pages.push(Page::default());
        self.pages.len() - 1
    }

    fn push(&mut self, page: usize, element: Element) {
        while self.pages.len() <= page {
            self.pages.push(Page::default());
        }
        self.pages[page].elements.push(element);
    }

    pub fn text(&mut self, at: Cursor, x: f32, size: f32, weight: FontWeight, text: impl Into<String>) {
        self.push(
            at.page,
            Element::Text {
                x,
                y: at.y,
                size,
                weight,
                text: text.into(),
            },
        );
    }

    /// Place text so that it ends at `right`
    pub fn text_right(&mut self, at: Cursor, right: f32, size: f32, weight: FontWeight, text: impl Into<String>) {
        let text = text.into();
        let x = right - text_width(&text, size, weight);
        self.text(at, x, size, weight, text);
    }

    pub fn rule(&mut self, page: usize, x1: f32, y1: f32, x2: f32, y2: f32, thickness: f32) {
        self.push(page, Element::Rule { x1, y1, x2, y2, thickness });
    }

    pub fn image(&mut self, at: Cursor, x: f32, width: f32, height: f32, image: DynamicImage) {
        self.push(
            at.page,
            Element::Image {
                x,
                y: at.y,
                width,
                height,
                image,
            },
        );
    }

    /// Move to a fresh page when `height` does not fit below the cursor
    pub fn ensure_room(&mut self, at: Cursor, height: f32) -> Cursor {
        if at.y + height <= self.geometry.bottom() {
            return at;
        }
        let page = self.add_page();
        Cursor {
            page,
            y: self.geometry.margin,
        }
    }

    /// Lay out a ruled table starting at `start` and return the cursor just
    /// below its last row.
    ///
    /// Columns split the content width by their weights and cell text wraps
    /// on word boundaries. A row that would cross the bottom margin moves to a new
    /// page, where the header row is repeated.
    pub fn table(&mut self, table: &Table, start: Cursor) -> Cursor {
        let columns = self.column_spans(table);
        let limits: Vec<f32> = columns
            .iter()
            .map(|(_, width)| (width - 2.0 * constants::CELL_PADDING_MM).max(1.0))
            .collect();

        let header_lines = wrap_cells(&table.headers, &limits, table.font_size, FontWeight::Bold);
        let header_height = row_height(&header_lines, table.font_size);

        let first_row_height = table
            .rows
            .first()
            .map(|row| row_height(&wrap_cells(row, &limits, table.font_size, FontWeight::Regular), table.font_size))
            .unwrap_or(0.0);

        let mut cursor = self.ensure_room(start, header_height + first_row_height);
        cursor = self.table_header(table, &columns, &header_lines, header_height, cursor);

        for row in &table.rows {
            let lines = wrap_cells(row, &limits, table.font_size, FontWeight::Regular);
            let height = row_height(&lines, table.font_size);

            if cursor.y + height > self.geometry.bottom() {
                let page = self.add_page();
                debug!(page, "Table continues on a new page");
                cursor = Cursor {
                    page,
                    y: self.geometry.margin,
                };
                cursor = self.table_header(table, &columns, &header_lines, header_height, cursor);
            }

            self.table_row(table, &columns, &lines, FontWeight::Regular, cursor);
            let left = self.geometry.margin;
            let right = self.geometry.right();
            self.rule(cursor.page, left, cursor.y + height, right, cursor.y + height, constants::ROW_RULE_PT);
            cursor = cursor.advance(height);
        }

        cursor
    }

    /// (left, width) of every column, splitting the content width by weight
    fn column_spans(&self, table: &Table) -> Vec<(f32, f32)> {
        let count = table.headers.len();
        let total: f32 = table.weights.iter().sum();
        let content = self.geometry.content_width();

        let mut left = self.geometry.margin;
        (0..count)
            .map(|col| {
                let width = if total > 0.0 {
                    content * table.weights[col] / total
                } else {
                    content / count as f32
                };
                let span = (left, width);
                left += width;
                span
            })
            .collect()
    }

    fn table_header(
        &mut self,
        table: &Table,
        columns: &[(f32, f32)],
        lines: &[Vec<String>],
        height: f32,
        at: Cursor,
    ) -> Cursor {
        let left = self.geometry.margin;
        let right = self.geometry.right();
        self.rule(at.page, left, at.y, right, at.y, constants::HEADER_RULE_PT);
        self.table_row(table, columns, lines, FontWeight::Bold, at);
        self.rule(at.page, left, at.y + height, right, at.y + height, constants::HEADER_RULE_PT);
        at.advance(height)
    }

    fn table_row(&mut self, table: &Table, columns: &[(f32, f32)], lines: &[Vec<String>], weight: FontWeight, at: Cursor) {
        let line_height = line_height(table.font_size);
        for (col, cell_lines) in lines.iter().enumerate() {
            let Some(&(cell_left, column_width)) = columns.get(col) else {
                break;
            };
            let align = table.align.get(col).copied().unwrap_or_default();
            for (index, line) in cell_lines.iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                let baseline = at.advance(constants::CELL_PADDING_MM + line_height * (index as f32 + 0.8));
                match align {
                    Align::Left => self.text(
                        baseline,
                        cell_left + constants::CELL_PADDING_MM,
                        table.font_size,
                        weight,
                        line.clone(),
                    ),
                    Align::Right => self.text_right(
                        baseline,
                        cell_left + column_width - constants::CELL_PADDING_MM,
                        table.font_size,
                        weight,
                        line.clone(),
                    ),
                }
            }
        }
    }

    /// Every text run as (page, baseline, text), in placement order
    pub fn text_runs(&self) -> Vec<(usize, f32, &str)> {
        self.pages
            .iter()
            .enumerate()
            .flat_map(|(page, p)| {
                p.elements.iter().filter_map(move |element| match element {
                    Element::Text { y, text, .. } => Some((page, *y, text.as_str())),
                    _ => None,
                })
            })
            .collect()
    }

    /// First text run equal to `text`, as (page, baseline)
    pub fn find_text(&self, text: &str) -> Option<(usize, f32)> {
        self.text_runs()
            .into_iter()
            .find(|(_, _, run)| *run == text)
            .map(|(page, y, _)| (page, y))
    }

    pub fn image_count(&self) -> usize {
        self.pages
            .iter()
            .flat_map(|p| p.elements.iter())
            .filter(|e| matches!(e, Element::Image { .. }))
            .count()
    }
}

/// Height of one line of text at `size` points
pub fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * LINE_HEIGHT_FACTOR
}

/// Rendered width of `text` in millimetres using the bundled DejaVu Sans
/// advance widths
pub fn text_width(text: &str, size: f32, weight: FontWeight) -> f32 {
    let em: u32 = text.chars().map(|c| char_width(c, weight)).sum();
    em as f32 / 1000.0 * size * PT_TO_MM
}

/// DejaVu Sans advance widths for ' '..='~', thousandths of an em
#[rustfmt::skip]
const REGULAR_WIDTHS: [u16; 95] = [
    318, 401, 460, 838, 636, 950, 780, 275, 390, 390, 500, 838, 318, 361, 318, 337,
    636, 636, 636, 636, 636, 636, 636, 636, 636, 636, 337, 337, 838, 838, 838, 531,
    1000, 684, 686, 698, 770, 632, 575, 775, 752, 295, 295, 656, 557, 863, 748, 787,
    603, 787, 695, 635, 611, 732, 684, 989, 685, 611, 685, 390, 337, 390, 838, 500,
    500, 613, 635, 550, 635, 615, 352, 635, 634, 278, 278, 579, 278, 974, 634, 612,
    635, 635, 411, 521, 392, 634, 592, 818, 592, 592, 525, 636, 337, 636, 838,
];

/// DejaVu Sans Bold advance widths for ' '..='~'
#[rustfmt::skip]
const BOLD_WIDTHS: [u16; 95] = [
    348, 456, 521, 838, 696, 1002, 872, 306, 457, 457, 523, 838, 380, 415, 380, 365,
    696, 696, 696, 696, 696, 696, 696, 696, 696, 696, 400, 400, 838, 838, 838, 580,
    1000, 774, 762, 734, 830, 683, 683, 821, 837, 372, 372, 775, 637, 995, 837, 850,
    733, 850, 770, 720, 682, 812, 774, 1103, 771, 724, 725, 457, 365, 457, 838, 500,
    500, 675, 716, 593, 716, 678, 435, 716, 712, 343, 343, 665, 343, 1042, 712, 687,
    716, 716, 493, 595, 478, 712, 652, 924, 645, 652, 582, 712, 365, 712, 838,
];

fn char_width(c: char, weight: FontWeight) -> u32 {
    let table = match weight {
        FontWeight::Regular => &REGULAR_WIDTHS,
        FontWeight::Bold => &BOLD_WIDTHS,
    };
    match c {
        ' '..='~' => u32::from(table[c as usize - 0x20]),
        // ₹ is drawn on the figure width
        '₹' => u32::from(table['0' as usize - 0x20]),
        '→' => 838,
        _ => 1000,
    }
}

/// Split `text` into lines no wider than `max_width`. Explicit newlines start
/// new lines; a single word wider than the limit is broken by characters.
pub fn wrap_text(text: &str, max_width: f32, size: f32, weight: FontWeight) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };

            if text_width(&candidate, size, weight) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if text_width(word, size, weight) <= max_width {
                current = word.to_string();
            } else {
                for c in word.chars() {
                    current.push(c);
                    if text_width(&current, size, weight) > max_width && current.chars().count() > 1 {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(c);
                    }
                }
            }
        }
        lines.push(current);
    }

    lines
}

fn wrap_cells(cells: &[String], limits: &[f32], size: f32, weight: FontWeight) -> Vec<Vec<String>> {
    cells
        .iter()
        .zip(limits)
        .map(|(cell, max_width)| wrap_text(cell, *max_width, size, weight))
        .collect()
}

fn row_height(lines: &[Vec<String>], size: f32) -> f32 {
    let max_lines = lines.iter().map(Vec::len).max().unwrap_or(1).max(1);
    max_lines as f32 * line_height(size) + 2.0 * constants::CELL_PADDING_MM
}
