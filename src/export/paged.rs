// 📄 Paged renderer - title block + table split into pages
//
// Page breaks fall every `rows_per_page` rows; the header repeats on each page.
// Rendered as a landscape A4 PDF, or as aligned plain text.

use super::{CellValue, Table};
use anyhow::{anyhow, Result};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use serde::Serialize;

const MAX_COLUMN_WIDTH: usize = 40;

// Landscape A4, in millimetres
const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 14.0;
const TITLE_SIZE: f32 = 16.0;
const MAX_FONT_SIZE: f32 = 9.0;
const MAX_ROW_HEIGHT: f32 = 6.0;
const PT_TO_MM: f32 = 0.3528;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub number: usize,
    pub rows: Vec<Vec<CellValue>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagedDocument {
    pub title: String,
    pub header: Vec<String>,
    pub pages: Vec<Page>,
}

impl PagedDocument {
    pub fn from_table(title: &str, table: Table, rows_per_page: usize) -> Self {
        let rows_per_page = rows_per_page.max(1);
        let Table { header, rows } = table;

        let mut pages: Vec<Page> = rows
            .chunks(rows_per_page)
            .enumerate()
            .map(|(i, chunk)| Page {
                number: i + 1,
                rows: chunk.to_vec(),
            })
            .collect();

        // An empty report still prints its title and header
        if pages.is_empty() {
            pages.push(Page {
                number: 1,
                rows: Vec::new(),
            });
        }

        PagedDocument {
            title: title.to_string(),
            header,
            pages,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn cell_count(&self) -> usize {
        self.pages
            .iter()
            .flat_map(|p| p.rows.iter())
            .map(|r| r.len())
            .sum()
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.header.iter().map(|h| h.chars().count()).collect();
        for row in self.pages.iter().flat_map(|p| p.rows.iter()) {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.to_string().chars().count());
                }
            }
        }
        widths.into_iter().map(|w| w.min(MAX_COLUMN_WIDTH)).collect()
    }

    /// Plain-text layout of the document, one block per page
    pub fn render_text(&self) -> String {
        let widths = self.column_widths();
        let total = self.page_count();
        let mut out = String::new();

        out.push_str(&self.title);
        out.push('\n');
        out.push_str(&"=".repeat(self.title.chars().count()));
        out.push('\n');

        for page in &self.pages {
            out.push('\n');
            out.push_str(&format!("Page {}/{}\n", page.number, total));
            out.push_str(&format_line(self.header.iter().map(|h| h.as_str()), &widths));
            out.push_str(&format_line(
                widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().iter().map(|s| s.as_str()),
                &widths,
            ));
            for row in &page.rows {
                let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
                out.push_str(&format_line(cells.iter().map(|s| s.as_str()), &widths));
            }
        }

        out
    }
}

impl PagedDocument {
    /// PDF rendering: title on the first page, header row repeated in bold on
    /// every page, page number in the footer
    pub fn render_pdf(&self) -> Result<Vec<u8>> {
        let (doc, first_page, first_layer) =
            PdfDocument::new(self.title.as_str(), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Report");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| anyhow!("Failed to load PDF font: {:?}", e))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| anyhow!("Failed to load PDF font: {:?}", e))?;

        let layout = PdfLayout::new(self);
        let total = self.page_count();

        for (index, page) in self.pages.iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page_ref, layer_ref) =
                    doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Report");
                doc.get_page(page_ref).get_layer(layer_ref)
            };

            let mut y = PAGE_HEIGHT - MARGIN;
            if index == 0 {
                y -= TITLE_SIZE * PT_TO_MM;
                layer.use_text(self.title.as_str(), TITLE_SIZE, Mm(MARGIN), Mm(y), &bold);
                y -= layout.row_height * 2.0;
            }

            layout.draw_row(&layer, self.header.iter().map(|h| h.as_str()), y, &bold);
            for row in &page.rows {
                y -= layout.row_height;
                let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
                layout.draw_row(&layer, cells.iter().map(|s| s.as_str()), y, &regular);
            }

            layer.use_text(
                format!("Page {}/{}", page.number, total),
                MAX_FONT_SIZE,
                Mm(MARGIN),
                Mm(MARGIN / 2.0),
                &regular,
            );
        }

        doc.save_to_bytes()
            .map_err(|e| anyhow!("Failed to write PDF: {:?}", e))
    }
}

/// Column offsets and type size so the widest page fits inside the margins
struct PdfLayout {
    offsets: Vec<f32>,
    widths: Vec<usize>,
    font_size: f32,
    row_height: f32,
}

impl PdfLayout {
    fn new(doc: &PagedDocument) -> Self {
        let widths = doc.column_widths();
        let rows_per_page = doc.pages.iter().map(|p| p.rows.len()).max().unwrap_or(0);

        // Title, gap and header take four rows on the first page
        let usable_height = PAGE_HEIGHT - 2.0 * MARGIN;
        let row_height = (usable_height / (rows_per_page + 4) as f32).min(MAX_ROW_HEIGHT);

        // Helvetica averages about half an em per character
        let total_chars: usize = widths.iter().map(|w| w + 2).sum();
        let usable_width = PAGE_WIDTH - 2.0 * MARGIN;
        let by_width = usable_width / (total_chars.max(1) as f32 * 0.5 * PT_TO_MM);
        let by_height = row_height / PT_TO_MM * 0.8;
        let font_size = MAX_FONT_SIZE.min(by_width).min(by_height);

        let char_mm = font_size * 0.5 * PT_TO_MM;
        let mut offsets = Vec::with_capacity(widths.len());
        let mut x = MARGIN;
        for width in &widths {
            offsets.push(x);
            x += (width + 2) as f32 * char_mm;
        }

        PdfLayout {
            offsets,
            widths,
            font_size,
            row_height,
        }
    }

    fn draw_row<'a>(
        &self,
        layer: &PdfLayerReference,
        cells: impl Iterator<Item = &'a str>,
        y: f32,
        font: &IndirectFontRef,
    ) {
        for ((cell, x), width) in cells.zip(self.offsets.iter()).zip(self.widths.iter()) {
            layer.use_text(truncate(cell, *width), self.font_size, Mm(*x), Mm(y), font);
        }
    }
}

fn format_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let line: Vec<String> = cells
        .zip(widths.iter())
        .map(|(cell, width)| format!("{:<width$}", truncate(cell, *width), width = *width))
        .collect();
    format!("{}\n", line.join(" | ").trim_end())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}
