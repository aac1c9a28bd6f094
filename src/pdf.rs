//! Paginated table document in PDF 1.4.
//!
//! Pages carry a bordered grid with a shaded header row that repeats on
//! every page. Text is set in the built-in Helvetica face, so nothing is
//! embedded and the output stays small.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;

use crate::models::Table;

const HEADER_GRAY: f64 = 0.827;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    pub font_size: f64,
    pub row_height: f64,
    pub cell_padding: f64,
}

impl Default for PageLayout {
    /// US Letter with one-inch margins.
    fn default() -> Self {
        Self {
            width: 612.0,
            height: 792.0,
            margin: 72.0,
            font_size: 10.0,
            row_height: 18.0,
            cell_padding: 6.0,
        }
    }
}

impl PageLayout {
    fn usable_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    /// Rows per page including the repeated header. Never below two.
    pub fn rows_per_page(&self) -> usize {
        let fit = ((self.height - 2.0 * self.margin) / self.row_height).floor();
        if fit.is_finite() && fit >= 2.0 {
            fit as usize
        } else {
            2
        }
    }
}

/// Approximate Helvetica advance widths, in units of the font size.
fn glyph_width(c: char) -> f64 {
    match c {
        ' ' | '.' | ',' | ':' | ';' | '!' | 'i' | 'j' | 'l' | 'I' | '|' => 0.278,
        '-' | '(' | ')' | 'f' | 't' | 'r' => 0.333,
        'M' | 'W' | 'm' => 0.833,
        'w' => 0.722,
        'A'..='Z' => 0.667,
        _ => 0.556,
    }
}

fn text_width(text: &str, font_size: f64) -> f64 {
    text.chars().map(glyph_width).sum::<f64>() * font_size
}

/// Widest cell per column plus padding at the layout's font size.
pub fn column_widths(table: &Table, layout: &PageLayout) -> Vec<f64> {
    let mut widths: Vec<f64> = table
        .header
        .iter()
        .map(|cell| text_width(cell, layout.font_size))
        .collect();
    for row in &table.rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = width.max(text_width(cell, layout.font_size));
        }
    }
    for width in widths.iter_mut() {
        *width += 2.0 * layout.cell_padding;
    }
    widths
}

/// Shrinks the font, padding and column widths by one factor when the table
/// is wider than the printable area, so every cell stays inside its box.
pub fn fit_to_page(table: &Table, layout: &PageLayout) -> (PageLayout, Vec<f64>) {
    let mut widths = column_widths(table, layout);
    let total: f64 = widths.iter().sum();
    let usable = layout.usable_width();
    if total <= usable || total <= 0.0 {
        return (*layout, widths);
    }

    let scale = usable / total;
    for width in widths.iter_mut() {
        *width *= scale;
    }
    let fitted = PageLayout {
        font_size: layout.font_size * scale,
        cell_padding: layout.cell_padding * scale,
        ..*layout
    };
    (fitted, widths)
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            // WinAnsiEncoding agrees with Latin-1 in this range.
            '\u{a0}'..='\u{ff}' => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            _ => out.push('?'),
        }
    }
    out
}

fn page_content(
    header: &[String],
    rows: &[Vec<String>],
    widths: &[f64],
    layout: &PageLayout,
) -> String {
    let total_width: f64 = widths.iter().sum();
    let left = (layout.width - total_width) / 2.0;
    let top = layout.height - layout.margin;
    let line_count = rows.len() + 1;
    let bottom = top - line_count as f64 * layout.row_height;
    let mut out = String::new();

    let _ = writeln!(out, "{HEADER_GRAY:.3} g");
    let _ = writeln!(
        out,
        "{:.2} {:.2} {:.2} {:.2} re f",
        left,
        top - layout.row_height,
        total_width,
        layout.row_height
    );

    let _ = writeln!(out, "0 G 1 w");
    for line in 0..=line_count {
        let y = top - line as f64 * layout.row_height;
        let _ = writeln!(
            out,
            "{:.2} {:.2} m {:.2} {:.2} l S",
            left,
            y,
            left + total_width,
            y
        );
    }
    let mut x = left;
    for boundary in 0..=widths.len() {
        let _ = writeln!(out, "{x:.2} {top:.2} m {x:.2} {bottom:.2} l S");
        if let Some(width) = widths.get(boundary) {
            x += width;
        }
    }

    let _ = writeln!(out, "0 g");
    let baseline_offset = (layout.row_height - layout.font_size * 0.7) / 2.0;
    let lines = std::iter::once(header).chain(rows.iter().map(Vec::as_slice));
    for (line, cells) in lines.enumerate() {
        let row_bottom = top - (line + 1) as f64 * layout.row_height;
        let mut x = left;
        for (cell, width) in cells.iter().zip(widths.iter()) {
            if !cell.is_empty() {
                let _ = writeln!(
                    out,
                    "BT /F1 {:.2} Tf {:.2} {:.2} Td ({}) Tj ET",
                    layout.font_size,
                    x + layout.cell_padding,
                    row_bottom + baseline_offset,
                    escape_text(cell)
                );
            }
            x += width;
        }
    }
    out
}

struct PdfWriter {
    buffer: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buffer,
            offsets: Vec::new(),
        }
    }

    /// Objects must be written in id order starting at 1.
    fn object(&mut self, body: &str) {
        self.offsets.push(self.buffer.len());
        let id = self.offsets.len();
        self.buffer
            .extend_from_slice(format!("{id} 0 obj\n{body}\nendobj\n").as_bytes());
    }

    fn stream(&mut self, content: &str) {
        self.object(&format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ));
    }

    fn finish(mut self) -> Vec<u8> {
        let xref_at = self.buffer.len();
        let mut trailer = String::new();
        let _ = writeln!(trailer, "xref");
        let _ = writeln!(trailer, "0 {}", self.offsets.len() + 1);
        trailer.push_str("0000000000 65535 f \n");
        for offset in &self.offsets {
            let _ = write!(trailer, "{offset:010} 00000 n \n");
        }
        let _ = writeln!(trailer, "trailer");
        let _ = writeln!(trailer, "<< /Size {} /Root 1 0 R >>", self.offsets.len() + 1);
        let _ = writeln!(trailer, "startxref");
        let _ = writeln!(trailer, "{xref_at}");
        trailer.push_str("%%EOF\n");
        self.buffer.extend_from_slice(trailer.as_bytes());
        self.buffer
    }
}

pub fn render_table(table: &Table, layout: &PageLayout) -> Vec<u8> {
    let (fitted, widths) = fit_to_page(table, layout);
    let per_page = layout.rows_per_page() - 1;
    let chunks: Vec<&[Vec<String>]> = if table.rows.is_empty() {
        vec![&table.rows[..]]
    } else {
        table.rows.chunks(per_page).collect()
    };

    // 1 catalog, 2 page tree, 3 font, then a page and its content per chunk.
    let page_ids: Vec<usize> = (0..chunks.len()).map(|page| 4 + 2 * page).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");

    let mut writer = PdfWriter::new();
    writer.object("<< /Type /Catalog /Pages 2 0 R >>");
    writer.object(&format!(
        "<< /Type /Pages /Kids [{kids}] /Count {} >>",
        chunks.len()
    ));
    writer.object(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );
    for (page_id, rows) in page_ids.iter().zip(chunks.iter()) {
        writer.object(&format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.0} {:.0}] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            layout.width,
            layout.height,
            page_id + 1
        ));
        writer.stream(&page_content(&table.header, rows, &widths, &fitted));
    }
    writer.finish()
}

pub fn write_table_file(table: &Table, path: &Path) -> anyhow::Result<()> {
    let bytes = render_table(table, &PageLayout::default());
    std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_rows(count: usize) -> Table {
        Table {
            header: Table::header_for(2),
            rows: (0..count)
                .map(|i| vec![format!("{}", 1000 + i), "7.5".into(), "".into(), "B".into()])
                .collect(),
        }
    }

    // One char per byte so string offsets match xref offsets.
    fn as_text(bytes: &[u8]) -> String {
        bytes
            .iter()
            .map(|&b| if b.is_ascii() { b as char } else { '?' })
            .collect()
    }

    fn page_count(text: &str) -> usize {
        text.matches("/Type /Page ").count()
    }

    #[test]
    fn document_is_framed() {
        let bytes = render_table(&table_with_rows(3), &PageLayout::default());
        assert!(bytes.starts_with(b"%PDF-1.4\n"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        let text = as_text(&bytes);
        assert_eq!(page_count(&text), 1);
        assert!(text.contains("/Count 1"));
        assert!(text.contains("(CODE) Tj"));
        assert!(text.contains("(1002) Tj"));
        assert!(text.contains("0.827 g"));
    }

    #[test]
    fn xref_points_at_objects() {
        let bytes = render_table(&table_with_rows(50), &PageLayout::default());
        let text = as_text(&bytes);
        let start: usize = text
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .and_then(|line| line.parse().ok())
            .unwrap();
        assert!(text[start..].starts_with("xref\n"));

        let entries: Vec<usize> = text[start..]
            .lines()
            .skip(3)
            .take_while(|line| line.ends_with(" n "))
            .map(|line| line[..10].parse().unwrap())
            .collect();
        assert_eq!(entries.len(), 3 + 2 * page_count(&text));
        for (id, offset) in (1..).zip(entries) {
            assert!(text[offset..].starts_with(&format!("{id} 0 obj\n")));
        }
    }

    #[test]
    fn rows_spill_onto_new_pages() {
        let layout = PageLayout::default();
        assert_eq!(layout.rows_per_page(), 36);

        let text = as_text(&render_table(&table_with_rows(35), &layout));
        assert_eq!(page_count(&text), 1);

        let text = as_text(&render_table(&table_with_rows(80), &layout));
        assert_eq!(page_count(&text), 3);
        assert_eq!(text.matches("(CODE) Tj").count(), 3);
        assert!(text.contains("/Count 3"));
    }

    #[test]
    fn empty_table_still_prints_header() {
        let text = as_text(&render_table(&table_with_rows(0), &PageLayout::default()));
        assert_eq!(page_count(&text), 1);
        assert!(text.contains("(FINAL) Tj"));
    }

    #[test]
    fn blank_cells_draw_no_text() {
        let text = as_text(&render_table(&table_with_rows(1), &PageLayout::default()));
        assert!(!text.contains("() Tj"));
    }

    #[test]
    fn wide_tables_are_scaled_to_fit() {
        let layout = PageLayout::default();
        let mut table = table_with_rows(1);
        table.rows[0][0] = "X".repeat(200);
        let (fitted, widths) = fit_to_page(&table, &layout);
        let total: f64 = widths.iter().sum();
        assert!((total - layout.usable_width()).abs() < 0.001);
        assert!(fitted.font_size < layout.font_size);
        assert_eq!(fitted.row_height, layout.row_height);

        let text_span = text_width(&table.rows[0][0], fitted.font_size) + 2.0 * fitted.cell_padding;
        assert!(text_span <= widths[0] + 0.001);

        let text = as_text(&render_table(&table, &layout));
        assert!(text.contains(&format!("/F1 {:.2} Tf", fitted.font_size)));
        assert!(!text.contains("/F1 10.00 Tf"));
    }

    #[test]
    fn narrow_tables_keep_the_layout() {
        let layout = PageLayout::default();
        let (fitted, widths) = fit_to_page(&table_with_rows(1), &layout);
        assert_eq!(fitted, layout);
        assert!(widths.iter().sum::<f64>() < layout.usable_width());
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(escape_text("a(b)\\c"), "a\\(b\\)\\\\c");
        assert_eq!(escape_text("Luís"), "Lu\\355s");
        assert_eq!(escape_text("名"), "?");
    }
}
