//! Attachment normalization.
//!
//! Turns a message's downloaded attachments into one combined text block
//! for field extraction. Routing is by MIME type; images are set aside
//! for vision analysis, and anything unreadable lands in the unsupported
//! list rather than failing the message.
//!
//! Extraction is file-bound and synchronous. Callers run it under
//! `spawn_blocking`.

use std::io::BufReader;
use std::path::Path;

use tracing::{debug, warn};

use crate::model::Attachment;

/// Data rows rendered per embedded document table.
const MAX_TABLE_ROWS: usize = 20;

/// Data rows rendered per spreadsheet sheet, excluding the header.
const MAX_SHEET_ROWS: usize = 50;

/// Result of normalizing an attachment list. Read-only once produced.
#[derive(Debug, Clone, Default)]
pub struct NormalizedContent {
    /// Extracted text blocks in attachment order, one `### <filename>`
    /// heading each, joined with `\n\n---\n\n`.
    pub combined_text: String,
    /// Image attachments, untouched, for the vision collaborator.
    pub images: Vec<Attachment>,
    /// Filenames that could not be extracted.
    pub unsupported: Vec<String>,
}

/// MIME-routed attachment-to-text normalizer.
pub struct AttachmentNormalizer;

impl AttachmentNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize all attachments. Pure function of the attachment list
    /// and the files on disk; never fails the whole batch.
    pub fn normalize(&self, attachments: &[Attachment]) -> NormalizedContent {
        let mut blocks: Vec<String> = Vec::new();
        let mut images: Vec<Attachment> = Vec::new();
        let mut unsupported: Vec<String> = Vec::new();

        for attachment in attachments {
            if attachment.mime_type.starts_with("image/") {
                debug!(filename = %attachment.filename, "Image attachment held for vision");
                images.push(attachment.clone());
                continue;
            }

            let Some(path) = attachment.local_path.as_deref() else {
                warn!(filename = %attachment.filename, "Attachment has no local file, skipping");
                continue;
            };

            match extract_for_mime(&attachment.mime_type, path) {
                Ok(text) => {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        blocks.push(format!("### {}\n\n{}", attachment.filename, trimmed));
                    }
                }
                Err(reason) => {
                    warn!(
                        filename = %attachment.filename,
                        mime = %attachment.mime_type,
                        reason = %reason,
                        "Attachment extraction failed"
                    );
                    unsupported.push(attachment.filename.clone());
                }
            }
        }

        NormalizedContent {
            combined_text: blocks.join("\n\n---\n\n"),
            images,
            unsupported,
        }
    }
}

impl Default for AttachmentNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn extract_for_mime(mime: &str, path: &Path) -> Result<String, String> {
    match mime {
        "application/pdf" => extract_pdf(path),
        m if m.contains("wordprocessingml") || m == "application/msword" => extract_docx(path),
        m if m.contains("spreadsheetml") || m == "application/vnd.ms-excel" => {
            extract_workbook(path)
        }
        "text/csv" => extract_csv(path),
        other => Err(format!("unsupported MIME type {other}")),
    }
}

/// PDF text via `pdf-extract`. The library can panic on malformed files,
/// so the call is fenced with `catch_unwind`. Form feeds delimit pages;
/// multi-page output gets `[Page N]` markers. Column-aligned line runs
/// on each page are rebuilt into capped markdown tables.
fn extract_pdf(path: &Path) -> Result<String, String> {
    let path_buf = path.to_path_buf();
    let result = std::panic::catch_unwind(move || pdf_extract::extract_text(&path_buf));

    let text = match result {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => return Err(format!("pdf: {e}")),
        Err(_) => return Err("pdf extraction panicked (malformed file)".into()),
    };

    let pages: Vec<String> = text
        .split('\x0c')
        .map(render_pdf_page)
        .filter(|p| !p.is_empty())
        .collect();

    Ok(match pages.len() {
        0 => String::new(),
        1 => pages.into_iter().next().unwrap_or_default(),
        _ => pages
            .iter()
            .enumerate()
            .map(|(i, page)| format!("[Page {}]\n{}", i + 1, page))
            .collect::<Vec<_>>()
            .join("\n\n"),
    })
}

/// Rebuild one page of flowed PDF text. Prose lines pass through; a run
/// of two or more column-aligned lines (cells separated by tabs or
/// two-plus spaces) becomes a `[Table N]` markdown block after the
/// prose, capped like every other table.
fn render_pdf_page(page: &str) -> String {
    let mut prose: Vec<String> = Vec::new();
    let mut tables: Vec<Vec<Vec<String>>> = Vec::new();
    let mut run: Vec<(String, Vec<String>)> = Vec::new();

    // Trailing "" forces a final flush.
    for line in page.lines().chain(std::iter::once("")) {
        let cells = split_columns(line);
        if cells.len() >= 2 {
            run.push((line.trim().to_string(), cells));
            continue;
        }
        flush_aligned_run(&mut run, &mut prose, &mut tables);
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            prose.push(trimmed.to_string());
        }
    }

    let mut sections: Vec<String> = Vec::new();
    if !prose.is_empty() {
        sections.push(prose.join("\n"));
    }
    for (i, table) in tables.iter().enumerate() {
        sections.push(format!(
            "[Table {}]\n{}",
            i + 1,
            format_table_as_markdown(table)
        ));
    }

    sections.join("\n\n")
}

/// A lone aligned line is prose; two or more consecutive make a table.
fn flush_aligned_run(
    run: &mut Vec<(String, Vec<String>)>,
    prose: &mut Vec<String>,
    tables: &mut Vec<Vec<Vec<String>>>,
) {
    if run.len() >= 2 {
        tables.push(run.drain(..).map(|(_, cells)| cells).collect());
    } else {
        for (line, _) in run.drain(..) {
            prose.push(line);
        }
    }
}

/// Split a line into cells on tabs or runs of two-plus spaces.
fn split_columns(line: &str) -> Vec<String> {
    line.replace('\t', "  ")
        .split("  ")
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// DOCX text: the archive's `word/document.xml`, walked for paragraph
/// runs (`w:t` inside `w:p`) and tables (`w:tbl`/`w:tr`/`w:tc`). Tables
/// are appended after the prose as `[Table N]` markdown blocks.
fn extract_docx(path: &Path) -> Result<String, String> {
    let file = std::fs::File::open(path).map_err(|e| format!("docx open: {e}"))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| format!("docx zip: {e}"))?;
    let doc = archive
        .by_name("word/document.xml")
        .map_err(|e| format!("docx missing document.xml: {e}"))?;

    let mut reader = quick_xml::Reader::from_reader(BufReader::new(doc));
    let mut buf = Vec::new();

    let mut paragraphs: Vec<String> = Vec::new();
    let mut tables: Vec<Vec<Vec<String>>> = Vec::new();

    let mut paragraph = String::new();
    let mut in_text = false;
    let mut table_depth = 0usize;
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut cells: Vec<String> = Vec::new();
    let mut cell = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"tbl" => table_depth += 1,
                b"tr" if table_depth == 1 => cells = Vec::new(),
                b"tc" if table_depth == 1 => cell = String::new(),
                _ => {}
            },
            Ok(quick_xml::events::Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" if table_depth == 0 => {
                    let line = paragraph.trim().to_string();
                    if !line.is_empty() {
                        paragraphs.push(line);
                    }
                    paragraph.clear();
                }
                b"tc" if table_depth == 1 => cells.push(cell.trim().to_string()),
                b"tr" if table_depth == 1 => {
                    if !cells.is_empty() {
                        rows.push(std::mem::take(&mut cells));
                    }
                }
                b"tbl" => {
                    table_depth = table_depth.saturating_sub(1);
                    if table_depth == 0 && !rows.is_empty() {
                        tables.push(std::mem::take(&mut rows));
                    }
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Text(ref e)) => {
                if in_text {
                    if let Ok(s) = e.unescape() {
                        if table_depth > 0 {
                            cell.push_str(&s);
                        } else {
                            paragraph.push_str(&s);
                        }
                    }
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(format!("docx xml: {e}")),
            _ => {}
        }
        buf.clear();
    }

    let mut sections: Vec<String> = Vec::new();
    if !paragraphs.is_empty() {
        sections.push(paragraphs.join("\n"));
    }
    for (i, table) in tables.iter().enumerate() {
        sections.push(format!(
            "[Table {}]\n{}",
            i + 1,
            format_table_as_markdown(table)
        ));
    }

    Ok(sections.join("\n\n"))
}

/// Spreadsheet text via calamine. One markdown table per sheet, each
/// capped at [`MAX_SHEET_ROWS`] rows.
fn extract_workbook(path: &Path) -> Result<String, String> {
    use calamine::{Reader, open_workbook_auto};

    let mut workbook = open_workbook_auto(path).map_err(|e| format!("workbook: {e}"))?;

    let mut sections: Vec<String> = Vec::new();
    for sheet_name in workbook.sheet_names().to_vec() {
        if let Ok(range) = workbook.worksheet_range(&sheet_name) {
            let rows: Vec<Vec<String>> = range
                .rows()
                .map(|row| row.iter().map(cell_to_string).collect())
                .collect();
            if rows.is_empty() {
                continue;
            }
            sections.push(format!("## {}\n\n{}", sheet_name, render_sheet(&rows)));
        }
    }

    Ok(sections.join("\n\n"))
}

/// CSV rendered as a single capped markdown table.
fn extract_csv(path: &Path) -> Result<String, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| format!("csv open: {e}"))?;

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| format!("csv read: {e}"))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    if rows.is_empty() {
        return Ok(String::new());
    }
    Ok(render_sheet(&rows))
}

fn cell_to_string(cell: &calamine::Data) -> String {
    use calamine::Data;
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => format!("{f}"),
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR({e:?})"),
        Data::DateTime(dt) => format!("{dt}"),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Markdown table with a header row and at most [`MAX_TABLE_ROWS`] data
/// rows, noting how many were elided.
pub(crate) fn format_table_as_markdown(rows: &[Vec<String>]) -> String {
    let Some((header, data)) = rows.split_first() else {
        return String::new();
    };

    let mut out = String::new();
    push_row(&mut out, header);
    push_row(&mut out, &vec!["---".to_string(); header.len()]);

    for row in data.iter().take(MAX_TABLE_ROWS) {
        push_row(&mut out, row);
    }
    if data.len() > MAX_TABLE_ROWS {
        out.push_str(&format!("… ({} more rows)\n", data.len() - MAX_TABLE_ROWS));
    }

    out.trim_end().to_string()
}

/// Sheet renderer: the first row is the header, followed by at most
/// [`MAX_SHEET_ROWS`] data rows with a truncation note. The header does
/// not count against the cap.
pub(crate) fn render_sheet(rows: &[Vec<String>]) -> String {
    let Some((header, data)) = rows.split_first() else {
        return String::new();
    };

    let mut out = String::new();
    push_row(&mut out, header);
    push_row(&mut out, &vec!["---".to_string(); header.len()]);
    for row in data.iter().take(MAX_SHEET_ROWS) {
        push_row(&mut out, row);
    }
    if data.len() > MAX_SHEET_ROWS {
        out.push_str(&format!(
            "(Showing first {} of {} rows)\n",
            MAX_SHEET_ROWS,
            data.len()
        ));
    }

    out.trim_end().to_string()
}

fn push_row(out: &mut String, cells: &[String]) {
    out.push_str("| ");
    out.push_str(&cells.join(" | "));
    out.push_str(" |\n");
}
