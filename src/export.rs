use std::fs::File;
use std::io::{Cursor, Write};
use std::path::Path;

use anyhow::Context;
use sha2::{Digest, Sha256};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Presentation exports of assessment tables: a minimal single-sheet `.xlsx`
/// (inline strings, no shared-string table or styles) and a standalone
/// `.html` snapshot. Neither is a round-trip format.

#[derive(Debug, Clone)]
pub enum Cell {
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub bytes_written: usize,
    pub sha256_hex: String,
}

pub fn write_xlsx(
    out_path: &Path,
    sheet_name: &str,
    headers: &[String],
    rows: &[Vec<Cell>],
) -> anyhow::Result<ExportSummary> {
    let bytes = build_xlsx_bytes(sheet_name, headers, rows)?;
    write_out(out_path, &bytes)
}

pub fn write_html_snapshot(
    out_path: &Path,
    title: &str,
    headers: &[String],
    rows: &[Vec<Cell>],
) -> anyhow::Result<ExportSummary> {
    let html = build_html(title, headers, rows);
    write_out(out_path, html.as_bytes())
}

fn write_out(out_path: &Path, bytes: &[u8]) -> anyhow::Result<ExportSummary> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    let mut file = File::create(out_path).with_context(|| {
        format!(
            "failed to create output file {}",
            out_path.to_string_lossy()
        )
    })?;
    file.write_all(bytes).context("failed to write export")?;

    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Ok(ExportSummary {
        bytes_written: bytes.len(),
        sha256_hex: format!("{:x}", hasher.finalize()),
    })
}

fn build_xlsx_bytes(
    sheet_name: &str,
    headers: &[String],
    rows: &[Vec<Cell>],
) -> anyhow::Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", opts)
        .context("failed to start content-types entry")?;
    zip.write_all(CONTENT_TYPES_XML.as_bytes())
        .context("failed to write content types")?;

    zip.start_file("_rels/.rels", opts)
        .context("failed to start package rels entry")?;
    zip.write_all(PACKAGE_RELS_XML.as_bytes())
        .context("failed to write package rels")?;

    zip.start_file("xl/workbook.xml", opts)
        .context("failed to start workbook entry")?;
    zip.write_all(workbook_xml(sheet_name).as_bytes())
        .context("failed to write workbook")?;

    zip.start_file("xl/_rels/workbook.xml.rels", opts)
        .context("failed to start workbook rels entry")?;
    zip.write_all(WORKBOOK_RELS_XML.as_bytes())
        .context("failed to write workbook rels")?;

    zip.start_file("xl/worksheets/sheet1.xml", opts)
        .context("failed to start worksheet entry")?;
    zip.write_all(sheet_xml(headers, rows).as_bytes())
        .context("failed to write worksheet")?;

    let cursor = zip.finish().context("failed to finalize xlsx container")?;
    Ok(cursor.into_inner())
}

const CONTENT_TYPES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
    r#"</Types>"#
);

const PACKAGE_RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    r#"</Relationships>"#
);

const WORKBOOK_RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
    r#"</Relationships>"#
);

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
        ),
        escape_xml(sheet_name)
    )
}

fn sheet_xml(headers: &[String], rows: &[Vec<Cell>]) -> String {
    let mut out = String::from(concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        "<sheetData>"
    ));
    out.push_str("<row r=\"1\">");
    for (col, header) in headers.iter().enumerate() {
        push_inline_str(&mut out, col, 1, header);
    }
    out.push_str("</row>");
    for (i, row) in rows.iter().enumerate() {
        let row_num = i + 2;
        out.push_str(&format!("<row r=\"{}\">", row_num));
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(s) => push_inline_str(&mut out, col, row_num, s),
                Cell::Number(n) => {
                    out.push_str(&format!(
                        "<c r=\"{}{}\"><v>{}</v></c>",
                        column_name(col),
                        row_num,
                        n
                    ));
                }
            }
        }
        out.push_str("</row>");
    }
    out.push_str("</sheetData></worksheet>");
    out
}

fn push_inline_str(out: &mut String, col: usize, row: usize, text: &str) {
    out.push_str(&format!(
        "<c r=\"{}{}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
        column_name(col),
        row,
        escape_xml(text)
    ));
}

/// 0-based column index to spreadsheet letters (0 -> A, 26 -> AA).
fn column_name(mut index: usize) -> String {
    let mut name = String::new();
    loop {
        name.insert(0, (b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn build_html(title: &str, headers: &[String], rows: &[Vec<Cell>]) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape_xml(title)));
    out.push_str(
        "<style>table{border-collapse:collapse}td,th{border:1px solid #999;padding:4px 8px}</style>\n",
    );
    out.push_str("</head>\n<body>\n");
    out.push_str(&format!("<h1>{}</h1>\n", escape_xml(title)));
    out.push_str("<table>\n<thead><tr>");
    for header in headers {
        out.push_str(&format!("<th>{}</th>", escape_xml(header)));
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            match cell {
                Cell::Text(s) => out.push_str(&format!("<td>{}</td>", escape_xml(s))),
                Cell::Number(n) => out.push_str(&format!("<td>{}</td>", n)),
            }
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    out
}
