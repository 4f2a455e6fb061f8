//! XLSX strikethrough reader: which cells carry a struck font.
//!
//! calamine delivers values only, so the strike flag is recovered from the
//! archive directly: `styles.xml` fonts → `cellXfs` font ids → the `s`
//! attribute on each `<c>` of the worksheet XML.

use std::collections::{HashMap, HashSet};
use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use routerecon_engine::cell_id::letters_to_col;
use zip::ZipArchive;

use crate::error::IoError;

// =============================================================================
// Public types
// =============================================================================

/// `cellXfs` indices whose font is struck through.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StrikeStyles {
    struck: HashSet<usize>,
}

impl StrikeStyles {
    pub fn is_struck(&self, style_id: usize) -> bool {
        self.struck.contains(&style_id)
    }

    pub fn is_empty(&self) -> bool {
        self.struck.is_empty()
    }
}

// =============================================================================
// XML entity unescaping
// =============================================================================

/// Unescape the 5 predefined XML entities: &amp; &lt; &gt; &quot; &apos;
fn unescape_xml(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

// =============================================================================
// styles.xml
// =============================================================================

pub fn parse_styles_xml(xml: &str) -> StrikeStyles {
    let fonts = parse_fonts(xml);
    let struck = parse_cell_xfs(xml)
        .into_iter()
        .enumerate()
        .filter(|(_, font_id)| fonts.get(*font_id).copied().unwrap_or(false))
        .map(|(style_id, _)| style_id)
        .collect();
    StrikeStyles { struck }
}

/// Strike flag of every `<font>` inside `<fonts>`, by font id.
fn parse_fonts(xml: &str) -> Vec<bool> {
    let mut fonts = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut depth = 0; // 0 = outside, 1 = inside <fonts>, 2 = inside <font>
    let mut current = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"fonts" if depth == 0 => depth = 1,
                b"font" if depth == 1 => {
                    depth = 2;
                    current = false;
                }
                b"strike" if depth == 2 => current = flag_on(e),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"font" if depth == 1 => fonts.push(false),
                b"strike" if depth == 2 => current = flag_on(e),
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"font" if depth == 2 => {
                    fonts.push(current);
                    depth = 1;
                }
                b"fonts" if depth == 1 => break,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("styles.xml fonts: {e}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    fonts
}

/// `<strike/>` and `<strike val="1"/>` are on; `val="0"`/`"false"` is off.
fn flag_on(e: &BytesStart) -> bool {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"val" {
            return !matches!(attr.value.as_ref(), b"0" | b"false");
        }
    }
    true
}

/// `fontId` of every `<xf>` inside `<cellXfs>`, by style id.
fn parse_cell_xfs(xml: &str) -> Vec<usize> {
    let mut font_ids = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_cell_xfs = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"cellXfs" => in_cell_xfs = true,
                b"xf" if in_cell_xfs => {
                    let font_id = e
                        .attributes()
                        .flatten()
                        .find(|a| a.key.as_ref() == b"fontId")
                        .and_then(|a| std::str::from_utf8(&a.value).ok().and_then(|s| s.parse().ok()))
                        .unwrap_or(0);
                    font_ids.push(font_id);
                }
                _ => {}
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"cellXfs" => break,
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("styles.xml cellXfs: {e}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    font_ids
}

// =============================================================================
// Worksheet XML
// =============================================================================

/// `(row, col)` of every cell whose style id is struck, 0-based.
pub fn parse_struck_cells(xml: &str, styles: &StrikeStyles) -> Vec<(usize, usize)> {
    let mut cells = Vec::new();
    if styles.is_empty() {
        return cells;
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.name().as_ref() == b"c" => {
                let mut style_id: Option<usize> = None;
                let mut cell_ref: Option<String> = None;

                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"s" => {
                            style_id = std::str::from_utf8(&attr.value).ok().and_then(|s| s.parse().ok());
                        }
                        b"r" => cell_ref = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        _ => {}
                    }
                }

                if let (Some(style_id), Some(cell_ref)) = (style_id, cell_ref) {
                    if styles.is_struck(style_id) {
                        if let Some(at) = parse_cell_ref(&cell_ref) {
                            cells.push(at);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("worksheet xml: {e}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    cells
}

/// Parse an A1-style cell reference into 0-based (row, col).
fn parse_cell_ref(r: &str) -> Option<(usize, usize)> {
    let mut col_part = String::new();
    let mut row_part = String::new();

    for ch in r.chars() {
        if ch.is_ascii_alphabetic() {
            col_part.push(ch);
        } else if ch.is_ascii_digit() {
            row_part.push(ch);
        }
    }

    if col_part.is_empty() || row_part.is_empty() {
        return None;
    }

    let col = letters_to_col(&col_part)?;
    let row: usize = row_part.parse().ok()?;
    Some((row.checked_sub(1)?, col))
}

// =============================================================================
// Top-level entry point
// =============================================================================

/// Struck cells per sheet, in the order of `sheet_names`.
///
/// A workbook without `styles.xml` has no struck cells. Sheets whose XML
/// cannot be located get an empty list.
pub fn read_struck_cells(path: &Path, sheet_names: &[String]) -> Result<Vec<Vec<(usize, usize)>>, IoError> {
    let file = std::fs::File::open(path).map_err(|e| IoError::read(path, e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| IoError::workbook(path, format!("not a zip archive: {e}")))?;

    let styles = match read_zip_file(&mut archive, "xl/styles.xml") {
        Some(xml) => parse_styles_xml(&xml),
        None => {
            log::debug!("{}: no styles.xml, nothing struck", path.display());
            return Ok(vec![Vec::new(); sheet_names.len()]);
        }
    };
    if styles.is_empty() {
        return Ok(vec![Vec::new(); sheet_names.len()]);
    }

    let workbook_xml = read_zip_file(&mut archive, "xl/workbook.xml").unwrap_or_default();
    let rels_xml = read_zip_file(&mut archive, "xl/_rels/workbook.xml.rels").unwrap_or_default();
    let paths = resolve_worksheet_paths_for_sheets(&workbook_xml, &rels_xml, sheet_names);

    Ok(paths
        .iter()
        .map(|ws_path| match ws_path.as_deref().and_then(|p| read_zip_file(&mut archive, p)) {
            Some(xml) => parse_struck_cells(&xml, &styles),
            None => Vec::new(),
        })
        .collect())
}

// =============================================================================
// Helpers
// =============================================================================

fn read_zip_file<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Option<String> {
    let mut file = archive.by_name(path).ok()?;
    let mut content = String::new();
    match file.read_to_string(&mut content) {
        Ok(_) => Some(content),
        Err(e) => {
            log::warn!("failed to read '{path}' from archive: {e}");
            None
        }
    }
}

/// Resolve worksheet XML paths for specific sheet names (in order).
fn resolve_worksheet_paths_for_sheets(workbook_xml: &str, rels_xml: &str, sheet_names: &[String]) -> Vec<Option<String>> {
    let mut name_to_rid: HashMap<String, String> = HashMap::new();
    let mut reader = Reader::from_str(workbook_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut rid = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"name" => name = Some(unescape_xml(&String::from_utf8_lossy(&attr.value))),
                        b"r:id" => rid = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        _ => {}
                    }
                }
                if let (Some(name), Some(rid)) = (name, rid) {
                    name_to_rid.insert(name, rid);
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    let mut rid_to_target: HashMap<String, String> = HashMap::new();
    let mut reader = Reader::from_str(rels_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        b"Target" => target = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    rid_to_target.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    sheet_names
        .iter()
        .map(|name| {
            let target = name_to_rid.get(name).and_then(|rid| rid_to_target.get(rid))?;
            // Targets are relative to xl/ unless absolute within the package.
            Some(match target.strip_prefix('/') {
                Some(absolute) => absolute.to_string(),
                None => format!("xl/{target}"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fonts count="4">
    <font><sz val="11"/><name val="Calibri"/></font>
    <font><strike/><sz val="11"/></font>
    <font><b/><strike val="0"/></font>
    <font><strike val="1"/></font>
  </fonts>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="1"/></cellStyleXfs>
  <cellXfs count="4">
    <xf numFmtId="0" fontId="0"/>
    <xf numFmtId="0" fontId="1" applyFont="1"/>
    <xf numFmtId="0" fontId="2"><alignment horizontal="center"/></xf>
    <xf numFmtId="0" fontId="3"></xf>
  </cellXfs>
  <dxfs count="1"><dxf><font><strike/></font></dxf></dxfs>
</styleSheet>"#;

    #[test]
    fn test_parse_fonts_strike_flags() {
        assert_eq!(parse_fonts(STYLES), vec![false, true, false, true]);
    }

    #[test]
    fn test_parse_cell_xfs_ignores_cell_style_xfs() {
        assert_eq!(parse_cell_xfs(STYLES), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_struck_style_ids() {
        let styles = parse_styles_xml(STYLES);
        assert!(!styles.is_struck(0));
        assert!(styles.is_struck(1));
        assert!(!styles.is_struck(2));
        assert!(styles.is_struck(3));
        assert!(!styles.is_struck(99));
    }

    #[test]
    fn test_parse_struck_cells() {
        let styles = parse_styles_xml(STYLES);
        let sheet = r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" s="1" t="s"><v>1</v></c></row>
            <row r="2"><c r="A2" s="2"><v>3</v></c><c r="AB2" s="3"/></row>
        </sheetData></worksheet>"#;
        assert_eq!(parse_struck_cells(sheet, &styles), vec![(0, 1), (1, 27)]);
    }

    #[test]
    fn test_parse_cell_ref() {
        assert_eq!(parse_cell_ref("A1"), Some((0, 0)));
        assert_eq!(parse_cell_ref("Z10"), Some((9, 25)));
        assert_eq!(parse_cell_ref("AA1"), Some((0, 26)));
        assert_eq!(parse_cell_ref("A0"), None);
        assert_eq!(parse_cell_ref("7"), None);
        assert_eq!(parse_cell_ref("XFD3"), Some((2, 16_383)));
        assert_eq!(parse_cell_ref("ZZZZZZZZZZZZZZZZ1"), None);
    }

    #[test]
    fn test_resolve_worksheet_paths() {
        let workbook = r#"<workbook><sheets>
            <sheet name="Queues" sheetId="1" r:id="rId2"/>
            <sheet name="R&amp;D" sheetId="2" r:id="rId1"/>
        </sheets></workbook>"#;
        let rels = r#"<Relationships>
            <Relationship Id="rId1" Type="worksheet" Target="worksheets/sheet2.xml"/>
            <Relationship Id="rId2" Type="worksheet" Target="/xl/worksheets/sheet1.xml"/>
        </Relationships>"#;
        let names = vec!["Queues".to_string(), "R&D".to_string(), "Missing".to_string()];
        assert_eq!(
            resolve_worksheet_paths_for_sheets(workbook, rels, &names),
            vec![Some("xl/worksheets/sheet1.xml".to_string()), Some("xl/worksheets/sheet2.xml".to_string()), None]
        );
    }

    #[test]
    fn test_unescape_xml() {
        assert_eq!(unescape_xml("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(unescape_xml("plain"), "plain");
    }
}
