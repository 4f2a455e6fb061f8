// CSV/TSV import: a single sheet, values only (no strikethrough)

use std::io::Read;
use std::path::Path;

use routerecon_engine::Sheet;

use crate::error::IoError;

pub fn import(path: &Path, sheet_name: &str) -> Result<Sheet, IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = delimiter_for(path, &content);
    log::debug!("{}: delimiter {:?}", path.display(), delimiter as char);
    import_from_string(&content, delimiter, sheet_name).map_err(|e| IoError::workbook(path, e))
}

/// Field separators seen in routing exports, in tie-break order.
const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// `.tsv` is always tab-separated. Otherwise the separator that splits the
/// first non-blank line (the header row) into the most fields wins; locale
/// Excel exports use `;`.
fn delimiter_for(path: &Path, content: &str) -> u8 {
    let is_tsv = path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("tsv"));
    if is_tsv {
        return b'\t';
    }

    let Some(header) = content.lines().find(|line| !line.trim().is_empty()) else {
        return b',';
    };
    DELIMITERS
        .iter()
        .copied()
        .map(|delim| (delim, header_fields(header, delim)))
        .fold((b',', 1), |best, (delim, fields)| if fields > best.1 { (delim, fields) } else { best })
        .0
}

fn header_fields(header: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(header.as_bytes())
        .records()
        .next()
        .and_then(Result::ok)
        .map_or(1, |record| record.len())
}

/// Read file and convert to UTF-8 if needed (Excel-exported CSVs are often Windows-1252)
fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let mut file = std::fs::File::open(path).map_err(|e| IoError::read(path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| IoError::read(path, e))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(s)),
        Err(e) => {
            let bytes = e.into_bytes();
            log::debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn import_from_string(content: &str, delimiter: u8, sheet_name: &str) -> Result<Sheet, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut sheet = Sheet::new(sheet_name);
    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        for (col_idx, field) in record.iter().enumerate() {
            if !field.is_empty() {
                sheet.set_value(row_idx, col_idx, field);
            }
        }
    }

    log::info!("imported CSV sheet '{}': {} cell(s)", sheet_name, sheet.cell_count());
    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn delim(name: &str, content: &str) -> char {
        delimiter_for(Path::new(name), content) as char
    }

    #[test]
    fn header_row_picks_the_delimiter() {
        assert_eq!(delim("q.csv", "Name;Site;Group\nVQ_A;PAR;AG_1\n"), ';');
        assert_eq!(delim("q.csv", "Name,Site,Group\nVQ_A,PAR,AG_1\n"), ',');
        assert_eq!(delim("q.txt", "Name\tSite\nVQ_A\tPAR\n"), '\t');
        assert_eq!(delim("q.csv", "\n\nName|Site\n"), '|');
    }

    #[test]
    fn quoted_commas_do_not_win() {
        let content = "Name;\"Skills, primary\";Site\nVQ_A;\"SK_1, SK_2\";PAR\n";
        assert_eq!(delim("q.csv", content), ';');
    }

    #[test]
    fn tsv_extension_and_single_column() {
        assert_eq!(delim("q.TSV", "Name,Site\n"), '\t');
        assert_eq!(delim("q.csv", "Name\nVQ_A\n"), ',');
        assert_eq!(delim("q.csv", ""), ',');
    }

    #[test]
    fn test_import_keeps_positions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("queues.csv");
        fs::write(&path, "\u{feff}Name;Site\nVQ_A;\n;LON\n").unwrap();

        let sheet = import(&path, "Queues").unwrap();
        assert_eq!(sheet.name, "Queues");
        assert_eq!(sheet.text(0, 0).as_deref(), Some("Name"));
        assert_eq!(sheet.text(1, 0).as_deref(), Some("VQ_A"));
        assert_eq!(sheet.text(1, 1), None);
        assert_eq!(sheet.text(2, 1).as_deref(), Some("LON"));
        assert!(sheet.cells().all(|(_, cell)| !cell.struck_through));
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        // "Café,Zürich" in Windows-1252
        fs::write(&path, [b'C', b'a', b'f', 0xE9, b',', b'Z', 0xFC, b'r', b'i', b'c', b'h', b'\n']).unwrap();

        let sheet = import(&path, "Sheet1").unwrap();
        assert_eq!(sheet.text(0, 0).as_deref(), Some("Café"));
        assert_eq!(sheet.text(0, 1).as_deref(), Some("Zürich"));
    }
}
