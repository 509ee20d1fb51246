//! Header row detection for CSV exports with metadata preambles.
//!
//! World Bank and similar exports start with a few lines of metadata before
//! the real header. Detection is best effort: when the keyword is not found
//! within the scan window the file is assumed to have no preamble.

use crate::error::Result;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Return the 0-based index of the first line containing `keyword`.
///
/// At most `max_scan_lines` lines are inspected. Matching is a case-sensitive
/// substring test. Returns 0 when nothing matches.
pub fn detect_header_offset<I, S>(lines: I, keyword: &str, max_scan_lines: usize) -> usize
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .take(max_scan_lines)
        .position(|line| line.as_ref().contains(keyword))
        .unwrap_or(0)
}

/// [`detect_header_offset`] over the lines of a file.
///
/// Only the scan window is read. Lines that are not valid UTF-8 are decoded
/// lossily rather than aborting the scan.
pub fn detect_header_offset_in_file(
    path: impl AsRef<Path>,
    keyword: &str,
    max_scan_lines: usize,
) -> Result<usize> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    let mut lines = Vec::with_capacity(max_scan_lines);
    let mut buf = Vec::new();

    while lines.len() < max_scan_lines {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        lines.push(String::from_utf8_lossy(&buf).into_owned());
    }

    let offset = detect_header_offset(&lines, keyword, max_scan_lines);
    debug!(
        "Header offset for {}: {} (keyword '{}', scanned {} lines)",
        path.display(),
        offset,
        keyword,
        lines.len()
    );
    Ok(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn world_bank_preamble() -> Vec<&'static str> {
        vec![
            "\"Data Source\",\"World Development Indicators\",",
            "",
            "\"Last Updated Date\",\"2024-06-28\",",
            "",
            "",
            "\"Country Name\",\"Country Code\",\"Indicator Name\",\"Indicator Code\",\"2020\",",
            "\"Aruba\",\"ABW\",\"Population, total\",\"SP.POP.TOTL\",\"106585\",",
        ]
    }

    #[test]
    fn test_keyword_on_line_five() {
        assert_eq!(
            detect_header_offset(world_bank_preamble(), "Country Name", 20),
            5
        );
    }

    #[test]
    fn test_no_match_falls_back_to_zero() {
        assert_eq!(detect_header_offset(world_bank_preamble(), "iso3", 20), 0);
    }

    #[test]
    fn test_match_outside_window_is_ignored() {
        assert_eq!(detect_header_offset(world_bank_preamble(), "Country Name", 5), 0);
        assert_eq!(detect_header_offset(world_bank_preamble(), "Country Name", 6), 5);
    }

    #[test]
    fn test_match_is_case_sensitive_substring() {
        let lines = ["country name", "x,Country Names,y"];
        assert_eq!(detect_header_offset(lines, "Country Name", 20), 1);
    }

    #[test]
    fn test_empty_input() {
        let lines: Vec<String> = Vec::new();
        assert_eq!(detect_header_offset(lines, "Country Name", 20), 0);
    }

    #[test]
    fn test_detect_in_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in world_bank_preamble() {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();

        let offset = detect_header_offset_in_file(file.path(), "Country Name", 20).unwrap();
        assert_eq!(offset, 5);
    }

    #[test]
    fn test_detect_in_missing_file_errors() {
        let result = detect_header_offset_in_file("/definitely/not/here.csv", "Country", 20);
        assert!(result.is_err());
    }
}
