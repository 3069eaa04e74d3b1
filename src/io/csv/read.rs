//! Delimited text reading operations.

use std::{io::Cursor, path::Path};

use anyhow::{bail, Context, Result};
use log::{debug, info};
use polars::prelude::*;

use crate::{common, io::TextEncoding};

/// Parse delimited text with a header row; every column is read as a string.
fn read_delimited_str(text: &str, separator: u8, n_rows: Option<usize>) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_n_rows(n_rows)
        .map_parse_options(|po| po.with_separator(separator))
        .into_reader_with_file_handle(Cursor::new(text.as_bytes()))
        .finish()
        .context("[io::csv::read] Failed to parse delimited text")
}

/// Decode `bytes` with the first encoding in `encodings` that accepts them.
fn decode_with_fallback(bytes: &[u8], encodings: &[TextEncoding]) -> Option<(String, TextEncoding)> {
    encodings.iter().find_map(|&encoding| match encoding.decode(bytes) {
        Some(text) => Some((text, encoding)),
        None => {
            debug!("[io::csv::read] decoding as {encoding} failed, trying next");
            None
        }
    })
}

/// Reads a tab-delimited voter extract, trying each encoding in turn.
pub fn read_voter_file(path: &Path, encodings: &[TextEncoding], n_rows: Option<usize>) -> Result<DataFrame> {
    let bytes = common::read_bytes(path)
        .with_context(|| format!("[io::csv::read] Failed to open voter file: {}", path.display()))?;

    let Some((text, encoding)) = decode_with_fallback(&bytes, encodings) else {
        let tried = encodings.iter().map(|e| e.to_str()).collect::<Vec<_>>().join(", ");
        bail!("[io::csv::read] Could not decode {} with any encoding ({tried})", path.display());
    };

    let df = read_delimited_str(&text, b'\t', n_rows)
        .with_context(|| format!("[io::csv::read] Failed to read voter file {}", path.display()))?;
    info!("Loaded {} voters from {} using {encoding} encoding", df.height(), path.display());
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_delimited_as_strings() {
        let text = "voter_reg_num\tbirth_year\tres_street_address\n000123\t1980\t100 OAK ST\n000124\t1975\tPO BOX 1\n";
        let df = read_delimited_str(text, b'\t', None).unwrap();
        assert_eq!(df.height(), 2);
        let ids = df.column("voter_reg_num").unwrap().str().unwrap();
        assert_eq!(ids.get(0), Some("000123"));
        assert_eq!(df.column("birth_year").unwrap().str().unwrap().get(1), Some("1975"));
    }

    #[test]
    fn row_limit() {
        let text = "a\tb\n1\t2\n3\t4\n5\t6\n";
        assert_eq!(read_delimited_str(text, b'\t', Some(2)).unwrap().height(), 2);
    }

    #[test]
    fn fallback_picks_first_working_encoding() {
        let (text, encoding) = decode_with_fallback(b"caf\xE9", &TextEncoding::fallback_order()).unwrap();
        assert_eq!(text, "café");
        assert_eq!(encoding, TextEncoding::Latin1);
        assert!(decode_with_fallback(b"caf\xE9", &[TextEncoding::Utf8]).is_none());
    }

    #[test]
    fn voter_file_is_decoded_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ncvoter.txt");
        std::fs::write(&path, b"res_street_address\tvoter_status_desc\n12 M\xC9LANIE LN\tACTIVE\n4 O\x92NEAL CT\tACTIVE\n").unwrap();

        let df = read_voter_file(&path, &TextEncoding::fallback_order(), None).unwrap();
        let addr = df.column("res_street_address").unwrap().str().unwrap();
        assert_eq!(addr.get(0), Some("12 M\u{C9}LANIE LN"));
        assert_eq!(addr.get(1), Some("4 O\u{2019}NEAL CT"));
    }

    #[test]
    fn undecodable_voter_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ncvoter.txt");
        std::fs::write(&path, b"a\n\xFF\n").unwrap();
        assert!(read_voter_file(&path, &[TextEncoding::Utf8], None).is_err());
        assert!(read_voter_file(&dir.path().join("none.txt"), &[TextEncoding::Utf8], None).is_err());
    }
}
