pub mod delimited;
pub mod jsonl;

use crate::record::RawSaleRecord;
use anyhow::{anyhow, Result};
use chrono::NaiveDate;

pub fn parse(format: &str, input: &str) -> Result<Vec<RawSaleRecord>> {
    match format {
        "csv" => delimited::parse_delimited(input, ','),
        "tsv" => delimited::parse_delimited(input, '\t'),
        "jsonl" => jsonl::parse_jsonl(input),
        _ => Err(anyhow!("Unknown input format: {}", format)),
    }
}

// Cell values treated as missing, compared case-insensitively.
static NULL_TOKENS: &[&str] = &["null", "n/a", "na", "none"];

/// Trim a cell and map empty or null-marked values to `None`.
pub(crate) fn non_empty(cell: &str) -> Option<&str> {
    let t = cell.trim();
    if t.is_empty() || NULL_TOKENS.iter().any(|n| t.eq_ignore_ascii_case(n)) {
        None
    } else {
        Some(t)
    }
}

/// Accepts ISO (2022-08-01) or US (08/01/2022) dates.
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_tokens_map_to_none() {
        assert_eq!(non_empty("  canada "), Some("canada"));
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty("   "), None);
        assert_eq!(non_empty("NULL"), None);
        assert_eq!(non_empty("n/a"), None);
        assert_eq!(non_empty("None"), None);
    }

    #[test]
    fn both_date_formats() {
        let d = NaiveDate::from_ymd_opt(2022, 8, 1).unwrap();
        assert_eq!(parse_date("2022-08-01"), Some(d));
        assert_eq!(parse_date("08/01/2022"), Some(d));
        assert_eq!(parse_date("01-08-2022"), None);
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn unknown_format_is_an_error() {
        assert!(parse("parquet", "x").is_err());
    }
}
