use crate::loader::{non_empty, parse_date};
use crate::record::RawSaleRecord;
use anyhow::{anyhow, Result};
use memchr::memchr_iter;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "parallel")]
const CHUNK_BYTES: usize = 4 * 1024 * 1024; // newline-aligned parallel chunks
const AVG_LINE_LEN: usize = 64; // for pre-sizing output vectors

const COL_DATE: &str = "sale_date";
const COL_PRODUCT: &str = "product";
const COL_SALESPERSON: &str = "sales_person";
const COL_BOXES: &str = "boxes_shipped";
const COL_AMOUNT: &str = "amount_usd";
const COL_COUNTRY: &str = "country";

/// Field positions resolved from the header row, so column order in the
/// file is free.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    date: usize,
    product: usize,
    salesperson: usize,
    boxes: usize,
    amount: usize,
    country: usize,
}

impl ColumnMap {
    fn from_header(line: &str, delim: char) -> Result<ColumnMap> {
        let fields = split_fields(line, delim);
        let idx = |name: &str| {
            fields
                .iter()
                .position(|f| f.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| anyhow!("missing column '{}' in header", name))
        };
        Ok(ColumnMap {
            date: idx(COL_DATE)?,
            product: idx(COL_PRODUCT)?,
            salesperson: idx(COL_SALESPERSON)?,
            boxes: idx(COL_BOXES)?,
            amount: idx(COL_AMOUNT)?,
            country: idx(COL_COUNTRY)?,
        })
    }
}

/// Parse a delimited file with a header row into raw records. Missing or
/// unparseable cells become `None` on the record; the row itself is kept so
/// the quality report can count it. Ids are assigned in file order.
pub fn parse_delimited(input: &str, delim: char) -> Result<Vec<RawSaleRecord>> {
    let (header, body) = match input.find('\n') {
        Some(nl) => (&input[..nl], &input[nl + 1..]),
        None => (input, ""),
    };
    let cols = ColumnMap::from_header(header.trim_end_matches('\r'), delim)?;

    let mut records = parse_body(body, cols, delim);
    for (i, r) in records.iter_mut().enumerate() {
        r.id = i as u64 + 1;
    }
    Ok(records)
}

fn parse_body(body: &str, cols: ColumnMap, delim: char) -> Vec<RawSaleRecord> {
    #[cfg(feature = "parallel")]
    {
        if body.len() > CHUNK_BYTES {
            return parse_parallel(body, cols, delim);
        }
    }
    let mut out = Vec::with_capacity(body.len() / AVG_LINE_LEN);
    parse_chunk_into_vec(body, cols, delim, &mut out);
    out
}

#[cfg(feature = "parallel")]
fn parse_parallel(body: &str, cols: ColumnMap, delim: char) -> Vec<RawSaleRecord> {
    let bytes = body.as_bytes();
    let len = bytes.len();

    // build ranges aligned to newline boundaries
    let mut ranges = Vec::<std::ops::Range<usize>>::new();
    let mut start = 0usize;
    while start < len {
        let mut end = (start + CHUNK_BYTES).min(len);
        if end < len {
            while end < len && bytes[end] != b'\n' {
                end += 1;
            }
            if end < len {
                end += 1; // include newline
            }
        } else {
            end = len;
        }
        ranges.push(start..end);
        start = end;
    }

    let parts: Vec<Vec<RawSaleRecord>> = ranges
        .into_par_iter()
        .map(|r| {
            let mut out = Vec::with_capacity((r.end - r.start) / AVG_LINE_LEN);
            parse_chunk_into_vec(&body[r], cols, delim, &mut out);
            out
        })
        .collect();

    let total: usize = parts.iter().map(Vec::len).sum();
    let mut result = Vec::with_capacity(total);
    for mut p in parts {
        result.append(&mut p);
    }
    result
}

fn parse_chunk_into_vec(chunk: &str, cols: ColumnMap, delim: char, out: &mut Vec<RawSaleRecord>) {
    let bytes = chunk.as_bytes();
    let mut start = 0usize;
    for nl in memchr_iter(b'\n', bytes) {
        push_line(&chunk[start..nl], cols, delim, out);
        start = nl + 1;
    }
    if start < chunk.len() {
        push_line(&chunk[start..], cols, delim, out);
    }
}

fn push_line(line: &str, cols: ColumnMap, delim: char, out: &mut Vec<RawSaleRecord>) {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return;
    }
    let fields = split_fields(line, delim);
    let cell = |i: usize| fields.get(i).map(String::as_str).and_then(non_empty);

    out.push(RawSaleRecord {
        id: 0, // assigned after the full pass
        date: cell(cols.date).and_then(parse_date),
        product: cell(cols.product).map(str::to_string),
        salesperson: cell(cols.salesperson).map(str::to_string),
        boxes_shipped: cell(cols.boxes).and_then(|s| s.parse().ok()),
        amount: cell(cols.amount).and_then(|s| s.parse().ok()),
        country: cell(cols.country).map(str::to_string),
    });
}

/// Split one line into fields, honoring double-quoted fields with `""`
/// escapes.
fn split_fields(line: &str, delim: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else if c == '"' && field.is_empty() {
            in_quotes = true;
        } else if c == delim {
            fields.push(std::mem::take(&mut field));
        } else {
            field.push(c);
        }
    }
    fields.push(field);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = "\
sale_date,product,sales_person,boxes_shipped,amount_usd,country
2022-08-01, cough syrup ,priya singh,,1626,canada
,aspirin,john doe,5,50,usa
2022-09-15,\"ibuprofen, forte\",jane roe,12,abc,\"united kingdom\"
";

    #[test]
    fn parses_rows_and_assigns_ids() {
        let rows = parse_delimited(SAMPLE, ',').unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[2].id, 3);

        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2022, 8, 1));
        assert_eq!(rows[0].product.as_deref(), Some("cough syrup"));
        assert_eq!(rows[0].boxes_shipped, None);
        assert_eq!(rows[0].amount, Some(1626.0));

        // missing date stays None, row is still loaded
        assert_eq!(rows[1].date, None);
        assert_eq!(rows[1].boxes_shipped, Some(5));
    }

    #[test]
    fn quoted_fields_and_bad_numerics() {
        let rows = parse_delimited(SAMPLE, ',').unwrap();
        assert_eq!(rows[2].product.as_deref(), Some("ibuprofen, forte"));
        assert_eq!(rows[2].country.as_deref(), Some("united kingdom"));
        // "abc" is not an amount; the cell degrades to None
        assert_eq!(rows[2].amount, None);
    }

    #[test]
    fn header_order_is_free() {
        let input = "country,amount_usd,sale_date,product,sales_person,boxes_shipped\n\
                     india,200,2022-01-02,paracetamol,amit rao,7\n";
        let rows = parse_delimited(input, ',').unwrap();
        assert_eq!(rows[0].country.as_deref(), Some("india"));
        assert_eq!(rows[0].amount, Some(200.0));
        assert_eq!(rows[0].boxes_shipped, Some(7));
    }

    #[test]
    fn missing_header_column_is_fatal() {
        let err = parse_delimited("sale_date,product\n2022-01-01,x\n", ',').unwrap_err();
        assert!(err.to_string().contains("sales_person"));
    }

    #[test]
    fn tsv_and_crlf() {
        let input = "sale_date\tproduct\tsales_person\tboxes_shipped\tamount_usd\tcountry\r\n\
                     2022-03-04\tzinc\tmary\t2\t75.5\tkenya\r\n";
        let rows = parse_delimited(input, '\t').unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country.as_deref(), Some("kenya"));
        assert_eq!(rows[0].amount, Some(75.5));
    }

    #[test]
    fn header_only_gives_empty_set() {
        let rows =
            parse_delimited("sale_date,product,sales_person,boxes_shipped,amount_usd,country", ',')
                .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn split_quoted_escape() {
        let f = split_fields(r#"a,"b""c",d"#, ',');
        assert_eq!(f, vec!["a", "b\"c", "d"]);
    }
}
