use crate::loader::{non_empty, parse_date};
use crate::record::RawSaleRecord;
use anyhow::{Context, Result};
use serde::Deserialize;

/// Wire shape of one JSONL row; field names match the delimited header.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonRow {
    sale_date: Option<String>,
    product: Option<String>,
    sales_person: Option<String>,
    boxes_shipped: Option<u32>,
    amount_usd: Option<f64>,
    country: Option<String>,
}

/// One JSON object per line. Unlike the delimited loader, a line that is
/// not valid JSON is a fatal load error: structured input is held to its
/// own contract.
pub fn parse_jsonl(input: &str) -> Result<Vec<RawSaleRecord>> {
    let mut out = Vec::new();
    for (lineno, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row: JsonRow = serde_json::from_str(line)
            .with_context(|| format!("invalid JSON on line {}", lineno + 1))?;

        let text = |v: Option<String>| v.as_deref().and_then(non_empty).map(str::to_string);
        out.push(RawSaleRecord {
            id: out.len() as u64 + 1,
            date: row.sale_date.as_deref().and_then(non_empty).and_then(parse_date),
            product: text(row.product),
            salesperson: text(row.sales_person),
            boxes_shipped: row.boxes_shipped,
            amount: row.amount_usd,
            country: text(row.country),
        });
    }
    Ok(out)
}
