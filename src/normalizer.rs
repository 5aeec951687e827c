use crate::record::{NormalizedSaleRecord, RawSaleRecord, ValueTier};
use chrono::Datelike;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "parallel")]
const PAR_THRESHOLD: usize = 10_000;

/// Clean a single raw record. Returns `None` when date, amount, or country
/// is missing; those rows are dropped from every downstream view and only
/// show up in the quality report. Missing text elsewhere becomes an empty
/// string, missing boxes become 0.
pub fn normalize(raw: &RawSaleRecord) -> Option<NormalizedSaleRecord> {
    let date = raw.date?;
    let amount = raw.amount?;
    let country = title_case(raw.country.as_deref()?);

    Some(NormalizedSaleRecord {
        id: raw.id,
        date,
        product: title_case(raw.product.as_deref().unwrap_or("")),
        salesperson: title_case(raw.salesperson.as_deref().unwrap_or("")),
        boxes_shipped: raw.boxes_shipped.unwrap_or(0),
        amount,
        country,
        year: date.year(),
        month: date.month(),
        month_label: date.format("%b %Y").to_string(),
        tier: ValueTier::of(amount),
    })
}

pub fn normalize_all(raws: &[RawSaleRecord]) -> Vec<NormalizedSaleRecord> {
    #[cfg(feature = "parallel")]
    {
        if raws.len() > PAR_THRESHOLD {
            return raws.par_iter().filter_map(normalize).collect();
        }
    }
    raws.iter().filter_map(normalize).collect()
}

/// Trim, then uppercase the first letter of each whitespace-separated word
/// and lowercase the rest. Runs of whitespace collapse to a single space.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, word) in s.split_whitespace().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.extend(chars.flat_map(|c| c.to_lowercase()));
        }
    }
    out
}
