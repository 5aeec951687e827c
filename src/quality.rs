use crate::aggregate::{Cell, ViewTable};
use crate::record::RawSaleRecord;
use serde::Serialize;

/// Per-field missing-value counts over the raw, unfiltered set. Counts are
/// independent: one record can be tallied in several columns. An amount of
/// exactly zero counts as missing alongside a null amount.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QualityReport {
    pub total_rows: u64,
    pub missing_date: u64,
    pub missing_product: u64,
    pub missing_salesperson: u64,
    pub missing_boxes: u64,
    pub missing_amount: u64,
    pub missing_country: u64,
}

pub fn report(raws: &[RawSaleRecord]) -> QualityReport {
    let mut q = QualityReport {
        total_rows: raws.len() as u64,
        ..QualityReport::default()
    };
    for r in raws {
        q.missing_date += r.date.is_none() as u64;
        q.missing_product += r.product.is_none() as u64;
        q.missing_salesperson += r.salesperson.is_none() as u64;
        q.missing_boxes += r.boxes_shipped.is_none() as u64;
        q.missing_amount += r.amount.map_or(true, |a| a == 0.0) as u64;
        q.missing_country += r.country.is_none() as u64;
    }
    q
}

pub fn to_table(q: &QualityReport) -> ViewTable {
    ViewTable {
        name: "data_quality",
        columns: vec![
            "total_rows",
            "missing_date",
            "missing_product",
            "missing_salesperson",
            "missing_boxes",
            "missing_amount",
            "missing_country",
        ],
        rows: vec![vec![
            Cell::Int(q.total_rows as i64),
            Cell::Int(q.missing_date as i64),
            Cell::Int(q.missing_product as i64),
            Cell::Int(q.missing_salesperson as i64),
            Cell::Int(q.missing_boxes as i64),
            Cell::Int(q.missing_amount as i64),
            Cell::Int(q.missing_country as i64),
        ]],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn counts_each_field_independently() {
        let raws = vec![
            RawSaleRecord {
                id: 1,
                date: NaiveDate::from_ymd_opt(2022, 8, 1),
                product: Some("syrup".into()),
                salesperson: None,
                boxes_shipped: None,
                amount: Some(0.0), // explicit zero counts as missing
                country: Some("canada".into()),
            },
            RawSaleRecord {
                id: 2,
                date: None,
                product: None,
                salesperson: Some("john".into()),
                boxes_shipped: Some(4),
                amount: None,
                country: None,
            },
            RawSaleRecord {
                id: 3,
                date: NaiveDate::from_ymd_opt(2022, 8, 2),
                product: Some("zinc".into()),
                salesperson: Some("mary".into()),
                boxes_shipped: Some(1),
                amount: Some(120.0),
                country: Some("usa".into()),
            },
        ];
        let q = report(&raws);
        assert_eq!(q.total_rows, 3);
        assert_eq!(q.missing_date, 1);
        assert_eq!(q.missing_product, 1);
        assert_eq!(q.missing_salesperson, 1);
        assert_eq!(q.missing_boxes, 1);
        assert_eq!(q.missing_amount, 2);
        assert_eq!(q.missing_country, 1);
    }

    #[test]
    fn total_rows_counts_everything() {
        // rows the normalizer would drop still count here
        let raws = vec![RawSaleRecord::default(); 5];
        let q = report(&raws);
        assert_eq!(q.total_rows, 5);
        assert_eq!(q.missing_amount, 5);
    }

    #[test]
    fn empty_set() {
        assert_eq!(report(&[]), QualityReport::default());
        let t = to_table(&report(&[]));
        assert_eq!(t.rows.len(), 1);
        assert_eq!(t.rows[0][0], Cell::Int(0));
    }
}
