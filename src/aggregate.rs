use crate::record::NormalizedSaleRecord;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::hash::Hash;

const TOP_N: usize = 10;

/// One output cell. Untagged so JSON exports carry plain strings/numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(x) => write!(f, "{}", x),
        }
    }
}

/// A named, ordered table: the unit every writer consumes and every view
/// produces.
#[derive(Debug, Clone)]
pub struct ViewTable {
    pub name: &'static str,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct GroupStats {
    pub total_sales: f64,
    pub total_boxes: u64,
    pub order_count: u64,
}

impl GroupStats {
    fn cells(self) -> [Cell; 3] {
        [
            Cell::Float(self.total_sales),
            Cell::Int(self.total_boxes as i64),
            Cell::Int(self.order_count as i64),
        ]
    }
}

const METRIC_COLUMNS: [&str; 3] = ["total_sales", "total_boxes", "order_count"];

/// Group records by a key projection, accumulating the three reducers.
/// Groups come back in first-occurrence order, which makes input order the
/// tie-break for the stable sorts below.
pub(crate) fn grouped<K, F>(records: &[NormalizedSaleRecord], key: F) -> Vec<(K, GroupStats)>
where
    K: Eq + Hash,
    F: Fn(&NormalizedSaleRecord) -> K,
{
    let mut groups: IndexMap<K, GroupStats> = IndexMap::new();
    for r in records {
        let stats = groups.entry(key(r)).or_default();
        stats.total_sales += r.amount;
        stats.total_boxes += r.boxes_shipped as u64;
        stats.order_count += 1;
    }
    groups.into_iter().collect()
}

pub(crate) fn sort_by_sales_desc<K>(rows: &mut [(K, GroupStats)]) {
    rows.sort_by(|a, b| b.1.total_sales.total_cmp(&a.1.total_sales));
}

fn single_key_view(
    name: &'static str,
    key_column: &'static str,
    records: &[NormalizedSaleRecord],
    key: fn(&NormalizedSaleRecord) -> String,
) -> ViewTable {
    let mut groups = grouped(records, key);
    sort_by_sales_desc(&mut groups);

    let mut columns = vec![key_column];
    columns.extend(METRIC_COLUMNS);
    ViewTable {
        name,
        columns,
        rows: groups
            .into_iter()
            .map(|(k, stats)| {
                let mut row = vec![Cell::Text(k)];
                row.extend(stats.cells());
                row
            })
            .collect(),
    }
}

pub fn sales_by_country(records: &[NormalizedSaleRecord]) -> ViewTable {
    single_key_view("sales_by_country", "country", records, |r| r.country.clone())
}

pub fn sales_by_salesperson(records: &[NormalizedSaleRecord]) -> ViewTable {
    single_key_view("sales_by_salesperson", "sales_person", records, |r| {
        r.salesperson.clone()
    })
}

pub fn sales_by_product(records: &[NormalizedSaleRecord]) -> ViewTable {
    single_key_view("sales_by_product", "product", records, |r| r.product.clone())
}

pub fn deal_size(records: &[NormalizedSaleRecord]) -> ViewTable {
    single_key_view("deal_size", "value_tier", records, |r| r.tier.to_string())
}

/// By-salesperson view truncated to the first ten groups after the sort.
pub fn top_salespersons(records: &[NormalizedSaleRecord]) -> ViewTable {
    let mut table = sales_by_salesperson(records);
    table.name = "top_salespersons";
    table.rows.truncate(TOP_N);
    table
}

/// The one view not sorted by revenue: chronological by (year, month).
pub fn monthly_sales(records: &[NormalizedSaleRecord]) -> ViewTable {
    let mut groups = grouped(records, |r| (r.year, r.month, r.month_label.clone()));
    groups.sort_by_key(|(k, _)| (k.0, k.1));

    let mut columns = vec!["year", "month", "month_label"];
    columns.extend(METRIC_COLUMNS);
    ViewTable {
        name: "monthly_sales",
        columns,
        rows: groups
            .into_iter()
            .map(|((year, month, label), stats)| {
                let mut row = vec![
                    Cell::Int(year as i64),
                    Cell::Int(month as i64),
                    Cell::Text(label),
                ];
                row.extend(stats.cells());
                row
            })
            .collect(),
    }
}

pub fn sales_by_product_country(records: &[NormalizedSaleRecord]) -> ViewTable {
    let mut groups = grouped(records, |r| (r.product.clone(), r.country.clone()));
    sort_by_sales_desc(&mut groups);

    let mut columns = vec!["product", "country"];
    columns.extend(METRIC_COLUMNS);
    ViewTable {
        name: "sales_by_product_country",
        columns,
        rows: groups
            .into_iter()
            .map(|((product, country), stats)| {
                let mut row = vec![Cell::Text(product), Cell::Text(country)];
                row.extend(stats.cells());
                row
            })
            .collect(),
    }
}

/// The full normalized set as a table, one row per record in input order.
pub fn sales_export(records: &[NormalizedSaleRecord]) -> ViewTable {
    ViewTable {
        name: "sales_export",
        columns: vec![
            "id",
            "sale_date",
            "product",
            "sales_person",
            "boxes_shipped",
            "amount_usd",
            "country",
            "year",
            "month",
            "month_label",
            "value_tier",
        ],
        rows: records
            .iter()
            .map(|r| {
                vec![
                    Cell::Int(r.id as i64),
                    Cell::Text(r.date.to_string()),
                    Cell::Text(r.product.clone()),
                    Cell::Text(r.salesperson.clone()),
                    Cell::Int(r.boxes_shipped as i64),
                    Cell::Float(r.amount),
                    Cell::Text(r.country.clone()),
                    Cell::Int(r.year as i64),
                    Cell::Int(r.month as i64),
                    Cell::Text(r.month_label.clone()),
                    Cell::Text(r.tier.to_string()),
                ]
            })
            .collect(),
    }
}
