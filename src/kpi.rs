use crate::aggregate::{grouped, sort_by_sales_desc, Cell, ViewTable};
use crate::record::NormalizedSaleRecord;

const KPI_COLUMNS: [&str; 7] = [
    "total_revenue",
    "total_orders",
    "avg_order_value",
    "avg_revenue_per_product",
    "top_salesperson",
    "top_salesperson_revenue",
    "monthly_growth_pct",
];

/// One-row KPI summary over the normalized set. An empty set yields an
/// empty table (the export is skipped rather than filled with zeros).
pub fn summary(records: &[NormalizedSaleRecord]) -> ViewTable {
    let mut table = ViewTable {
        name: "kpi_summary",
        columns: KPI_COLUMNS.to_vec(),
        rows: Vec::new(),
    };
    if records.is_empty() {
        return table;
    }

    let total_revenue: f64 = records.iter().map(|r| r.amount).sum();
    let total_orders = records.len() as i64;
    let avg_order_value = total_revenue / total_orders as f64;

    let by_product = grouped(records, |r| r.product.clone());
    let avg_revenue_per_product = total_revenue / by_product.len() as f64;

    let mut by_salesperson = grouped(records, |r| r.salesperson.clone());
    sort_by_sales_desc(&mut by_salesperson);
    let (top_salesperson, top_stats) = &by_salesperson[0];

    let mut monthly = grouped(records, |r| (r.year, r.month));
    monthly.sort_by_key(|(k, _)| *k);
    let monthly_growth_pct = match monthly.as_slice() {
        [.., (_, prev), (_, last)] if prev.total_sales != 0.0 => {
            (last.total_sales - prev.total_sales) / prev.total_sales * 100.0
        }
        _ => 0.0,
    };

    table.rows.push(vec![
        Cell::Float(round2(total_revenue)),
        Cell::Int(total_orders),
        Cell::Float(round2(avg_order_value)),
        Cell::Float(round2(avg_revenue_per_product)),
        Cell::Text(top_salesperson.clone()),
        Cell::Float(round2(top_stats.total_sales)),
        Cell::Float(round2(monthly_growth_pct)),
    ]);
    table
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use crate::record::RawSaleRecord;
    use chrono::NaiveDate;

    fn rec(date: &str, product: &str, person: &str, amount: f64) -> NormalizedSaleRecord {
        normalize(&RawSaleRecord {
            id: 0,
            date: Some(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()),
            product: Some(product.to_string()),
            salesperson: Some(person.to_string()),
            boxes_shipped: Some(1),
            amount: Some(amount),
            country: Some("canada".to_string()),
        })
        .unwrap()
    }

    #[test]
    fn computes_the_summary_row() {
        let records = vec![
            rec("2022-07-01", "syrup", "priya", 1000.0),
            rec("2022-07-15", "zinc", "john", 200.0),
            rec("2022-08-02", "syrup", "priya", 300.0),
        ];
        let t = summary(&records);
        assert_eq!(t.rows.len(), 1);
        let row = &t.rows[0];
        assert_eq!(row[0], Cell::Float(1500.0)); // total revenue
        assert_eq!(row[1], Cell::Int(3));
        assert_eq!(row[2], Cell::Float(500.0)); // avg order value
        assert_eq!(row[3], Cell::Float(750.0)); // 1500 over 2 products
        assert_eq!(row[4], Cell::Text("Priya".into()));
        assert_eq!(row[5], Cell::Float(1300.0));
        // Jul 1200 -> Aug 300 : -75%
        assert_eq!(row[6], Cell::Float(-75.0));
    }

    #[test]
    fn single_month_has_zero_growth() {
        let records = vec![rec("2022-07-01", "syrup", "priya", 100.0)];
        let t = summary(&records);
        assert_eq!(t.rows[0][6], Cell::Float(0.0));
    }

    #[test]
    fn empty_set_skips_the_row() {
        let t = summary(&[]);
        assert!(t.rows.is_empty());
        assert_eq!(t.columns.len(), 7);
    }

    #[test]
    fn rounds_to_cents() {
        let records = vec![
            rec("2022-07-01", "a", "p", 10.0),
            rec("2022-07-02", "a", "p", 10.0),
            rec("2022-07-03", "a", "p", 10.01),
        ];
        let t = summary(&records);
        assert_eq!(t.rows[0][2], Cell::Float(10.0)); // 30.01 / 3 rounded
    }
}
