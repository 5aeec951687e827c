mod aggregate;
mod kpi;
mod loader;
mod normalizer;
mod output;
mod quality;
mod record;

use aggregate::ViewTable;
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use memmap2::Mmap;
use record::NormalizedSaleRecord;
use std::fs::File;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Raw sales data to load
    #[arg(value_name = "FILE")]
    file: String,

    /// Input format: csv, tsv, or jsonl
    #[arg(short, long, default_value = "csv")]
    format: String,

    /// Directory the view exports are written to
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Export format: csv, tsv, json, jsonl, or stdout
    #[arg(short, long, default_value = "csv")]
    export: String,

    /// Append a _YYYYmmdd_HHMMSS suffix to export filenames
    #[arg(long)]
    timestamp: bool,

    #[arg(long)]
    benchmark: bool,
}

// Builders all share one signature so the set can run in parallel; each
// view reads the same immutable normalized set.
const VIEW_BUILDERS: &[fn(&[NormalizedSaleRecord]) -> ViewTable] = &[
    aggregate::sales_export,
    aggregate::sales_by_country,
    aggregate::sales_by_salesperson,
    aggregate::sales_by_product,
    aggregate::top_salespersons,
    aggregate::monthly_sales,
    aggregate::deal_size,
    aggregate::sales_by_product_country,
    kpi::summary,
];

fn main() -> Result<()> {
    let args = Args::parse();
    let start_time = Instant::now();

    let file =
        File::open(&args.file).with_context(|| format!("cannot open {}", args.file))?;
    let file_size = file.metadata()?.len();

    // mmap the file
    let mmap = unsafe { Mmap::map(&file)? };
    let input = std::str::from_utf8(&mmap)
        .with_context(|| format!("{} is not valid UTF-8", args.file))?;

    let raws = loader::parse(&args.format, input)
        .with_context(|| format!("failed to load {}", args.file))?;
    let report = quality::report(&raws);
    let normalized = normalizer::normalize_all(&raws);

    let mut tables = build_views(&normalized);
    tables.push(quality::to_table(&report));

    // writer thread drains the channel, one export per table
    let (tx, rx) = crossbeam::channel::unbounded::<ViewTable>();
    let out_dir = args.output.clone();
    let export = args.export.clone();
    let suffix = if args.timestamp {
        format!("_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };
    let writer_handle = std::thread::spawn(move || -> Result<()> {
        for table in rx {
            let target = export_target(&out_dir, table.name, &suffix, &export);
            let mut writer = output::create_writer(&target)?;
            writer.write_table(&table)?;
            writer.finish()?;
        }
        Ok(())
    });

    for table in tables {
        // a failed send means the writer bailed; its error surfaces below
        if tx.send(table).is_err() {
            break;
        }
    }
    drop(tx);
    match writer_handle.join() {
        Ok(result) => result?,
        Err(_) => return Err(anyhow!("writer thread panicked")),
    }

    if args.benchmark {
        print_benchmark_results(
            file_size,
            raws.len(),
            normalized.len(),
            start_time.elapsed(),
        );
    }

    Ok(())
}

#[cfg(feature = "parallel")]
fn build_views(normalized: &[NormalizedSaleRecord]) -> Vec<ViewTable> {
    VIEW_BUILDERS.par_iter().map(|f| f(normalized)).collect()
}

#[cfg(not(feature = "parallel"))]
fn build_views(normalized: &[NormalizedSaleRecord]) -> Vec<ViewTable> {
    VIEW_BUILDERS.iter().map(|f| f(normalized)).collect()
}

fn export_target(dir: &str, name: &str, suffix: &str, export: &str) -> String {
    if export == "stdout" {
        return "stdout".to_string();
    }
    format!("{}/{}{}.{}", dir.trim_end_matches('/'), name, suffix, export)
}

fn print_benchmark_results(
    file_size: u64,
    raw_rows: usize,
    normalized_rows: usize,
    duration: std::time::Duration,
) {
    let duration_secs = duration.as_secs_f64();
    let file_size_mb = file_size as f64 / (1024.0 * 1024.0);

    eprintln!("\n=== BENCHMARK RESULTS ===");
    eprintln!("File size: {:.2} MB", file_size_mb);
    eprintln!("Raw rows: {}", raw_rows);
    eprintln!("Normalized rows: {}", normalized_rows);
    eprintln!("Excluded rows: {}", raw_rows - normalized_rows);
    eprintln!("Processing time: {:.3}s", duration_secs);
    eprintln!("Throughput: {:.2} MB/s", file_size_mb / duration_secs);
    eprintln!("Throughput: {:.0} rows/s", raw_rows as f64 / duration_secs);
    eprintln!(
        "Clean rate: {:.1}%",
        (normalized_rows as f64 / raw_rows.max(1) as f64) * 100.0
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_targets() {
        assert_eq!(
            export_target("./outputs/", "deal_size", "", "csv"),
            "./outputs/deal_size.csv"
        );
        assert_eq!(
            export_target("out", "kpi_summary", "_20220801_120000", "jsonl"),
            "out/kpi_summary_20220801_120000.jsonl"
        );
        assert_eq!(export_target("out", "deal_size", "", "stdout"), "stdout");
    }

    #[test]
    fn every_view_gets_built() {
        let tables = build_views(&[]);
        let names: Vec<&str> = tables.iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "sales_export",
                "sales_by_country",
                "sales_by_salesperson",
                "sales_by_product",
                "top_salespersons",
                "monthly_sales",
                "deal_size",
                "sales_by_product_country",
                "kpi_summary",
            ]
        );
    }
}
