use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use annot_core::RunSummary;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn print_summary(summary: &RunSummary) {
    println!(
        "{} ({}) started at {}",
        summary.display_name,
        summary.module,
        summary.started_at.format(TIMESTAMP_FORMAT)
    );
    println!("Output: {}", summary.paths.output.display());
    if summary.record_errors > 0 {
        println!("Errors: {}", summary.paths.error_log.display());
    }
    println!("{}", summary_table(summary));
    println!(
        "{} ({}) finished at {}",
        summary.display_name,
        summary.module,
        summary.finished_at.format(TIMESTAMP_FORMAT)
    );
    println!("runtime: {}", format_runtime(summary.runtime_secs()));
}

pub fn summary_table(summary: &RunSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Records"),
        header_cell("Rows written"),
        header_cell("Skipped"),
        header_cell("Failed"),
        header_cell("Distinct errors"),
    ]);
    apply_table_style(&mut table);
    for index in 0..5 {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
    table.add_row(vec![
        Cell::new(summary.records_read),
        Cell::new(summary.rows_written),
        Cell::new(summary.skipped),
        count_cell(summary.record_errors),
        count_cell(summary.unique_errors),
    ]);
    table
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

/// Seconds with three decimals.
pub fn format_runtime(secs: f64) -> String {
    format!("{secs:.3}s")
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize) -> Cell {
    if count == 0 {
        Cell::new(count).fg(Color::DarkGrey)
    } else {
        Cell::new(count).fg(Color::Red)
    }
}
