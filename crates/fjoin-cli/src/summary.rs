//! Terminal tables for join summaries and the type catalog.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use fjoin_core::PairReport;
use fjoin_model::SemanticType;

use crate::types::JoinOutcome;

pub fn print_summary(outcome: &JoinOutcome) {
    println!("Job: {}", outcome.job.display());
    println!(
        "Join: {} ({} left rows, {} right rows)",
        outcome.join_kind, outcome.left_rows, outcome.right_rows
    );
    println!("{}", pair_table(&outcome.pairs));
    println!("Result: {} rows, {} columns", outcome.rows, outcome.columns);
    match &outcome.output {
        Some(path) => println!("Output: {}", path.display()),
        None => println!("Output: not written (dry run)"),
    }
}

/// One row per column pair with its resolved matcher and match counts.
pub fn pair_table(pairs: &[PairReport]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Left"),
        header_cell("Right"),
        header_cell("Type"),
        header_cell("Keys"),
        header_cell("Values"),
        header_cell("Matched"),
        header_cell("Unreadable"),
    ]);
    apply_table_style(&mut table);
    for index in 3..7 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for pair in pairs {
        table.add_row(vec![
            Cell::new(&pair.left_column),
            Cell::new(&pair.right_column),
            Cell::new(pair.join_type),
            Cell::new(pair.key_columns),
            Cell::new(pair.left_values),
            matched_cell(pair.matched, pair.left_values),
            count_cell(pair.coercion_failures, Color::Yellow),
        ]);
    }
    table
}

/// The semantic type catalog and the matcher each tag selects.
pub fn types_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Type"),
        header_cell("Matcher"),
        header_cell("URI"),
    ]);
    apply_table_style(&mut table);
    for semantic in SemanticType::CATALOG {
        let family = semantic
            .family()
            .map(|family| family.to_string())
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(semantic.name()),
            Cell::new(family),
            Cell::new(semantic.uri().unwrap_or("-")),
        ]);
    }
    table
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn matched_cell(matched: usize, total: usize) -> Cell {
    let cell = Cell::new(matched);
    if total == 0 {
        cell.fg(Color::DarkGrey)
    } else if matched == total {
        cell.fg(Color::Green)
    } else if matched == 0 {
        cell.fg(Color::Red)
    } else {
        cell
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count == 0 {
        Cell::new("-").fg(Color::DarkGrey)
    } else {
        Cell::new(count).fg(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fjoin_model::JoinType;

    fn report(matched: usize, failures: usize) -> PairReport {
        PairReport {
            left_column: "name".to_string(),
            right_column: "station".to_string(),
            join_type: JoinType::String,
            key_columns: 1,
            left_values: 4,
            matched,
            coercion_failures: failures,
        }
    }

    #[test]
    fn pair_table_has_one_row_per_pair() {
        let mut table = pair_table(&[report(4, 0), report(1, 2)]);
        table.force_no_tty();
        assert_eq!(table.row_count(), 2);
        let rendered = table.to_string();
        assert!(rendered.contains("station"));
        assert!(rendered.contains("Unreadable"));
        assert!(!rendered.contains('\u{1b}'));
    }

    #[test]
    fn types_table_lists_catalog() {
        let mut table = types_table();
        table.force_no_tty();
        assert_eq!(table.row_count(), SemanticType::CATALOG.len());
        let rendered = table.to_string();
        assert!(rendered.contains("bounding_polygon"));
        assert!(rendered.contains("http://schema.org/DateTime"));
    }
}
