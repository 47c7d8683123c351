use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use tsd_roll::RollSummary;
use tsd_validate::{Invariant, ValidationReport};

use crate::commands::{ColumnInfo, InspectOutcome, RunOutcome};

pub fn print_inspection(outcome: &InspectOutcome) {
    let entities = outcome
        .entities
        .map_or_else(|| "-".to_string(), |count| count.to_string());
    println!("Rows: {}  Entities: {entities}", outcome.rows);
    println!("{}", schema_table(&outcome.columns));
    if outcome.report.is_valid() {
        println!("All invariants hold.");
    } else {
        println!();
        println!("Issues:");
        println!("{}", report_table(&outcome.report));
    }
}

pub fn print_run(outcome: &RunOutcome) {
    println!(
        "Rows: {}  Entities: {}  Elapsed: {} ms",
        outcome.rows, outcome.entities, outcome.elapsed_ms
    );
    println!("{}", schema_table(&outcome.columns));
    match &outcome.summary {
        Some(summary) => {
            println!();
            println!("{}", roll_table(summary));
            if !summary.per_entity.is_empty() {
                println!("{}", entity_table(summary));
            }
        }
        None => println!("No current rolling windows."),
    }
}

/// Print the roll summary as pretty JSON.
pub fn print_run_json(outcome: &RunOutcome) -> serde_json::Result<()> {
    let text = serde_json::to_string_pretty(&outcome.summary)?;
    println!("{text}");
    Ok(())
}

pub fn schema_table(columns: &[ColumnInfo]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Type"),
        header_cell("Role"),
        header_cell("Nulls"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    for column in columns {
        let role = if column.role.is_empty() {
            dim_cell("-")
        } else {
            Cell::new(&column.role).fg(Color::Blue)
        };
        table.add_row(vec![
            Cell::new(&column.name).add_attribute(Attribute::Bold),
            Cell::new(&column.dtype),
            role,
            count_cell(column.null_count, Color::Yellow),
        ]);
    }
    table
}

pub fn report_table(report: &ValidationReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Code"),
        header_cell("Invariant"),
        header_cell("Column"),
        header_cell("Entity"),
        header_cell("Count"),
        header_cell("Message"),
    ]);
    apply_issue_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    align_column(&mut table, 4, CellAlignment::Right);
    for issue in &report.issues {
        let invariant = issue.invariant();
        table.add_row(vec![
            Cell::new(invariant.code())
                .fg(invariant_color(invariant))
                .add_attribute(Attribute::Bold),
            Cell::new(invariant.label()),
            optional_cell(issue.column()),
            optional_cell(issue.entity()),
            issue
                .count()
                .map_or_else(|| dim_cell("-"), Cell::new),
            Cell::new(issue.message()),
        ]);
    }
    table
}

pub fn roll_table(summary: &RollSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Windows"), header_cell("Value")]);
    apply_table_style(&mut table);
    let mode = if summary.id_sensitive {
        "wide"
    } else {
        "per entity"
    };
    let offsets = summary
        .offsets
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let rows = [
        ("Mode", mode.to_string()),
        ("Lookback", summary.lookback.to_string()),
        ("Horizon offsets", offsets),
        ("x channels", summary.x_channels.join(", ")),
        ("y channels", summary.y_channels.join(", ")),
        ("x shape", format_shape(summary.x_shape)),
        ("y shape", format_shape(summary.y_shape)),
        ("Samples", summary.samples.to_string()),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label).add_attribute(Attribute::Bold), Cell::new(value)]);
    }
    if summary.id_sensitive {
        table.add_row(vec![
            Cell::new("Dropped windows").add_attribute(Attribute::Bold),
            count_cell(summary.dropped_windows, Color::Yellow),
        ]);
    }
    table
}

pub fn entity_table(summary: &RollSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Entity"),
        header_cell("Rows"),
        header_cell("Samples"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for entry in &summary.per_entity {
        let samples = if entry.samples == 0 {
            Cell::new(0).fg(Color::Yellow)
        } else {
            Cell::new(entry.samples)
        };
        table.add_row(vec![
            optional_cell(entry.entity.as_deref()),
            Cell::new(entry.rows),
            samples,
        ]);
    }
    table
}

fn format_shape(shape: [usize; 3]) -> String {
    format!("({}, {}, {})", shape[0], shape[1], shape[2])
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn invariant_color(invariant: Invariant) -> Color {
    match invariant {
        Invariant::UniqueTimestamps => Color::Yellow,
        _ => Color::Red,
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn optional_cell(value: Option<&str>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsd_roll::EntitySamples;
    use tsd_validate::Issue;

    fn plain(mut table: Table) -> String {
        table.force_no_tty();
        table.to_string()
    }

    #[test]
    fn test_schema_table_marks_unassigned_columns() {
        let columns = vec![
            ColumnInfo {
                name: "ts".to_string(),
                dtype: "datetime[ms]".to_string(),
                role: "datetime".to_string(),
                null_count: 0,
            },
            ColumnInfo {
                name: "note".to_string(),
                dtype: "str".to_string(),
                role: String::new(),
                null_count: 2,
            },
        ];
        let text = plain(schema_table(&columns));
        assert!(text.contains("datetime[ms]"));
        assert!(text.contains("note"));
        assert!(text.contains(" - "));
    }

    #[test]
    fn test_report_table_lists_codes() {
        let report = ValidationReport::new(vec![
            Issue::DatetimeMissing {
                column: "ts".to_string(),
            },
            Issue::EntityEmpty {
                entity: "B".to_string(),
            },
        ]);
        let text = plain(report_table(&report));
        assert!(text.contains("TS001"));
        assert!(text.contains("TS004"));
    }

    #[test]
    fn test_roll_table_and_entities() {
        let summary = RollSummary {
            id_sensitive: false,
            lookback: 3,
            offsets: vec![1, 2],
            x_channels: vec!["price".to_string()],
            y_channels: vec!["units".to_string()],
            per_entity: vec![
                EntitySamples {
                    entity: Some("A".to_string()),
                    rows: 6,
                    samples: 2,
                },
                EntitySamples {
                    entity: Some("B".to_string()),
                    rows: 3,
                    samples: 0,
                },
            ],
            dropped_windows: 0,
            samples: 2,
            x_shape: [2, 3, 1],
            y_shape: [2, 2, 1],
        };
        let text = plain(roll_table(&summary));
        assert!(text.contains("per entity"));
        assert!(text.contains("(2, 3, 1)"));
        assert!(text.contains("1, 2"));
        assert!(!text.contains("Dropped"));

        let entities = plain(entity_table(&summary));
        assert!(entities.contains('A'));
        assert!(entities.contains('B'));
    }
}
