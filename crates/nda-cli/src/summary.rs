use std::collections::BTreeMap;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use nda_model::ParticipantRecord;
use nda_prepare::{DocumentReport, TemplateScope};

use nda_cli::types::{LookupResult, PrepareResult, TemplatesResult};

pub fn print_templates_summary(result: &TemplatesResult) {
    println!("Dataset: {}", result.bids_dir.display());
    println!("Output: {}", result.destination.display());
    if result.generalized_sessions {
        println!("Sessions: generalized");
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Datatype"),
        header_cell("Templates"),
        header_cell("Mapping"),
        header_cell("Descriptor"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for emitted in &result.emitted {
        table.add_row(vec![
            datatype_cell(&emitted.datatype),
            Cell::new(emitted.template_count),
            Cell::new(file_name(&emitted.mapping)),
            Cell::new(file_name(&emitted.descriptor)),
        ]);
    }
    println!("{table}");
}

pub fn print_lookup_summary(result: &LookupResult) {
    println!("Dataset: {}", result.bids_dir.display());
    println!("Lookup table: {}", result.output.display());
    if let Some(unit) = result.age_unit {
        println!("Age units: {unit}");
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Datatype"),
        header_cell("Records"),
        header_cell("Subjects/Sessions"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for (datatype, (records, labels)) in counts_by_datatype(&result.records) {
        table.add_row(vec![datatype_cell(datatype), Cell::new(records), Cell::new(labels)]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(result.records.len()).add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    println!("{table}");
    println!("Fill the subjectkey column with NDA GUIDs before running prepare.");
}

pub fn print_prepare_summary(result: &PrepareResult) {
    println!("Source: {}", result.source.display());
    println!("Destination: {}", result.destination.display());
    let Some(report) = &result.report else {
        println!("File-mapping skipped.");
        return;
    };
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Document"),
        header_cell("Scope"),
        header_cell("Matched"),
        header_cell("Placed"),
        header_cell("Files"),
        header_cell("Skipped"),
        header_cell("Removed"),
    ]);
    apply_table_style(&mut table);
    for index in 2..7 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for document in &report.documents {
        table.add_row(document_row(document));
    }
    println!("{table}");
    let failed: Vec<&DocumentReport> = report.failed().collect();
    if failed.is_empty() {
        println!("Complete! Please review data prepared at: {}", result.destination.display());
    } else {
        eprintln!("Errors:");
        for document in failed {
            if let Some(error) = &document.error {
                eprintln!("- {}: {error}", document.document);
            }
        }
    }
}

fn document_row(document: &DocumentReport) -> Vec<Cell> {
    let scope = match document.scope {
        Some(TemplateScope::SessionRequired) => Cell::new("session"),
        Some(TemplateScope::SubjectOnly) => Cell::new("subject"),
        None => dim_cell("-"),
    };
    let name = if document.is_ok() {
        Cell::new(&document.document)
    } else {
        Cell::new(&document.document).fg(Color::Red)
    };
    vec![
        name,
        scope,
        Cell::new(document.matched),
        Cell::new(document.placed),
        Cell::new(document.files),
        count_cell(document.skipped, Color::Yellow),
        count_cell(document.removed_empty, Color::DarkGrey),
    ]
}

/// Records and distinct subject/session labels per datatype.
fn counts_by_datatype(records: &[ParticipantRecord]) -> BTreeMap<&str, (usize, usize)> {
    let mut labels: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for record in records {
        labels
            .entry(record.datatype.as_str())
            .or_default()
            .push(record.bids_subject_session.as_str());
    }
    labels
        .into_iter()
        .map(|(datatype, mut values)| {
            let records = values.len();
            values.sort_unstable();
            values.dedup();
            (datatype, (records, values.len()))
        })
        .collect()
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn datatype_cell(datatype: &str) -> Cell {
    Cell::new(datatype)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
