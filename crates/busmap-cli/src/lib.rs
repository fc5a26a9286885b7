//! CLI logic for the busmap tag tool.
//!
//! Each subcommand loads the input document, reads or writes the table
//! snapshots in the tables directory, and writes the rewritten document when
//! it has one.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Command, RewriteArgs, TableArgs};

use std::path::Path;

use log::{info, warn};

use busmap::{BusEditor, BusmapError, Document, index::TagIndex, substitute::Rewrite, table};

use error_adapter::warning_reportables;

/// Run the busmap CLI application
///
/// # Errors
///
/// Returns `BusmapError` for:
/// - File I/O errors and missing documents or tables
/// - Configuration loading errors
/// - Markup and tag list errors
/// - Table schema errors
/// - Allocation range exhaustion
/// - Unknown labels
pub fn run(args: &Args) -> Result<(), BusmapError> {
    let app_config = config::load_config(args.config.as_ref())?;
    let editor = BusEditor::new(app_config);

    match &args.command {
        Command::Numbers(tables) => {
            let (document, index) = load_and_index(&editor, tables)?;
            let path = editor.bus_numbers_path(Path::new(&tables.tables_dir));
            let rows = editor.bus_numbers(&index);
            table::write_bus_numbers(&path, &rows)?;

            info!(
                nodes_count = document.nodes().len(),
                numbers_count = rows.len(),
                path:? = path;
                "Bus number list written"
            );
        }
        Command::Renumber(rewrite) => {
            let document = editor.load(Path::new(&rewrite.tables.input))?;
            let path = editor.bus_numbers_path(Path::new(&rewrite.tables.tables_dir));
            let rows = table::read_bus_numbers(&path)?;

            let result = editor.renumber(&document, &rows);
            write_output(&editor, rewrite, &result)?;
        }
        Command::Census(tables) => {
            let (_, index) = load_and_index(&editor, tables)?;
            let path = editor.census_path(Path::new(&tables.tables_dir));
            let rows = editor.census(&index);
            table::write_census(&path, &rows)?;

            let duplicates = rows.iter().filter(|row| row.count() > 1).count();
            info!(
                tags_count = rows.len(),
                duplicates_count = duplicates,
                path:? = path;
                "Bus tag census written"
            );
        }
        Command::Dedup {
            rewrite,
            start,
            end,
        } => {
            let range = editor.allocation_range(*start, *end)?;
            let document = editor.load(Path::new(&rewrite.tables.input))?;
            let census = read_census(&editor, &rewrite.tables)?;

            let plan = editor.plan(&census, range)?;
            if plan.is_empty() {
                info!("No duplicated bus tags");
            }
            for allocation in plan.allocations() {
                info!(
                    tag = allocation.tag(),
                    number = allocation.number(),
                    tuple = allocation.tuple_text();
                    "Bus number assigned"
                );
            }

            let result = editor.deduplicate(&document, &plan);
            write_output(&editor, rewrite, &result)?;
        }
        Command::ReplaceTags(rewrite) => {
            let document = editor.load(Path::new(&rewrite.tables.input))?;
            let census = read_census(&editor, &rewrite.tables)?;

            let result = editor.replace_tags(&document, &census)?;
            write_output(&editor, rewrite, &result)?;
        }
        Command::Label { rewrite, label } => {
            let document = editor.load(Path::new(&rewrite.tables.input))?;
            let census = read_census(&editor, &rewrite.tables)?;

            match label {
                Some(label) => {
                    let result = editor.number_label(&document, &census, label)?;
                    write_output(&editor, rewrite, &result)?;
                }
                None => {
                    for count in editor.label_counts(&document, &census)? {
                        info!(label = count.label(), count = count.count(); "Candidate label");
                    }
                }
            }
        }
    }

    Ok(())
}

fn load_and_index(
    editor: &BusEditor,
    tables: &TableArgs,
) -> Result<(Document, TagIndex), BusmapError> {
    let document = editor.load(Path::new(&tables.input))?;
    let index = editor.index(&document);
    report_warnings(&document, &index);
    Ok((document, index))
}

fn read_census(editor: &BusEditor, tables: &TableArgs) -> Result<Vec<table::CensusRow>, BusmapError> {
    table::read_census(&editor.census_path(Path::new(&tables.tables_dir)))
}

/// Render the warnings of a tag scan against the document source.
fn report_warnings(document: &Document, index: &TagIndex) {
    let reporter = miette::GraphicalReportHandler::new();

    for reportable in warning_reportables(index.diagnostics(), document.source()) {
        let mut writer = String::new();
        match reporter.render_report(&mut writer, &reportable) {
            Ok(()) => warn!("{writer}"),
            Err(_) => warn!("{reportable}"),
        }
    }
}

fn write_output(
    editor: &BusEditor,
    rewrite: &RewriteArgs,
    result: &Rewrite,
) -> Result<(), BusmapError> {
    if result.is_unchanged() {
        info!("No tags matched; writing the document unchanged");
    }

    let path = Path::new(rewrite.output_path());
    editor.write_document(path, result)?;

    info!(output_file = rewrite.output_path(); "Document written");
    Ok(())
}
