use std::{fs, path::PathBuf};

use tempfile::tempdir;

use busmap::BusmapError;
use busmap_cli::{Args, Command, RewriteArgs, TableArgs, run};

/// Fixtures are at workspace root, relative to workspace not the crate
fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("fixtures")
        .join(name)
}

fn args(command: Command) -> Args {
    Args {
        config: None,
        log_level: "off".to_string(),
        command,
    }
}

fn tables(input: &str, tables_dir: &str) -> TableArgs {
    TableArgs {
        input: input.to_string(),
        tables_dir: tables_dir.to_string(),
    }
}

fn rewrite(input: &str, tables_dir: &str, output: Option<String>) -> RewriteArgs {
    RewriteArgs {
        tables: tables(input, tables_dir),
        output,
    }
}

#[test]
fn e2e_numbers_lists_bus_numbers() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = fixture("conveyor.L5X");
    let tables_dir = temp_dir.path().to_string_lossy().to_string();

    run(&args(Command::Numbers(tables(
        &input.to_string_lossy(),
        &tables_dir,
    ))))
    .expect("numbers failed");

    let content = fs::read_to_string(temp_dir.path().join("bus_list_numbers.csv")).unwrap();
    assert_eq!(content, "Bus Number,Replacement Bus Number\n3,\n5,\n");
}

#[test]
fn e2e_renumber_from_edited_table() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = fixture("conveyor.L5X").to_string_lossy().to_string();
    let tables_dir = temp_dir.path().to_string_lossy().to_string();
    let output = temp_dir.path().join("renumbered.L5X");

    run(&args(Command::Numbers(tables(&input, &tables_dir)))).expect("numbers failed");

    let table_path = temp_dir.path().join("bus_list_numbers.csv");
    let content = fs::read_to_string(&table_path).unwrap();
    fs::write(&table_path, content.replace("5,\n", "5,7\n")).unwrap();

    run(&args(Command::Renumber(rewrite(
        &input,
        &tables_dir,
        Some(output.to_string_lossy().to_string()),
    ))))
    .expect("renumber failed");

    let result = fs::read_to_string(&output).unwrap();
    assert!(result.contains("OTE(Valve_4,Bus[7].Obj)"));
    assert!(result.contains("OTE(Pump_1,Bus[3].Obj)"));
}

#[test]
fn e2e_census_then_dedup_in_place() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = temp_dir.path().join("conveyor.L5X");
    fs::copy(fixture("conveyor.L5X"), &input).unwrap();
    let input = input.to_string_lossy().to_string();
    let tables_dir = temp_dir.path().to_string_lossy().to_string();

    run(&args(Command::Census(tables(&input, &tables_dir)))).expect("census failed");

    let census = fs::read_to_string(temp_dir.path().join("bus_count_with_tags.csv")).unwrap();
    assert!(census.starts_with("Bus Tags,Count,Original Tags,Replace Tags\n"));
    assert!(census.contains("Bus[3].Obj,2,\"('Pump_1,Bus[3].Obj', 'Fan_2,Bus[3].Obj')\","));

    run(&args(Command::Dedup {
        rewrite: rewrite(&input, &tables_dir, None),
        start: Some(10),
        end: Some(20),
    }))
    .expect("dedup failed");

    let result = fs::read_to_string(&input).unwrap();
    assert!(result.contains("XIC(Start)OTE(Pump_1,Bus[3].Obj);"));
    assert!(result.contains("XIC(Run)OTE(Fan_2,Bus[10].Obj)OTE(Valve_4,Bus[5].Obj);"));
    // Comments and hardware rungs stay as they were.
    assert!(result.contains("Main pump (Pump_1,Bus[3].Obj)"));
    assert!(result.contains("OTE(Rack_1,HWBus[2].Obj)"));
}

#[test]
fn e2e_dedup_without_range_fails() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = fixture("conveyor.L5X").to_string_lossy().to_string();
    let tables_dir = temp_dir.path().to_string_lossy().to_string();

    let result = run(&args(Command::Dedup {
        rewrite: rewrite(&input, &tables_dir, None),
        start: None,
        end: None,
    }));

    assert!(matches!(result, Err(BusmapError::Config(_))));
}

#[test]
fn e2e_label_listing_and_unknown_label() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = fixture("conveyor.L5X").to_string_lossy().to_string();
    let tables_dir = temp_dir.path().to_string_lossy().to_string();
    let output = temp_dir.path().join("labelled.L5X");

    run(&args(Command::Census(tables(&input, &tables_dir)))).expect("census failed");

    run(&args(Command::Label {
        rewrite: rewrite(&input, &tables_dir, None),
        label: None,
    }))
    .expect("label listing failed");
    assert!(!output.exists());

    let result = run(&args(Command::Label {
        rewrite: rewrite(
            &input,
            &tables_dir,
            Some(output.to_string_lossy().to_string()),
        ),
        label: Some("Conveyor-9".to_string()),
    }));
    assert!(matches!(result, Err(BusmapError::UnknownLabel(_))));
    assert!(!output.exists());
}

#[test]
fn e2e_missing_census_is_reported() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = fixture("conveyor.L5X").to_string_lossy().to_string();
    let tables_dir = temp_dir.path().to_string_lossy().to_string();

    let result = run(&args(Command::ReplaceTags(rewrite(
        &input,
        &tables_dir,
        None,
    ))));

    assert!(matches!(result, Err(BusmapError::MissingResource(_))));
}

#[test]
fn e2e_invalid_document_fails() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = fixture("errors/unclosed_rung.L5X");
    let tables_dir = temp_dir.path().to_string_lossy().to_string();

    let result = run(&args(Command::Numbers(tables(
        &input.to_string_lossy(),
        &tables_dir,
    ))));

    assert!(matches!(result, Err(BusmapError::Parse { .. })));
    assert!(!temp_dir.path().join("bus_list_numbers.csv").exists());
}
