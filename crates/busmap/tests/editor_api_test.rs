//! Integration tests for the BusEditor API
//!
//! These tests drive whole workflows through the public API, tables included.

use std::fs;

use busmap::{
    BusEditor, BusmapError,
    allocation::{AllocationError, AllocationRange},
    config::{AllocationConfig, AppConfig, DocumentConfig, TablesConfig},
    table::{self, BusNumberRow},
};

const ROUTINE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<RSLogix5000Content SchemaRevision="1.0">
<Routine Name="Conveyor" Type="RLL">
<RLLContent>
<Rung Number="0" Type="N">
<Comment>
<![CDATA[Start pump (Pump_1,Bus[3].Obj)]]>
</Comment>
<Text>
<![CDATA[XIC(Start)OTE(Pump_1,Bus[3].Obj,Bus[5].Obj);]]>
</Text>
</Rung>
<Rung Number="1" Type="N">
<Text>
<![CDATA[XIC(Run)OTE(Fan_2,Bus[3].Obj);]]>
</Text>
</Rung>
<Rung Number="2" Type="N">
<Text>
<![CDATA[OTE(Rack,HWBus[2].Obj);]]>
</Text>
</Rung>
</RLLContent>
</Routine>
</RSLogix5000Content>
"#;

fn rung_texts(editor: &BusEditor, source: &str) -> Vec<String> {
    let document = editor.parse(source).expect("Failed to parse");
    document.nodes().iter().map(|node| node.text().to_string()).collect()
}

#[test]
fn test_editor_api_exists() {
    let _editor = BusEditor::default();
}

#[test]
fn test_index_and_census() {
    let editor = BusEditor::default();
    let document = editor.parse(ROUTINE).expect("Failed to parse");
    let index = editor.index(&document);

    assert_eq!(index.numbers(), &[3, 5]);

    let census = editor.census(&index);
    let rows: Vec<_> = census.iter().map(|row| (row.tag(), row.count())).collect();
    assert_eq!(rows, vec![("Bus[3].Obj", 2), ("Bus[5].Obj", 1)]);
    assert_eq!(
        census[0].original_tags(),
        "('Pump_1,Bus[3].Obj,Bus[5].Obj', 'Fan_2,Bus[3].Obj')"
    );
}

#[test]
fn test_renumber_through_tables() {
    let dir = tempfile::tempdir().unwrap();
    let editor = BusEditor::default();
    let document = editor.parse(ROUTINE).expect("Failed to parse");

    let path = editor.bus_numbers_path(dir.path());
    table::write_bus_numbers(&path, &editor.bus_numbers(&editor.index(&document))).unwrap();

    // Fill in a replacement for bus 5 only, as a reviewer would.
    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, "Bus Number,Replacement Bus Number\n3,\n5,\n");
    fs::write(&path, content.replace("5,\n", "5,8\n")).unwrap();

    let rows = table::read_bus_numbers(&path).unwrap();
    assert_eq!(rows[1], BusNumberRow::new(5, Some(8)));

    let rewrite = editor.renumber(&document, &rows);
    assert_eq!(rewrite.replacements(), 1);
    assert_eq!(
        rung_texts(&editor, rewrite.text())[0],
        "XIC(Start)OTE(Pump_1,Bus[3].Obj,Bus[8].Obj);"
    );
    // Comments are not text nodes.
    assert!(rewrite.text().contains("Start pump (Pump_1,Bus[3].Obj)"));
}

#[test]
fn test_deduplicate_through_tables() {
    let dir = tempfile::tempdir().unwrap();
    let editor = BusEditor::default();
    let document = editor.parse(ROUTINE).expect("Failed to parse");

    let path = editor.census_path(dir.path());
    table::write_census(&path, &editor.census(&editor.index(&document))).unwrap();
    let census = table::read_census(&path).unwrap();

    let range = AllocationRange::new(1, 10).unwrap();
    let plan = editor.plan(&census, range).expect("Failed to plan");
    assert_eq!(plan.mapping().get("Bus[3].Obj"), Some("Bus[1].Obj"));
    assert!(!plan.mapping().contains_key("Bus[5].Obj"));

    let rewrite = editor.deduplicate(&document, &plan);
    assert_eq!(
        rung_texts(&editor, rewrite.text()),
        vec![
            "XIC(Start)OTE(Pump_1,Bus[3].Obj,Bus[5].Obj);",
            "XIC(Run)OTE(Fan_2,Bus[1].Obj);",
            "OTE(Rack,HWBus[2].Obj);",
        ]
    );
}

#[test]
fn test_deduplicate_with_exhausted_range() {
    let editor = BusEditor::default();
    let document = editor.parse(ROUTINE).expect("Failed to parse");
    let census = editor.census(&editor.index(&document));

    let range = AllocationRange::new(3, 3).unwrap();
    let result = editor.plan(&census, range);
    assert!(matches!(
        result,
        Err(BusmapError::Allocation(AllocationError::Exhausted(_)))
    ));
}

#[test]
fn test_replace_tags() {
    let editor = BusEditor::default();
    let document = editor.parse(ROUTINE).expect("Failed to parse");
    let census: Vec<_> = editor
        .census(&editor.index(&document))
        .into_iter()
        .map(|row| {
            if row.count() == 1 {
                row.with_replace_tags("Pump_9")
            } else {
                row
            }
        })
        .collect();

    let rewrite = editor.replace_tags(&document, &census).unwrap();
    assert_eq!(
        rung_texts(&editor, rewrite.text())[0],
        "XIC(Start)OTE(Pump_9,Bus[3].Obj,Bus[5].Obj);"
    );
}

#[test]
fn test_label_numbering() {
    let editor = BusEditor::default();
    let source = ROUTINE.replace("XIC(Start)", "XIC(Pump-1)");
    let document = editor.parse(source).expect("Failed to parse");
    let census = editor.census(&editor.index(&document));

    let counts = editor.label_counts(&document, &census).unwrap();
    let pairs: Vec<_> = counts.iter().map(|c| (c.label(), c.count())).collect();
    assert_eq!(pairs, vec![("Pump-1", 1), ("Fan-2", 0)]);

    let rewrite = editor.number_label(&document, &census, "Pump-1").unwrap();
    assert!(rewrite.text().contains("XIC(Pump-1type1)"));

    let err = editor.number_label(&document, &census, "Valve").unwrap_err();
    assert!(matches!(err, BusmapError::UnknownLabel(label) if label == "Valve"));
}

#[test]
fn test_custom_text_element() {
    let config = AppConfig::new(
        DocumentConfig::new("Comment"),
        TablesConfig::default(),
        AllocationConfig::default(),
    );
    let editor = BusEditor::new(config);
    let document = editor.parse(ROUTINE).expect("Failed to parse");

    assert_eq!(document.nodes().len(), 1);
    assert_eq!(editor.index(&document).numbers(), &[3]);
}

#[test]
fn test_allocation_range_from_config() {
    let config = AppConfig::new(
        DocumentConfig::default(),
        TablesConfig::default(),
        AllocationConfig::new(Some(100), Some(199)),
    );
    let editor = BusEditor::new(config);

    let range = editor.allocation_range(None, None).unwrap();
    assert_eq!((range.start(), range.end()), (100, 199));

    let editor = BusEditor::default();
    assert!(matches!(
        editor.allocation_range(Some(1), None),
        Err(BusmapError::Config(_))
    ));
}

#[test]
fn test_load_missing_document() {
    let dir = tempfile::tempdir().unwrap();
    let editor = BusEditor::default();

    let result = editor.load(&dir.path().join("absent.L5X"));
    assert!(matches!(result, Err(BusmapError::MissingResource(_))));
}

#[test]
fn test_parse_invalid_markup_returns_error() {
    let editor = BusEditor::default();

    let result = editor.parse("<Routine><Text>(Pump,Bus[1].Obj)</Routine>");
    assert!(matches!(result, Err(BusmapError::Parse { .. })));
}

#[test]
fn test_write_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.L5X");
    let editor = BusEditor::default();
    let document = editor.parse(ROUTINE).expect("Failed to parse");

    let rewrite = editor.renumber(&document, &[BusNumberRow::new(3, Some(4))]);
    editor.write_document(&path, &rewrite).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), rewrite.text());
}
