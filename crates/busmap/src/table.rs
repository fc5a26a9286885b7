//! Table snapshots.
//!
//! Two CSV tables carry results between runs and let a person edit them in
//! between:
//!
//! | Table | Columns |
//! |---|---|
//! | bus number list | `Bus Number`, `Replacement Bus Number` |
//! | bus tag census | `Bus Tags`, `Count`, `Original Tags`, `Replace Tags` |
//!
//! Both are written with a header row and read back by column name.

use std::{
    fs::File,
    io::Read,
    path::Path,
};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::{debug, info};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use busmap_core::{mapping::NumberMapping, tag::TagRecord};
use busmap_parser::tag_list::{parse_tag_list, render_tag_list};

use crate::{error::BusmapError, output::write_atomic};

/// Column names of the bus number list.
pub const BUS_NUMBER_COLUMNS: [&str; 2] = ["Bus Number", "Replacement Bus Number"];

/// Column names of the bus tag census.
pub const CENSUS_COLUMNS: [&str; 4] = ["Bus Tags", "Count", "Original Tags", "Replace Tags"];

/// One row of the bus number list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusNumberRow {
    #[serde(rename = "Bus Number")]
    bus_number: u32,

    #[serde(rename = "Replacement Bus Number")]
    replacement: Option<u32>,
}

impl BusNumberRow {
    pub fn new(bus_number: u32, replacement: Option<u32>) -> Self {
        Self {
            bus_number,
            replacement,
        }
    }

    pub fn bus_number(&self) -> u32 {
        self.bus_number
    }

    /// The number to renumber to, if one was filled in.
    pub fn replacement(&self) -> Option<u32> {
        self.replacement
    }
}

/// Build the renumbering mapping from the rows with a replacement filled in.
pub fn number_mapping(rows: &[BusNumberRow]) -> NumberMapping {
    rows.iter()
        .filter_map(|row| row.replacement.map(|to| (row.bus_number, to)))
        .collect()
}

/// One row of the bus tag census.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusRow {
    #[serde(rename = "Bus Tags")]
    tag: String,

    #[serde(rename = "Count")]
    count: usize,

    #[serde(rename = "Original Tags")]
    original_tags: String,

    #[serde(rename = "Replace Tags", default)]
    replace_tags: Option<String>,
}

impl CensusRow {
    /// Create a row from a tag record, with the replacement left empty.
    pub fn from_record(record: &TagRecord) -> Self {
        Self {
            tag: record.tag().to_string(),
            count: record.count(),
            original_tags: render_tag_list(record.tuple_texts()),
            replace_tags: None,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// The raw `Original Tags` cell.
    pub fn original_tags(&self) -> &str {
        &self.original_tags
    }

    /// The `Replace Tags` cell, if filled in.
    pub fn replace_tags(&self) -> Option<&str> {
        self.replace_tags.as_deref().filter(|value| !value.is_empty())
    }

    /// Set the `Replace Tags` cell.
    pub fn with_replace_tags(mut self, replace_tags: impl Into<String>) -> Self {
        self.replace_tags = Some(replace_tags.into());
        self
    }

    /// Parse the `Original Tags` cell into the tuple texts it lists.
    ///
    /// # Errors
    ///
    /// Returns [`BusmapError::Parse`] with the cell as source if it is not a
    /// valid tag list.
    pub fn tuple_texts(&self) -> Result<Vec<String>, BusmapError> {
        parse_tag_list(&self.original_tags)
            .map_err(|err| BusmapError::new_parse_error(err, self.original_tags.as_str()))
    }

    /// Rebuild the tag record this row was written from.
    pub fn to_record(&self) -> Result<TagRecord, BusmapError> {
        Ok(TagRecord::from_parts(
            self.tag.as_str(),
            self.count,
            self.tuple_texts()?,
        ))
    }
}

/// Read the bus number list at `path`.
///
/// # Errors
///
/// - [`BusmapError::MissingResource`] if `path` does not exist
/// - [`BusmapError::SchemaMismatch`] if a column is missing or a row does not
///   fit the columns
pub fn read_bus_numbers(path: &Path) -> Result<Vec<BusNumberRow>, BusmapError> {
    read_rows(path, &BUS_NUMBER_COLUMNS)
}

/// Write the bus number list to `path`.
pub fn write_bus_numbers(path: &Path, rows: &[BusNumberRow]) -> Result<(), BusmapError> {
    write_rows(path, &BUS_NUMBER_COLUMNS, rows)
}

/// Read the bus tag census at `path`.
///
/// The `Replace Tags` column may be left out; every other column is
/// required.
///
/// # Errors
///
/// - [`BusmapError::MissingResource`] if `path` does not exist
/// - [`BusmapError::SchemaMismatch`] if a column is missing or a row does not
///   fit the columns
pub fn read_census(path: &Path) -> Result<Vec<CensusRow>, BusmapError> {
    read_rows(path, &CENSUS_COLUMNS[..3])
}

/// Write the bus tag census to `path`.
pub fn write_census(path: &Path, rows: &[CensusRow]) -> Result<(), BusmapError> {
    write_rows(path, &CENSUS_COLUMNS, rows)
}

fn read_rows<T: DeserializeOwned>(path: &Path, required: &[&str]) -> Result<Vec<T>, BusmapError> {
    info!(path:? = path; "Reading table");
    let mut file = File::open(path).map_err(|err| BusmapError::from_io(err, path))?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;

    let rows = parse_rows(&content, required)
        .map_err(|message| BusmapError::schema_mismatch(path, message))?;
    debug!(path:? = path, rows_count = rows.len(); "Table read");
    Ok(rows)
}

/// Parse CSV `content`, checking the header against `required` first.
fn parse_rows<T: DeserializeOwned>(content: &str, required: &[&str]) -> Result<Vec<T>, String> {
    let mut reader = ReaderBuilder::new().from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|err| format!("cannot read header row: {err}"))?
        .clone();
    check_headers(&headers, required)?;

    reader
        .deserialize()
        .enumerate()
        .map(|(i, row)| {
            row.map_err(|err| {
                let line = err.position().map_or(i as u64 + 2, |pos| pos.line());
                format!("row on line {line} does not fit the columns: {err}")
            })
        })
        .collect()
}

fn check_headers(headers: &StringRecord, required: &[&str]) -> Result<(), String> {
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|header| header.trim() == *column))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!("missing column(s): {}", missing.join(", ")))
    }
}

fn write_rows<T: Serialize>(path: &Path, columns: &[&str], rows: &[T]) -> Result<(), BusmapError> {
    info!(path:? = path, rows_count = rows.len(); "Writing table");

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(columns)?;
    for row in rows {
        writer.serialize(row)?;
    }
    let content = writer
        .into_inner()
        .map_err(|err| BusmapError::Io(err.into_error()))?;

    write_atomic(path, &content)
}
