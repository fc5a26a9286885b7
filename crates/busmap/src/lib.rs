//! Busmap - renumber and deduplicate bus object tags in PLC program exports.
//!
//! Logix exports annotate instructions with tag tuples such as
//! `(Pump_1,Bus[3].Obj)`. Busmap indexes those tuples, writes what it finds
//! to CSV tables for review, and rewrites the document from the reviewed
//! tables: renumbering buses, giving duplicated bus tags fresh numbers from a
//! range, replacing tags, and numbering label instances.
//!
//! Only the text content of the tagged elements is ever rewritten; every
//! other byte of the document is kept as it was.

pub mod config;
pub mod index;
pub mod label;
pub mod plan;
pub mod substitute;
pub mod table;

mod error;
mod output;

pub use busmap_core::{allocation, mapping, reference, tag};
pub use busmap_parser::{Document, TextNode};

pub use error::BusmapError;

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info, trace};

use busmap_core::{
    allocation::AllocationRange,
    mapping::ReplacementMapping,
    tag::{TagRecord, first_member},
};

use config::AppConfig;
use index::TagIndex;
use label::LabelCount;
use plan::DeduplicationPlan;
use substitute::Rewrite;
use table::{BusNumberRow, CensusRow};

/// Editor for bus tags in one document at a time.
///
/// # Examples
///
/// ```
/// use busmap::{BusEditor, config::AppConfig};
///
/// let source = "<Rung><Text>(Pump,Bus[3].Obj)</Text></Rung>";
///
/// let editor = BusEditor::new(AppConfig::default());
/// let document = editor.parse(source).expect("Failed to parse");
/// let index = editor.index(&document);
///
/// assert_eq!(index.numbers(), &[3]);
/// ```
#[derive(Default)]
pub struct BusEditor {
    config: AppConfig,
}

impl BusEditor {
    /// Create a new editor with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Read and load the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BusmapError::MissingResource`] if `path` does not exist and
    /// [`BusmapError::Parse`] if the markup cannot be read.
    pub fn load(&self, path: &Path) -> Result<Document, BusmapError> {
        info!(path:? = path; "Loading document");
        let source = fs::read_to_string(path).map_err(|err| BusmapError::from_io(err, path))?;
        self.parse(source)
    }

    /// Load a document from its source text.
    ///
    /// # Errors
    ///
    /// Returns [`BusmapError::Parse`] if the markup cannot be read.
    pub fn parse(&self, source: impl Into<String>) -> Result<Document, BusmapError> {
        let source = source.into();
        let text_element = self.config.document().text_element();

        let document = Document::parse(source.as_str(), text_element)
            .map_err(|err| BusmapError::new_parse_error(err, source))?;
        debug!(nodes_count = document.nodes().len(); "Document loaded");
        Ok(document)
    }

    /// Scan `document` for bus tags.
    pub fn index(&self, document: &Document) -> TagIndex {
        index::build_tag_index(document)
    }

    /// Rows of the bus number list, with the replacements left empty.
    pub fn bus_numbers(&self, index: &TagIndex) -> Vec<BusNumberRow> {
        index
            .numbers()
            .iter()
            .map(|number| BusNumberRow::new(*number, None))
            .collect()
    }

    /// Rows of the bus tag census, in first-seen order.
    pub fn census(&self, index: &TagIndex) -> Vec<CensusRow> {
        index.records().map(CensusRow::from_record).collect()
    }

    /// Renumber buses with the replacements filled into `rows`.
    pub fn renumber(&self, document: &Document, rows: &[BusNumberRow]) -> Rewrite {
        let mapping = table::number_mapping(rows);
        debug!(rows_count = rows.len(), keys_count = mapping.len(); "Renumbering mapping built");
        substitute::renumber(document, &mapping)
    }

    /// Plan new numbers for the duplicated tags listed in `census`.
    ///
    /// # Errors
    ///
    /// Returns [`BusmapError::Parse`] if an `Original Tags` cell is not a
    /// tag list, and [`BusmapError::Allocation`] if `range` runs out of
    /// numbers.
    pub fn plan(
        &self,
        census: &[CensusRow],
        range: AllocationRange,
    ) -> Result<DeduplicationPlan, BusmapError> {
        let records = census
            .iter()
            .map(CensusRow::to_record)
            .collect::<Result<Vec<TagRecord>, _>>()?;

        Ok(plan::plan_deduplication(&records, range)?)
    }

    /// Apply a deduplication plan.
    pub fn deduplicate(&self, document: &Document, plan: &DeduplicationPlan) -> Rewrite {
        substitute::deduplicate(document, plan.mapping(), plan.scope())
    }

    /// Replace the tags of single-use census rows that have `Replace Tags`
    /// filled in.
    ///
    /// For each such row, the first member of its tuple is replaced by the
    /// `Replace Tags` value.
    ///
    /// # Errors
    ///
    /// Returns [`BusmapError::Parse`] if an `Original Tags` cell is not a
    /// tag list.
    pub fn replace_tags(
        &self,
        document: &Document,
        census: &[CensusRow],
    ) -> Result<Rewrite, BusmapError> {
        let mut mapping = ReplacementMapping::new();
        for row in census.iter().filter(|row| row.count() == 1) {
            let Some(replacement) = row.replace_tags() else {
                continue;
            };
            let tuple_texts = row.tuple_texts()?;
            if let Some(tuple_text) = tuple_texts.first() {
                trace!(tag = first_member(tuple_text), replacement; "Tag replacement");
                mapping.insert(first_member(tuple_text), replacement);
            }
        }

        Ok(substitute::replace_tags(document, &mapping))
    }

    /// Candidate labels of the tuples listed in `census`, with how often each
    /// occurs in `document`.
    ///
    /// # Errors
    ///
    /// Returns [`BusmapError::Parse`] if an `Original Tags` cell is not a
    /// tag list.
    pub fn label_counts(
        &self,
        document: &Document,
        census: &[CensusRow],
    ) -> Result<Vec<LabelCount>, BusmapError> {
        let mut tuple_texts = Vec::new();
        for row in census {
            tuple_texts.extend(row.tuple_texts()?);
        }

        Ok(label::count_labels(
            document.source(),
            tuple_texts.iter().map(String::as_str),
        ))
    }

    /// Number the instances of `label`, which must be one of the candidate
    /// labels of `census`.
    ///
    /// # Errors
    ///
    /// Returns [`BusmapError::UnknownLabel`] if `label` is not a candidate,
    /// and [`BusmapError::Parse`] if an `Original Tags` cell is not a tag
    /// list.
    pub fn number_label(
        &self,
        document: &Document,
        census: &[CensusRow],
        label: &str,
    ) -> Result<Rewrite, BusmapError> {
        let counts = self.label_counts(document, census)?;
        if !counts.iter().any(|count| count.label() == label) {
            return Err(BusmapError::UnknownLabel(label.to_string()));
        }

        Ok(label::number_label(document.source(), label))
    }

    /// Resolve the allocation range from explicit bounds and the
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BusmapError::Config`] if a bound is given neither way, and
    /// [`BusmapError::Allocation`] if start is greater than end.
    pub fn allocation_range(
        &self,
        start: Option<u32>,
        end: Option<u32>,
    ) -> Result<AllocationRange, BusmapError> {
        self.config.allocation().resolve(start, end)?.ok_or_else(|| {
            BusmapError::Config(
                "allocation range needs both a start and an end number".to_string(),
            )
        })
    }

    /// Path of the bus number list inside `tables_dir`.
    pub fn bus_numbers_path(&self, tables_dir: &Path) -> PathBuf {
        self.config.tables().bus_numbers_path(tables_dir)
    }

    /// Path of the bus tag census inside `tables_dir`.
    pub fn census_path(&self, tables_dir: &Path) -> PathBuf {
        self.config.tables().census_path(tables_dir)
    }

    /// Write a rewritten document to `path`, replacing it atomically.
    ///
    /// # Errors
    ///
    /// Returns [`BusmapError::Io`] if the file cannot be written.
    pub fn write_document(&self, path: &Path, rewrite: &Rewrite) -> Result<(), BusmapError> {
        info!(
            path:? = path,
            nodes_changed = rewrite.nodes_changed(),
            replacements = rewrite.replacements();
            "Writing document"
        );
        output::write_atomic(path, rewrite.text())
    }
}
