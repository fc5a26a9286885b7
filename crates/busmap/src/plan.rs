//! Deduplication planning.
//!
//! A tag that is a member of more than one tuple is assumed to stand for
//! more than one bus object. Its first occurrence keeps the tag; every later
//! occurrence is handed a bus number nobody uses yet.
//!
//! All occurrences after the first end up under the *last* number allocated
//! for the record: the mapping is keyed by the tag text, so each allocation
//! overwrites the previous one. For a tag used by three tuples, the number
//! allocated for the second tuple is marked used but never written.

use log::{debug, info, trace};

use busmap_core::{
    allocation::{AllocationError, AllocationRange, AllocationTable},
    mapping::ReplacementMapping,
    reference::BusReference,
    tag::TagRecord,
};
use busmap_parser::pattern::object_reference;

/// One number handed out to one tuple occurrence of a duplicated tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    tag: String,
    tuple_text: String,
    number: u32,
}

impl Allocation {
    /// The duplicated tag.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Text of the tuple the occurrence belongs to.
    pub fn tuple_text(&self) -> &str {
        &self.tuple_text
    }

    /// The newly allocated bus number.
    pub fn number(&self) -> u32 {
        self.number
    }
}

/// The outcome of planning: what to replace, and where.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeduplicationPlan {
    mapping: ReplacementMapping,
    scope: Vec<String>,
    allocations: Vec<Allocation>,
}

impl DeduplicationPlan {
    /// Mapping from duplicated tag to its replacement tag.
    pub fn mapping(&self) -> &ReplacementMapping {
        &self.mapping
    }

    /// Tuple texts of the occurrences that receive a new tag.
    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    /// Every number handed out, in allocation order.
    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    /// Returns `true` if no tag needs a new number.
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }
}

/// The bus number a tag is filed under: that of its first non-hardware bus
/// object reference.
fn tag_number(tag: &str) -> Option<u32> {
    object_reference(tag).and_then(|found| found.number())
}

/// Plan new bus numbers for every duplicated tag in `records`.
///
/// Every number already used by any tag is reserved first, whether or not
/// the tag is duplicated. Numbers are then handed out smallest first from
/// `range`. The replacement is always a plain `Bus[N].Obj`; any text around
/// the reference in the original member is dropped.
///
/// # Errors
///
/// Returns [`AllocationError::Exhausted`] as soon as `range` runs out of
/// free numbers. No partial plan is returned.
///
/// # Example
///
/// ```
/// # use busmap::plan::plan_deduplication;
/// # use busmap_core::{allocation::AllocationRange, tag::TagRecord};
/// let records = vec![TagRecord::from_parts(
///     "Bus[3].Obj",
///     2,
///     vec!["Pump,Bus[3].Obj".to_string(), "Fan,Bus[3].Obj".to_string()],
/// )];
/// let range = AllocationRange::new(1, 10).unwrap();
///
/// let plan = plan_deduplication(&records, range).unwrap();
/// assert_eq!(plan.mapping().get("Bus[3].Obj"), Some("Bus[1].Obj"));
/// assert_eq!(plan.scope(), &["Fan,Bus[3].Obj"]);
/// ```
pub fn plan_deduplication<'a>(
    records: impl IntoIterator<Item = &'a TagRecord>,
    range: AllocationRange,
) -> Result<DeduplicationPlan, AllocationError> {
    let records: Vec<&TagRecord> = records.into_iter().collect();
    info!(records_count = records.len(), range:? = range; "Planning deduplication");

    let mut table = AllocationTable::seeded(
        range,
        records
            .iter()
            .filter(|record| record.count() >= 1)
            .filter_map(|record| tag_number(record.tag())),
    );
    debug!(free_count = table.free_count(); "Allocation table seeded");

    let mut plan = DeduplicationPlan::default();
    for record in records.iter().filter(|record| record.is_duplicate()) {
        for tuple_text in record.tuple_texts().iter().skip(1) {
            let number = table.allocate()?;
            let replacement = BusReference::new(number).to_string();
            trace!(tag = record.tag(), replacement = replacement.as_str(); "Duplicate occurrence");

            plan.mapping.insert(record.tag(), replacement);
            if !plan.scope.contains(tuple_text) {
                plan.scope.push(tuple_text.clone());
            }
            plan.allocations.push(Allocation {
                tag: record.tag().to_string(),
                tuple_text: tuple_text.clone(),
                number,
            });
        }
    }

    info!(
        replacements_count = plan.mapping.len(),
        allocations_count = plan.allocations.len();
        "Deduplication planned"
    );
    Ok(plan)
}
