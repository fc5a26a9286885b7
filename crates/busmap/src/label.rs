//! Label instance numbering.
//!
//! The first member of a tag tuple is the label of the instruction the tuple
//! belongs to, e.g. `Pump_1` in `(Pump_1,Bus[3].Obj)`. Labels are written
//! with `-` in place of `_` elsewhere in the document. Numbering a label
//! suffixes each of its occurrences with `type<k>` so that instances can be
//! told apart.

use indexmap::IndexMap;
use log::{debug, info};

use busmap_core::tag::first_member;
use busmap_parser::Span;

use crate::substitute::{Edit, EditList, Rewrite};

/// A candidate label and how often it occurs in the raw document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCount {
    label: String,
    count: usize,
}

impl LabelCount {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

/// Collect the candidate labels of `tuple_texts` with their occurrence
/// counts in `source`, in first-seen order.
///
/// Each candidate is the first member of a tuple with `_` replaced by `-`.
/// Occurrences are counted as non-overlapping literal matches anywhere in
/// `source`, markup included.
pub fn count_labels<'a>(
    source: &str,
    tuple_texts: impl IntoIterator<Item = &'a str>,
) -> Vec<LabelCount> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for tuple_text in tuple_texts {
        let label = first_member(tuple_text).replace('_', "-");
        if label.is_empty() || counts.contains_key(&label) {
            continue;
        }
        let count = source.matches(label.as_str()).count();
        counts.insert(label, count);
    }

    debug!(labels_count = counts.len(); "Candidate labels counted");
    counts
        .into_iter()
        .map(|(label, count)| LabelCount { label, count })
        .collect()
}

/// Suffix the k-th occurrence of `label` in `source` with `type<k>`,
/// counting from 1 in document order.
///
/// All occurrences are found in the original text before any is rewritten,
/// so a label that is a prefix of its own replacement is numbered once.
pub fn number_label(source: &str, label: &str) -> Rewrite {
    info!(label; "Numbering label instances");

    let mut edits = EditList::default();
    if !label.is_empty() {
        for (k, (start, found)) in source.match_indices(label).enumerate() {
            edits.claim(Edit::new(
                Span::new(start..start + found.len()),
                format!("{label}type{}", k + 1),
            ));
        }
    }

    let replacements = edits.len();
    debug!(label, replacements; "Label instances numbered");
    Rewrite::new(
        edits.apply(source),
        usize::from(replacements > 0),
        replacements,
    )
}
