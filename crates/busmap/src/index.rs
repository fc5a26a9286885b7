//! Tag index: which bus numbers are in use and where each bus tag occurs.

use indexmap::IndexMap;
use log::{debug, info, trace, warn};

use busmap_core::{
    reference::{HARDWARE_MARKER, MalformedTag, is_hardware_token},
    tag::TagRecord,
};
use busmap_parser::{
    Document, Span, TextNode,
    error::{Diagnostic, ErrorCode},
    pattern::{
        extract_number, is_bus_number_reference, object_reference, parenthesized_groups,
        split_group_members,
    },
};

/// Everything a single scan of a document learns about its bus tags.
#[derive(Debug, Clone, Default)]
pub struct TagIndex {
    numbers: Vec<u32>,
    records: IndexMap<String, TagRecord>,
    diagnostics: Vec<Diagnostic>,
}

impl TagIndex {
    /// Distinct bus numbers used by bus object tags, ascending.
    pub fn numbers(&self) -> &[u32] {
        &self.numbers
    }

    /// One record per distinct bus object tag, in first-seen order.
    pub fn records(&self) -> impl Iterator<Item = &TagRecord> {
        self.records.values()
    }

    /// Returns the record of `tag`, if it was seen.
    pub fn record(&self, tag: &str) -> Option<&TagRecord> {
        self.records.get(tag)
    }

    /// Warnings about tags that were skipped.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

/// Scan every text node of `document` for bus object tags.
///
/// Nodes without a `Bus[N]` reference, and nodes mentioning `HWBus[`
/// anywhere, are skipped whole. Inside the remaining nodes every
/// parenthesised group is split into members; each member holding a
/// `Bus[N].Obj` reference is counted once under its exact text and filed
/// under the number of that reference, so `Rack[1].Bus[7].Obj` uses bus 7.
/// A member whose number cannot be read is reported as a warning and
/// skipped.
pub fn build_tag_index(document: &Document) -> TagIndex {
    info!(nodes_count = document.nodes().len(); "Indexing bus tags");

    let mut index = TagIndex::default();
    for node in document.nodes() {
        index_node(&mut index, node);
    }

    index.numbers.sort_unstable();
    index.numbers.dedup();

    debug!(
        numbers_count = index.numbers.len(),
        tags_count = index.records.len(),
        warnings_count = index.diagnostics.len();
        "Bus tags indexed"
    );
    index
}

fn index_node(index: &mut TagIndex, node: &TextNode) {
    let text = node.text();
    if !is_bus_number_reference(text) || text.contains(HARDWARE_MARKER) {
        return;
    }

    for group in parenthesized_groups(text) {
        for member in split_group_members(&group) {
            let token = *member.inner();
            if is_hardware_token(token) {
                continue;
            }
            let Some(reference) = object_reference(token) else {
                continue;
            };

            match extract_number(&token[reference.span().range()]) {
                Ok(number) => {
                    trace!(node = node.index(), tag = token, number; "Bus object tag");
                    index.numbers.push(number);
                    index
                        .records
                        .entry(token.to_string())
                        .or_insert_with(|| TagRecord::new(token))
                        .push_occurrence(*group.inner());
                }
                Err(err) => {
                    warn!(node = node.index(), tag = token; "Skipping malformed bus tag");
                    index.diagnostics.push(malformed_tag_warning(
                        &err,
                        node.document_span(member.span()),
                        node.document_span(group.span()),
                    ));
                }
            }
        }
    }
}

fn malformed_tag_warning(err: &MalformedTag, span: Span, tuple_span: Span) -> Diagnostic {
    let (code, help) = match err {
        MalformedTag::MissingBracket(_) => (
            ErrorCode::E001,
            "bus tags are written as `Bus[<number>].Obj`",
        ),
        MalformedTag::InvalidNumber { .. } => (
            ErrorCode::E002,
            "the bus number must fit in 32 bits",
        ),
    };

    Diagnostic::warning(err.to_string())
        .with_code(code)
        .with_label(span, "skipped")
        .with_secondary_label(tuple_span, "in this tuple")
        .with_help(help)
}
