//! Substitution engine.
//!
//! Every operation here works the same way: each text node's trimmed text is
//! read once, a list of non-overlapping edits is computed against that
//! original text, and the edits of all nodes are spliced into the raw
//! document in a single pass. Each edit lands inside its own node's text
//! span, so two nodes with identical text never interfere, and no edit is
//! ever matched against the output of another.
//!
//! Replacements are written in the encoding of the text they land in: raw
//! inside CDATA, escaped inside plain element text. A node whose text could
//! not be located in the raw document is left untouched with a warning.

use log::{debug, info, trace, warn};

use busmap_core::mapping::{NumberMapping, ReplacementMapping};
use busmap_parser::{
    Document, Span, TextNode,
    document::TextEncoding,
    pattern::{bus_references, is_bus_object_reference},
};

/// One replacement of a byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Edit {
    span: Span,
    replacement: String,
}

impl Edit {
    pub(crate) fn new(span: Span, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
        }
    }
}

/// Edits of one text, kept sorted and non-overlapping.
#[derive(Debug, Default)]
pub(crate) struct EditList {
    edits: Vec<Edit>,
}

impl EditList {
    /// Returns `true` if `span` overlaps an edit already in the list.
    fn is_claimed(&self, span: Span) -> bool {
        self.edits.iter().any(|edit| edit.span.overlaps(span))
    }

    /// Add an edit unless it overlaps one already in the list.
    pub(crate) fn claim(&mut self, edit: Edit) -> bool {
        if self.is_claimed(edit.span) {
            return false;
        }
        let at = self
            .edits
            .partition_point(|other| other.span.start() < edit.span.start());
        self.edits.insert(at, edit);
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.edits.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Apply the edits to `text`, which their spans refer to.
    pub(crate) fn apply(&self, text: &str) -> String {
        if self.edits.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for edit in &self.edits {
            out.push_str(&text[cursor..edit.span.start()]);
            out.push_str(&edit.replacement);
            cursor = edit.span.end();
        }
        out.push_str(&text[cursor..]);
        out
    }
}

/// A rewritten document and what changed in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    text: String,
    nodes_changed: usize,
    replacements: usize,
}

impl Rewrite {
    pub(crate) fn new(text: String, nodes_changed: usize, replacements: usize) -> Self {
        Self {
            text,
            nodes_changed,
            replacements,
        }
    }

    /// The rewritten document text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Consume the rewrite and return the document text.
    pub fn into_text(self) -> String {
        self.text
    }

    /// Number of text nodes that changed.
    pub fn nodes_changed(&self) -> usize {
        self.nodes_changed
    }

    /// Number of individual replacements made.
    pub fn replacements(&self) -> usize {
        self.replacements
    }

    /// Returns `true` if nothing was replaced.
    pub fn is_unchanged(&self) -> bool {
        self.replacements == 0
    }
}

/// Compute the edits of every node with `edits_for` and splice them into the
/// document.
fn rewrite<F>(document: &Document, mut edits_for: F) -> Rewrite
where
    F: FnMut(&TextNode) -> EditList,
{
    let mut document_edits = EditList::default();
    let mut nodes_changed = 0;
    let mut replacements = 0;

    for node in document.nodes() {
        let edits = edits_for(node);
        if edits.is_empty() {
            continue;
        }

        let Some(text_span) = node.text_span() else {
            warn!(node = node.index(); "Text node not found in document, left unchanged");
            continue;
        };

        trace!(node = node.index(), edits_count = edits.len(); "Rewriting text node");
        nodes_changed += 1;
        replacements += edits.len();

        match node.encoding() {
            TextEncoding::Cdata => {
                for edit in edits.edits {
                    let span = edit.span.shift(text_span.start());
                    document_edits.claim(Edit::new(span, edit.replacement));
                }
            }
            TextEncoding::Verbatim => {
                for edit in edits.edits {
                    let span = edit.span.shift(text_span.start());
                    let replacement = TextEncoding::PartialEscaped.encode(&edit.replacement);
                    document_edits.claim(Edit::new(span, replacement));
                }
            }
            encoding => {
                let modified = edits.apply(node.text());
                document_edits.claim(Edit::new(text_span, encoding.encode(&modified)));
            }
        }
    }

    debug!(nodes_changed, replacements; "Substitution finished");
    Rewrite::new(
        document_edits.apply(document.source()),
        nodes_changed,
        replacements,
    )
}

/// Replace bus numbers according to `mapping`.
///
/// Only nodes holding a `Bus[N].Obj` reference are touched. In such a node
/// every key is tried once, in mapping order: the first `Bus[N]` or
/// `Bus[N].Obj` reference whose number equals the key, and which no earlier
/// key has rewritten, gets the mapped number. Numbers are compared by value,
/// so `Bus[03]` is renumbered by key 3. `HWBus[...]` references are never
/// rewritten.
pub fn renumber(document: &Document, mapping: &NumberMapping) -> Rewrite {
    info!(keys_count = mapping.len(); "Renumbering buses");

    rewrite(document, |node| {
        let mut edits = EditList::default();
        let text = node.text();
        if !is_bus_object_reference(text) {
            return edits;
        }

        let references: Vec<_> = bus_references(text)
            .into_iter()
            .filter(|found| !found.is_hardware())
            .collect();

        for (from, to) in mapping.iter() {
            let Some(found) = references
                .iter()
                .find(|found| {
                    found.number() == Some(from) && !edits.is_claimed(found.number_span())
                })
            else {
                continue;
            };
            edits.claim(Edit::new(found.number_span(), to.to_string()));
        }
        edits
    })
}

/// Replace duplicated tags inside the tuples listed in `scope`.
///
/// A node is touched only if it holds a `Bus[N].Obj` reference and contains
/// at least one scope tuple text. In such a node every key is tried once, in
/// mapping order, and its first occurrence lying inside an occurrence of a
/// scope tuple is replaced. Occurrences outside the scoped tuples, such as
/// the first occurrence of the duplicated tag, keep their text.
///
/// An empty mapping leaves the document byte-for-byte unchanged.
pub fn deduplicate(document: &Document, mapping: &ReplacementMapping, scope: &[String]) -> Rewrite {
    info!(keys_count = mapping.len(), scope_count = scope.len(); "Deduplicating bus tags");

    rewrite(document, |node| {
        let mut edits = EditList::default();
        let text = node.text();
        if mapping.is_empty() || !is_bus_object_reference(text) {
            return edits;
        }

        let scoped: Vec<Span> = scope
            .iter()
            .filter(|token| !token.is_empty())
            .flat_map(|token| {
                text.match_indices(token.as_str())
                    .map(|(start, found)| Span::new(start..start + found.len()))
            })
            .collect();
        if scoped.is_empty() {
            return edits;
        }

        for (key, value) in mapping.iter() {
            if key.is_empty() {
                continue;
            }
            let found = text
                .match_indices(key)
                .map(|(start, _)| Span::new(start..start + key.len()))
                .find(|span| {
                    scoped.iter().any(|scope| scope.contains(*span)) && !edits.is_claimed(*span)
                });
            if let Some(span) = found {
                edits.claim(Edit::new(span, value));
            }
        }
        edits
    })
}

/// Replace tags literally.
///
/// Only nodes holding a `Bus[N].Obj` reference are touched. In such a node
/// every key is tried once, in mapping order, and its first occurrence not
/// already replaced by an earlier key gets the mapped text.
pub fn replace_tags(document: &Document, mapping: &ReplacementMapping) -> Rewrite {
    info!(keys_count = mapping.len(); "Replacing tags");

    rewrite(document, |node| {
        let mut edits = EditList::default();
        let text = node.text();
        if !is_bus_object_reference(text) {
            return edits;
        }

        for (key, value) in mapping.iter() {
            if key.is_empty() {
                continue;
            }
            let found = text
                .match_indices(key)
                .map(|(start, _)| Span::new(start..start + key.len()))
                .find(|span| !edits.is_claimed(*span));
            if let Some(span) = found {
                edits.claim(Edit::new(span, value));
            }
        }
        edits
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use busmap_core::allocation::AllocationRange;

    use super::*;
    use crate::{index::build_tag_index, plan::plan_deduplication};

    fn document(texts: &[&str]) -> Document {
        let body: String = texts
            .iter()
            .map(|text| format!("<Rung>\n  <Text>\n<![CDATA[{text}]]>\n  </Text>\n</Rung>\n"))
            .collect();
        Document::parse(format!("<Routine>\n{body}</Routine>\n"), "Text").unwrap()
    }

    fn texts(source: &str) -> Vec<String> {
        let document = Document::parse(source, "Text").unwrap();
        document.texts().map(str::to_string).collect()
    }

    #[test]
    fn test_edit_list_rejects_overlaps() {
        let mut edits = EditList::default();
        assert!(edits.claim(Edit::new(Span::new(4..6), "x")));
        assert!(!edits.claim(Edit::new(Span::new(5..8), "y")));
        assert!(edits.claim(Edit::new(Span::new(0..1), "z")));

        assert_eq!(edits.apply("abcdefgh"), "zbcdxgh");
    }

    #[test]
    fn test_renumber_swaps_without_cascading() {
        let document = document(&["(Pump,Bus[1].Obj,Bus[2].Obj)"]);
        let mapping: NumberMapping = [(1, 2), (2, 1)].into_iter().collect();

        let rewrite = renumber(&document, &mapping);
        assert_eq!(texts(rewrite.text()), vec!["(Pump,Bus[2].Obj,Bus[1].Obj)"]);
        assert_eq!(rewrite.replacements(), 2);
    }

    #[test]
    fn test_renumber_matches_whole_bracket_digits() {
        let document = document(&["(Motor12,Bus[12].Obj,Bus[1].Obj)"]);
        let mapping: NumberMapping = [(1, 7)].into_iter().collect();

        let rewrite = renumber(&document, &mapping);
        assert_eq!(texts(rewrite.text()), vec!["(Motor12,Bus[12].Obj,Bus[7].Obj)"]);
    }

    #[test]
    fn test_renumber_compares_numbers_by_value() {
        let document = document(&["(Pump,Bus[03].Obj)"]);
        assert_eq!(build_tag_index(&document).numbers(), &[3]);
        let mapping: NumberMapping = [(3, 7)].into_iter().collect();

        let rewrite = renumber(&document, &mapping);
        assert_eq!(texts(rewrite.text()), vec!["(Pump,Bus[7].Obj)"]);
    }

    #[test]
    fn test_renumber_rewrites_the_listed_reference() {
        let document = document(&["(Pump,Rack[1].Bus[7].Obj)"]);
        assert_eq!(build_tag_index(&document).numbers(), &[7]);
        let mapping: NumberMapping = [(7, 8)].into_iter().collect();

        let rewrite = renumber(&document, &mapping);
        assert_eq!(texts(rewrite.text()), vec!["(Pump,Rack[1].Bus[8].Obj)"]);
    }

    #[test]
    fn test_renumber_leaves_hardware_and_plain_nodes() {
        let document = document(&["(Rack,HWBus[3].Obj,Bus[3].Obj)", "(Slot,Bus[3])"]);
        let mapping: NumberMapping = [(3, 9)].into_iter().collect();

        let rewrite = renumber(&document, &mapping);
        assert_eq!(
            texts(rewrite.text()),
            vec!["(Rack,HWBus[3].Obj,Bus[9].Obj)", "(Slot,Bus[3])"]
        );
        assert_eq!(rewrite.nodes_changed(), 1);
    }

    #[test]
    fn test_identical_nodes_are_each_rewritten_in_place() {
        let document = document(&["(Pump,Bus[1].Obj)", "(Pump,Bus[1].Obj)"]);
        let mapping: NumberMapping = [(1, 4)].into_iter().collect();

        let rewrite = renumber(&document, &mapping);
        assert_eq!(
            texts(rewrite.text()),
            vec!["(Pump,Bus[4].Obj)", "(Pump,Bus[4].Obj)"]
        );
    }

    #[test]
    fn test_only_node_text_changes() {
        let source = "<Routine Name=\"Bus[1].Obj\">\n<Text>(Pump,Bus[1].Obj)</Text>\n</Routine>";
        let document = Document::parse(source, "Text").unwrap();
        let mapping: NumberMapping = [(1, 2)].into_iter().collect();

        let rewrite = renumber(&document, &mapping);
        assert_eq!(
            rewrite.text(),
            "<Routine Name=\"Bus[1].Obj\">\n<Text>(Pump,Bus[2].Obj)</Text>\n</Routine>"
        );
    }

    #[test]
    fn test_escaped_text_is_reencoded() {
        let source = "<Text>(A&amp;B,Bus[1].Obj)</Text>";
        let document = Document::parse(source, "Text").unwrap();
        let mapping: NumberMapping = [(1, 2)].into_iter().collect();

        let rewrite = renumber(&document, &mapping);
        assert_eq!(rewrite.text(), "<Text>(A&amp;B,Bus[2].Obj)</Text>");
    }

    #[test]
    fn test_deduplicate_touches_only_the_scoped_tuple() {
        let document = document(&[
            "(Bus[3].Obj,Bus[4].Obj)",
            "Bus[3].Obj(Bus[3].Obj,Bus[5].Obj)",
        ]);
        let index = build_tag_index(&document);
        let record = index.record("Bus[3].Obj").unwrap();
        assert_eq!(record.count(), 2);

        let range = AllocationRange::new(1, 10).unwrap();
        let plan = plan_deduplication(index.records(), range).unwrap();
        assert_eq!(plan.mapping().get("Bus[3].Obj"), Some("Bus[1].Obj"));

        let rewrite = deduplicate(&document, plan.mapping(), plan.scope());
        assert_eq!(
            texts(rewrite.text()),
            vec!["(Bus[3].Obj,Bus[4].Obj)", "Bus[3].Obj(Bus[1].Obj,Bus[5].Obj)"]
        );
    }

    #[test]
    fn test_deduplicate_writes_plain_bus_tags() {
        let document = document(&["(a, Local:Bus[3].Obj)", "(b, Local:Bus[3].Obj)"]);
        let index = build_tag_index(&document);

        let range = AllocationRange::new(1, 10).unwrap();
        let plan = plan_deduplication(index.records(), range).unwrap();
        let rewrite = deduplicate(&document, plan.mapping(), plan.scope());

        assert_eq!(
            texts(rewrite.text()),
            vec!["(a, Local:Bus[3].Obj)", "(b,Bus[1].Obj)"]
        );
    }

    #[test]
    fn test_deduplicate_three_occurrences_share_last_number() {
        let document = document(&["(Pump,Bus[3].Obj)", "(Fan,Bus[3].Obj)", "(Valve,Bus[3].Obj)"]);
        let index = build_tag_index(&document);

        let range = AllocationRange::new(1, 10).unwrap();
        let plan = plan_deduplication(index.records(), range).unwrap();
        let rewrite = deduplicate(&document, plan.mapping(), plan.scope());

        // Bus[1] is allocated for the second tuple, then superseded by Bus[2].
        assert_eq!(
            texts(rewrite.text()),
            vec!["(Pump,Bus[3].Obj)", "(Fan,Bus[2].Obj)", "(Valve,Bus[2].Obj)"]
        );
    }

    #[test]
    fn test_deduplicate_skips_hardware_node() {
        let document = document(&["(Rack,HWBus[2].Obj)"]);
        let index = build_tag_index(&document);
        assert_eq!(index.records().count(), 0);

        let mapping: ReplacementMapping = [("HWBus[2].Obj", "HWBus[9].Obj")].into_iter().collect();
        let rewrite = deduplicate(&document, &mapping, &["Rack,HWBus[2].Obj".to_string()]);
        assert!(rewrite.is_unchanged());
    }

    #[test]
    fn test_replace_tags_is_single_pass() {
        let document = document(&["(Pump_1,Bus[1].Obj)", "(Pump_1,Bus[1])"]);
        let mapping: ReplacementMapping = [("Pump_1", "Pump_2"), ("Pump_2", "Pump_3")]
            .into_iter()
            .collect();

        let rewrite = replace_tags(&document, &mapping);
        assert_eq!(
            texts(rewrite.text()),
            vec!["(Pump_2,Bus[1].Obj)", "(Pump_1,Bus[1])"]
        );
    }

    #[test]
    fn test_replacement_in_plain_text_is_escaped() {
        let source = "<Text>(Pump_1,Bus[1].Obj)</Text>";
        let document = Document::parse(source, "Text").unwrap();
        let mapping: ReplacementMapping = [("Pump_1", "A&B")].into_iter().collect();

        let rewrite = replace_tags(&document, &mapping);
        assert_eq!(rewrite.text(), "<Text>(A&amp;B,Bus[1].Obj)</Text>");
        assert_eq!(texts(rewrite.text()), vec!["(A&B,Bus[1].Obj)"]);
    }

    #[test]
    fn test_replacement_in_cdata_is_raw() {
        let document = document(&["(Pump_1,Bus[1].Obj)"]);
        let mapping: ReplacementMapping = [("Pump_1", "A&B")].into_iter().collect();

        let rewrite = replace_tags(&document, &mapping);
        assert!(rewrite.text().contains("<![CDATA[(A&B,Bus[1].Obj)]]>"));
        assert_eq!(texts(rewrite.text()), vec!["(A&B,Bus[1].Obj)"]);
    }

    fn node_text() -> impl Strategy<Value = String> {
        proptest::string::string_regex(r"[A-Za-z0-9_ ,.\[\]()]{0,40}").unwrap()
    }

    proptest! {
        #[test]
        fn deduplicate_with_empty_mapping_is_a_no_op(
            nodes in proptest::collection::vec(node_text(), 0..6),
        ) {
            let refs: Vec<&str> = nodes.iter().map(String::as_str).collect();
            let document = document(&refs);
            let index = build_tag_index(&document);
            let scope: Vec<String> = index
                .records()
                .flat_map(|record| record.tuple_texts().iter().cloned())
                .collect();

            let rewrite = deduplicate(&document, &ReplacementMapping::new(), &scope);
            prop_assert_eq!(rewrite.text(), document.source());
        }

        #[test]
        fn renumber_then_inverse_restores_document(
            nodes in proptest::collection::vec(
                proptest::sample::subsequence((0u32..8).collect::<Vec<_>>(), 1..8)
                    .prop_shuffle(),
                1..5,
            ),
            permutation in Just((0u32..8).collect::<Vec<_>>()).prop_shuffle(),
        ) {
            let texts: Vec<String> = nodes
                .iter()
                .map(|numbers| {
                    let members: Vec<String> = numbers
                        .iter()
                        .map(|number| format!("Bus[{number}].Obj"))
                        .collect();
                    format!("OTE(Slot,{})", members.join(","))
                })
                .collect();
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            let original = document(&refs);

            let mapping: NumberMapping = (0u32..8).zip(permutation.iter().copied()).collect();
            let inverse = mapping.inverse().unwrap();

            let forward = renumber(&original, &mapping).into_text();
            let forward = Document::parse(forward, "Text").unwrap();
            let restored = renumber(&forward, &inverse);

            prop_assert_eq!(restored.text(), original.source());
        }
    }
}
