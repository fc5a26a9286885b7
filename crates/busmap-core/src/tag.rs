//! Tag tuples and per-tag census records.
//!
//! A tuple is the text between the parentheses of a group `(a, b, c)`,
//! exactly as written. Its members are the comma-separated pieces without
//! any trimming, so `" Bus[3].Obj"` and `"Bus[3].Obj"` are different tags.

/// Returns the first comma-separated member of a tuple text.
pub fn first_member(tuple_text: &str) -> &str {
    tuple_text.split(',').next().unwrap_or(tuple_text)
}

/// Census record for one distinct bus tag string.
///
/// `count` is the number of tuple members equal to `tag`; a tag that appears
/// twice in one tuple counts twice and lists that tuple twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    tag: String,
    count: usize,
    tuple_texts: Vec<String>,
}

impl TagRecord {
    /// Create a record with no occurrences yet.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            count: 0,
            tuple_texts: Vec::new(),
        }
    }

    /// Create a record from already counted parts, e.g. a census row.
    pub fn from_parts(tag: impl Into<String>, count: usize, tuple_texts: Vec<String>) -> Self {
        Self {
            tag: tag.into(),
            count,
            tuple_texts,
        }
    }

    /// Record one more occurrence of the tag inside `tuple_text`.
    pub fn push_occurrence(&mut self, tuple_text: impl Into<String>) {
        self.count += 1;
        self.tuple_texts.push(tuple_text.into());
    }

    /// Returns the tag text.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Returns the occurrence count.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Returns the texts of the tuples the tag occurred in, in document order.
    pub fn tuple_texts(&self) -> &[String] {
        &self.tuple_texts
    }

    /// Returns `true` if the tag is used by more than one tuple member.
    pub fn is_duplicate(&self) -> bool {
        self.count > 1
    }
}
