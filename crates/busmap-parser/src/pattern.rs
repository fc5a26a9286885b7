//! Recognisers for bus references and tag tuples inside free text.
//!
//! Two lexical shapes are recognised anywhere inside a text:
//!
//! - `Bus[<digits>]` - a bus number reference
//! - `Bus[<digits>].Obj` - a bus object reference
//!
//! Tuples are parenthesised groups `(a, b, c)`. A group runs from an opening
//! parenthesis to the next closing one on the same line; groups do not nest
//! and never overlap.
//!
//! The recognisers do not know about `HWBus[...]`: `HWBus[2].Obj` contains
//! `Bus[2].Obj` and is reported as a match, flagged with
//! [`BusMatch::is_hardware`]. Callers decide what to do with it.

use winnow::{
    Parser as _,
    ascii::digit1,
    combinator::{delimited, opt, preceded},
    error::ModalResult,
    token::{literal, take_till},
};

use busmap_core::reference::{BUS_PREFIX, MalformedTag, OBJECT_SUFFIX};

use crate::span::{Span, Spanned};

/// A bus reference found inside a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusMatch<'a> {
    span: Span,
    digits: Spanned<&'a str>,
    is_object: bool,
    is_hardware: bool,
}

impl<'a> BusMatch<'a> {
    /// Span of the whole reference, `.Obj` included when present.
    pub fn span(&self) -> Span {
        self.span
    }

    /// Span of the digits between the brackets.
    pub fn number_span(&self) -> Span {
        self.digits.span()
    }

    /// The digits between the brackets, as written.
    pub fn digits(&self) -> &'a str {
        *self.digits.inner()
    }

    /// The bus number, or `None` if it does not fit a `u32`.
    pub fn number(&self) -> Option<u32> {
        self.digits().parse().ok()
    }

    /// Returns `true` for `Bus[N].Obj`, `false` for a bare `Bus[N]`.
    pub fn is_object(&self) -> bool {
        self.is_object
    }

    /// Returns `true` if the reference is the tail of `HWBus[N]`.
    pub fn is_hardware(&self) -> bool {
        self.is_hardware
    }
}

/// `Bus[<digits>]` optionally followed by `.Obj`.
fn bus_reference<'a>(input: &mut &'a str) -> ModalResult<(&'a str, bool)> {
    (
        delimited(literal(BUS_PREFIX), digit1, ']'),
        opt(literal(OBJECT_SUFFIX)),
    )
        .map(|(digits, suffix): (&str, Option<&str>)| (digits, suffix.is_some()))
        .parse_next(input)
}

/// Content of the first `[...]` group.
fn first_bracket_group<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    preceded(
        take_till(0.., '['),
        delimited('[', take_till(0.., [']', '\n']), ']'),
    )
    .parse_next(input)
}

/// Content of a `(...)` group that closes on the same line.
fn parenthesized<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited('(', take_till(0.., [')', '\n']), ')').parse_next(input)
}

/// Find every bus reference in `text`, left to right.
///
/// # Example
///
/// ```
/// # use busmap_parser::pattern::bus_references;
/// let found = bus_references("Valve(Bus[3].Obj, HWBus[1], Bus[12])");
///
/// assert_eq!(found.len(), 3);
/// assert!(found[0].is_object());
/// assert!(found[1].is_hardware());
/// assert_eq!(found[2].number(), Some(12));
/// ```
pub fn bus_references(text: &str) -> Vec<BusMatch<'_>> {
    let mut found = Vec::new();

    for (start, _) in text.match_indices(BUS_PREFIX) {
        let mut input = &text[start..];
        let Ok((digits, is_object)) = bus_reference(&mut input) else {
            continue;
        };

        let end = text.len() - input.len();
        let digits_start = start + BUS_PREFIX.len();
        found.push(BusMatch {
            span: Span::new(start..end),
            digits: Spanned::new(digits, Span::new(digits_start..digits_start + digits.len())),
            is_object,
            is_hardware: text[..start].ends_with("HW"),
        });
    }

    found
}

/// Returns `true` if `text` contains `Bus[<digits>].Obj` outside `HWBus[...]`.
pub fn is_bus_object_reference(text: &str) -> bool {
    object_reference(text).is_some()
}

/// Returns `true` if `text` contains `Bus[<digits>]`.
pub fn is_bus_number_reference(text: &str) -> bool {
    !bus_references(text).is_empty()
}

/// Read the number inside the first bracket group of `tag`.
///
/// Surrounding whitespace inside the brackets is tolerated.
///
/// # Errors
///
/// - [`MalformedTag::MissingBracket`] if `tag` has no `[...]` group
/// - [`MalformedTag::InvalidNumber`] if the group does not hold a number
pub fn extract_number(tag: &str) -> Result<u32, MalformedTag> {
    let mut input = tag;
    let group = first_bracket_group(&mut input)
        .map_err(|_| MalformedTag::MissingBracket(tag.to_string()))?;

    group
        .trim()
        .parse()
        .map_err(|_| MalformedTag::InvalidNumber {
            tag: tag.to_string(),
            group: group.to_string(),
        })
}

/// Find every parenthesised group in `text`, left to right.
///
/// Each result is the text between the parentheses with its span in `text`.
pub fn parenthesized_groups(text: &str) -> Vec<Spanned<&str>> {
    let mut groups = Vec::new();
    let mut offset = 0;

    while let Some(found) = text[offset..].find('(') {
        let start = offset + found;
        let mut input = &text[start..];

        match parenthesized(&mut input) {
            Ok(inner) => {
                let inner_start = start + 1;
                groups.push(Spanned::new(
                    inner,
                    Span::new(inner_start..inner_start + inner.len()),
                ));
                offset = text.len() - input.len();
            }
            Err(_) => offset = start + 1,
        }
    }

    groups
}

/// Split a group into its comma-separated members, keeping each member's
/// span. Members are not trimmed.
pub fn split_group_members<'a>(group: &Spanned<&'a str>) -> Vec<Spanned<&'a str>> {
    let mut members = Vec::new();
    let mut start = group.span().start();

    for member in group.inner().split(',') {
        members.push(Spanned::new(member, Span::new(start..start + member.len())));
        start += member.len() + 1;
    }

    members
}

/// The first bus object reference in `text` that is not part of `HWBus[N]`.
///
/// This is the reference a tag is filed under and the one a renumbering
/// rewrites.
///
/// # Example
///
/// ```
/// # use busmap_parser::pattern::object_reference;
/// let found = object_reference("Rack[1].HWBus[2].Obj,Bus[07].Obj").unwrap();
/// assert_eq!(found.digits(), "07");
/// assert_eq!(found.number(), Some(7));
/// assert!(object_reference("Bus[3]").is_none());
/// ```
pub fn object_reference(text: &str) -> Option<BusMatch<'_>> {
    bus_references(text)
        .into_iter()
        .find(|found| found.is_object() && !found.is_hardware())
}
