//! Quoted tag lists.
//!
//! The census table stores the tuples a tag occurred in as one cell, written
//! as a parenthesised list of quoted strings:
//!
//! ```text
//! ('Pump, Bus[3].Obj', 'Valve, Bus[3].Obj')
//! ```
//!
//! [`render_tag_list`] always writes single quotes, escaping `\` and `'`
//! with a backslash. [`parse_tag_list`] also accepts double quotes, a
//! bracketed `[...]` list and a trailing comma, since the cell may have been
//! edited by hand between runs.

use winnow::{
    Parser as _,
    ascii::multispace0,
    combinator::alt,
    error::ModalResult,
    token::{any, one_of, take_till},
};

use crate::{
    error::{Diagnostic, ErrorCode, ParseError},
    span::Span,
};

/// Render `tags` as a parenthesised list of single-quoted strings.
///
/// # Example
///
/// ```
/// # use busmap_parser::tag_list::render_tag_list;
/// assert_eq!(render_tag_list(["a, Bus[1].Obj", "it's"]), r"('a, Bus[1].Obj', 'it\'s')");
/// ```
pub fn render_tag_list<I, S>(tags: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let quoted: Vec<String> = tags
        .into_iter()
        .map(|tag| {
            let escaped = tag.as_ref().replace('\\', r"\\").replace('\'', r"\'");
            format!("'{escaped}'")
        })
        .collect();
    format!("({})", quoted.join(", "))
}

/// Parse a tag list cell back into its strings.
///
/// # Errors
///
/// Returns a [`ParseError`] with:
/// - `E200` if the cell is not a list of quoted strings
/// - `E201` if a quoted string is never closed
///
/// Spans in the diagnostics are byte offsets into `cell`.
pub fn parse_tag_list(cell: &str) -> Result<Vec<String>, ParseError> {
    let mut input = cell;
    let offset = |input: &str| cell.len() - input.len();

    skip_whitespace(&mut input);
    let close = match open_delimiter(&mut input) {
        Ok(open) if open == '(' => ')',
        Ok(_) => ']',
        Err(_) => {
            let at = offset(input);
            return Err(malformed(
                cell,
                at,
                "expected `(` or `[` to open the tag list",
            ));
        }
    };

    let mut tags = Vec::new();
    loop {
        skip_whitespace(&mut input);
        if input.starts_with(close) {
            input = &input[close.len_utf8()..];
            break;
        }

        let at = offset(input);
        if !input.starts_with(['\'', '"']) {
            return Err(malformed(cell, at, "expected a quoted tag"));
        }
        match quoted(&mut input) {
            Ok(tag) => tags.push(tag),
            Err(_) => {
                return Err(Diagnostic::error("unterminated quoted tag")
                    .with_code(ErrorCode::E201)
                    .with_label(Span::new(at..cell.len()), "quote opened here")
                    .with_help(r"close the tag with a matching quote, escaping inner quotes as \'")
                    .into());
            }
        }

        skip_whitespace(&mut input);
        if let Some(rest) = input.strip_prefix(',') {
            input = rest;
        } else if !input.starts_with(close) {
            let at = offset(input);
            return Err(malformed(
                cell,
                at,
                &format!("expected `,` or `{close}` after a tag"),
            ));
        }
    }

    skip_whitespace(&mut input);
    if !input.is_empty() {
        let at = offset(input);
        return Err(malformed(cell, at, "unexpected text after the tag list"));
    }

    Ok(tags)
}

fn malformed(cell: &str, at: usize, message: &str) -> ParseError {
    let end = (at + 1).min(cell.len()).max(at);
    Diagnostic::error(format!("malformed tag list: {message}"))
        .with_code(ErrorCode::E200)
        .with_label(Span::new(at..end), message)
        .with_help("tag lists are written as ('first tag', 'second tag')")
        .into()
}

fn skip_whitespace(input: &mut &str) {
    let _: ModalResult<&str> = multispace0.parse_next(input);
}

fn open_delimiter(input: &mut &str) -> ModalResult<char> {
    alt(('(', '[')).parse_next(input)
}

/// A single- or double-quoted string with backslash escapes.
fn quoted(input: &mut &str) -> ModalResult<String> {
    let quote = one_of(['\'', '"']).parse_next(input)?;
    let mut value = String::new();

    loop {
        let chunk = take_till(0.., |c: char| c == quote || c == '\\').parse_next(input)?;
        value.push_str(chunk);

        let c = any.parse_next(input)?;
        if c == quote {
            return Ok(value);
        }
        let escaped = any.parse_next(input)?;
        value.push(match escaped {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            other => other,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        assert_eq!(render_tag_list(["Bus[7].Obj"]), "('Bus[7].Obj')");
        assert_eq!(render_tag_list(Vec::<String>::new()), "()");
        assert_eq!(render_tag_list([r"a\b"]), r"('a\\b')");
    }

    #[test]
    fn test_parse_rendered_list() {
        let tags = vec!["Pump, Bus[3].Obj".to_string(), "it's".to_string(), r"x\y".to_string()];
        let cell = render_tag_list(&tags);

        assert_eq!(parse_tag_list(&cell).unwrap(), tags);
    }

    #[test]
    fn test_parse_alternative_forms() {
        assert_eq!(
            parse_tag_list(r#" ["a", 'b',] "#).unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert_eq!(parse_tag_list("('only',)").unwrap(), vec!["only".to_string()]);
        assert!(parse_tag_list("()").unwrap().is_empty());
    }

    #[test]
    fn test_missing_open_delimiter() {
        let err = parse_tag_list("'a'").unwrap_err();
        let diag = &err.diagnostics()[0];

        assert_eq!(diag.code(), Some(ErrorCode::E200));
        assert_eq!(diag.labels()[0].span(), Span::new(0..1));
    }

    #[test]
    fn test_unquoted_tag() {
        let err = parse_tag_list("(Bus[1].Obj)").unwrap_err();

        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E200));
    }

    #[test]
    fn test_unterminated_tag() {
        let err = parse_tag_list("('a', 'b)").unwrap_err();
        let diag = &err.diagnostics()[0];

        assert_eq!(diag.code(), Some(ErrorCode::E201));
        assert_eq!(diag.labels()[0].span(), Span::new(6..9));
    }

    #[test]
    fn test_trailing_text() {
        let err = parse_tag_list("('a') extra").unwrap_err();

        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E200));
    }
}
