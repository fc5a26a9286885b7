//! Text-bearing nodes of a markup document.
//!
//! [`Document::parse`] walks a markup document with `quick-xml` and collects
//! every element with a given name (`Text` in Logix L5X exports) whose text
//! content is non-empty. The content of a node is the run of text and CDATA
//! right after its start tag, up to its first child element or its end tag.
//!
//! Every node remembers where its text sits in the raw document, so that it
//! can be rewritten in place without touching a single other byte.

use std::borrow::Cow;

use log::{debug, trace};
use quick_xml::{
    Reader,
    escape::{escape, partial_escape},
    events::Event,
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
};

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// How a node's text is written in the raw document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Inside a CDATA section, written exactly as decoded.
    Cdata,
    /// Plain text that happens to need no entities. New text written here
    /// must still be escaped.
    Verbatim,
    /// Written with `<`, `>`, `&`, `'` and `"` escaped.
    Escaped,
    /// Written with only `<`, `>` and `&` escaped.
    PartialEscaped,
}

impl TextEncoding {
    /// Encode `text` the way this node's text is written.
    pub fn encode<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            TextEncoding::Cdata | TextEncoding::Verbatim => Cow::Borrowed(text),
            TextEncoding::Escaped => escape(text),
            TextEncoding::PartialEscaped => partial_escape(text),
        }
    }
}

/// One text-bearing node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    index: usize,
    text: String,
    content_span: Span,
    text_span: Option<Span>,
    encoding: TextEncoding,
}

impl TextNode {
    /// Position of the node among all text nodes, in document order.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The decoded and trimmed text content.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Span of the raw content between the start tag and the first child
    /// or end tag.
    pub fn content_span(&self) -> Span {
        self.content_span
    }

    /// Span of the raw document where [`TextNode::text`] is written, or
    /// `None` if the text could not be located.
    pub fn text_span(&self) -> Option<Span> {
        self.text_span
    }

    /// How the text is written at [`TextNode::text_span`].
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Map a span relative to [`TextNode::text`] to a span in the document.
    ///
    /// Falls back to the whole content span when the text is not written
    /// as decoded.
    pub fn document_span(&self, relative: Span) -> Span {
        match (self.text_span, self.encoding) {
            (Some(span), TextEncoding::Cdata | TextEncoding::Verbatim) => {
                relative.shift(span.start())
            }
            _ => self.content_span,
        }
    }
}

/// A loaded document and its text nodes in document order.
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    nodes: Vec<TextNode>,
}

impl Document {
    /// Load `source` and collect the text content of every `text_element`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] with:
    /// - `E100` if the markup cannot be read
    /// - `E101` if the document ends while an element is still open
    ///
    /// # Example
    ///
    /// ```
    /// # use busmap_parser::Document;
    /// let source = "<Rung><Text><![CDATA[ (Pump, Bus[3].Obj) ]]></Text></Rung>";
    /// let document = Document::parse(source, "Text").unwrap();
    ///
    /// assert_eq!(document.nodes().len(), 1);
    /// assert_eq!(document.nodes()[0].text(), "(Pump, Bus[3].Obj)");
    /// ```
    pub fn parse(source: impl Into<String>, text_element: &str) -> Result<Self, ParseError> {
        let source = source.into();
        let nodes = NodeCollector::new(&source, text_element).collect()?;

        debug!(nodes_count = nodes.len(), text_element; "Document loaded");
        Ok(Self { source, nodes })
    }

    /// Returns the raw document text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the text nodes in document order.
    pub fn nodes(&self) -> &[TextNode] {
        &self.nodes
    }

    /// Iterate over the trimmed text of every node.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(TextNode::text)
    }
}

/// A text element whose content is still being read.
struct OpenNode {
    content_start: usize,
    text: String,
    segments: Vec<Segment>,
}

/// Raw span of one text or CDATA run inside a node.
struct Segment {
    span: Span,
    is_cdata: bool,
}

/// Walks the markup events and accumulates nodes and diagnostics.
struct NodeCollector<'a> {
    source: &'a str,
    text_element: &'a str,
    nodes: Vec<TextNode>,
    diagnostics: DiagnosticCollector,
}

impl<'a> NodeCollector<'a> {
    fn new(source: &'a str, text_element: &'a str) -> Self {
        Self {
            source,
            text_element,
            nodes: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    fn collect(mut self) -> Result<Vec<TextNode>, ParseError> {
        let mut reader = Reader::from_str(self.source);
        reader.config_mut().trim_text(false);

        let mut open: Option<OpenNode> = None;
        // Start tag spans of the elements currently open.
        let mut elements: Vec<Span> = Vec::new();

        loop {
            let position = reader.buffer_position() as usize;
            match reader.read_event() {
                Ok(Event::Start(start)) => {
                    self.close(open.take(), position);
                    let after = reader.buffer_position() as usize;
                    if start.local_name().as_ref() == self.text_element.as_bytes() {
                        open = Some(OpenNode {
                            content_start: after,
                            text: String::new(),
                            segments: Vec::new(),
                        });
                    }
                    elements.push(Span::new(position..after));
                }
                Ok(Event::End(_)) => {
                    self.close(open.take(), position);
                    elements.pop();
                }
                Ok(Event::Text(text)) => {
                    let Some(node) = open.as_mut() else {
                        continue;
                    };
                    let end = reader.buffer_position() as usize;
                    match text.unescape() {
                        Ok(decoded) => {
                            node.text.push_str(&decoded);
                            node.segments.push(Segment {
                                span: Span::new(position..end),
                                is_cdata: false,
                            });
                        }
                        Err(err) => {
                            self.diagnostics.emit(
                                Diagnostic::error(format!("cannot decode text: {err}"))
                                    .with_code(ErrorCode::E100)
                                    .with_label(Span::new(position..end), "in this text")
                                    .with_help("only the predefined XML entities are supported"),
                            );
                        }
                    }
                }
                Ok(Event::CData(cdata)) => {
                    if let Some(node) = open.as_mut() {
                        let end = reader.buffer_position() as usize;
                        node.text.push_str(&String::from_utf8_lossy(&cdata));
                        node.segments.push(Segment {
                            span: Span::new(position + CDATA_OPEN.len()..end - CDATA_CLOSE.len()),
                            is_cdata: true,
                        });
                    }
                }
                Ok(Event::Empty(_) | Event::Comment(_) | Event::PI(_)) => {
                    self.close(open.take(), position);
                }
                Ok(Event::Eof) => {
                    if let Some(unclosed) = elements.last() {
                        self.diagnostics.emit(
                            Diagnostic::error("document ended inside an element")
                                .with_code(ErrorCode::E101)
                                .with_label(*unclosed, "element opened here")
                                .with_help("close every element before the end of the file"),
                        );
                    }
                    break;
                }
                Ok(_) => {}
                Err(err) => {
                    let at = (reader.error_position() as usize).min(self.source.len());
                    let end = (at + 1).min(self.source.len());
                    self.diagnostics.emit(
                        Diagnostic::error(format!("malformed markup: {err}"))
                            .with_code(ErrorCode::E100)
                            .with_label(Span::new(at..end), ErrorCode::E100.description()),
                    );
                    break;
                }
            }
        }

        self.diagnostics.finish()?;
        Ok(self.nodes)
    }

    /// Finish a node whose raw content ends at `end`.
    fn close(&mut self, node: Option<OpenNode>, end: usize) {
        let Some(node) = node else {
            return;
        };

        let text = node.text.trim();
        if text.is_empty() {
            return;
        }

        let content_span = Span::new(node.content_start..end);
        let (text_span, encoding) = node
            .segments
            .iter()
            .find_map(|segment| self.locate(segment, text))
            .map_or((None, TextEncoding::Verbatim), |(span, encoding)| {
                (Some(span), encoding)
            });

        trace!(index = self.nodes.len(), located = text_span.is_some(); "Text node");
        self.nodes.push(TextNode {
            index: self.nodes.len(),
            text: text.to_string(),
            content_span,
            text_span,
            encoding,
        });
    }

    /// Find where `text` is written inside one segment. CDATA is written as
    /// decoded; plain text may be written with or without escapes.
    fn locate(&self, segment: &Segment, text: &str) -> Option<(Span, TextEncoding)> {
        let raw = &self.source[segment.span.range()];
        let encodings: &[TextEncoding] = if segment.is_cdata {
            &[TextEncoding::Cdata]
        } else {
            &[
                TextEncoding::Verbatim,
                TextEncoding::PartialEscaped,
                TextEncoding::Escaped,
            ]
        };

        encodings.iter().find_map(|encoding| {
            let encoded = encoding.encode(text);
            raw.find(encoded.as_ref()).map(|start| {
                let span = Span::new(start..start + encoded.len());
                (span.shift(segment.span.start()), *encoding)
            })
        })
    }
}
