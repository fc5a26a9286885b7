//! # Busmap Parser
//!
//! Reading side of busmap: everything that turns raw text into located
//! pieces the editor can reason about.
//!
//! - [`pattern`] recognises `Bus[N]` and `Bus[N].Obj` references and the
//!   parenthesised tuples they are grouped in.
//! - [`document`] loads a markup document and lists its text-bearing nodes
//!   with their byte spans.
//! - [`tag_list`] reads and writes the quoted tuple lists stored in the
//!   census table.
//! - [`error`] holds the diagnostic system shared by all of the above.
//!
//! ## Usage
//!
//! ```
//! # use busmap_parser::{Document, pattern};
//! let source = "<Rung><Text>(Pump, Bus[3].Obj)</Text></Rung>";
//! let document = Document::parse(source, "Text").unwrap();
//!
//! let groups = pattern::parenthesized_groups(document.nodes()[0].text());
//! assert_eq!(*groups[0].inner(), "Pump, Bus[3].Obj");
//! ```

pub mod document;
pub mod error;
pub mod pattern;
mod span;
pub mod tag_list;

pub use document::{Document, TextNode};
pub use span::{Span, Spanned};
