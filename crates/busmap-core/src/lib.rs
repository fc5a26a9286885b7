//! Busmap Core Types and Definitions
//!
//! This crate provides the foundational types shared by the busmap parser,
//! library and command-line tool. It includes:
//!
//! - **References**: The `Bus[N].Obj` tag shape ([`reference::BusReference`])
//! - **Tags**: Tuples found in annotations and per-tag census records ([`tag`] module)
//! - **Allocation**: Inclusive number ranges and the used-number table ([`allocation`] module)
//! - **Mappings**: Insertion-ordered replacement mappings ([`mapping`] module)

pub mod allocation;
pub mod mapping;
pub mod reference;
pub mod tag;
