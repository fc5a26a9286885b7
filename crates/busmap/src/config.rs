//! Configuration types for busmap.
//!
//! All types implement [`serde::Deserialize`] with every field defaulted, so
//! a configuration file only needs to name what it changes.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration.
//! - [`DocumentConfig`] - Which elements of a document carry tag text.
//! - [`TablesConfig`] - File names of the table snapshots.
//! - [`AllocationConfig`] - Default range for new bus numbers.
//!
//! # Example
//!
//! ```
//! # use busmap::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.document().text_element(), "Text");
//! assert_eq!(config.tables().census(), "bus_count_with_tags.csv");
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use busmap_core::allocation::{AllocationError, AllocationRange};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    document: DocumentConfig,

    #[serde(default)]
    tables: TablesConfig,

    #[serde(default)]
    allocation: AllocationConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(
        document: DocumentConfig,
        tables: TablesConfig,
        allocation: AllocationConfig,
    ) -> Self {
        Self {
            document,
            tables,
            allocation,
        }
    }

    /// Returns the document configuration.
    pub fn document(&self) -> &DocumentConfig {
        &self.document
    }

    /// Returns the tables configuration.
    pub fn tables(&self) -> &TablesConfig {
        &self.tables
    }

    /// Returns the allocation configuration.
    pub fn allocation(&self) -> &AllocationConfig {
        &self.allocation
    }
}

/// Document loading configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentConfig {
    /// Name of the elements whose text content is scanned for tags.
    #[serde(default = "default_text_element")]
    text_element: String,
}

impl DocumentConfig {
    pub fn new(text_element: impl Into<String>) -> Self {
        Self {
            text_element: text_element.into(),
        }
    }

    pub fn text_element(&self) -> &str {
        &self.text_element
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            text_element: default_text_element(),
        }
    }
}

/// File names of the table snapshots.
///
/// Names are joined onto an explicit tables directory; nothing here depends
/// on the process working directory.
#[derive(Debug, Clone, Deserialize)]
pub struct TablesConfig {
    #[serde(default = "default_bus_numbers")]
    bus_numbers: String,

    #[serde(default = "default_census")]
    census: String,
}

impl TablesConfig {
    pub fn new(bus_numbers: impl Into<String>, census: impl Into<String>) -> Self {
        Self {
            bus_numbers: bus_numbers.into(),
            census: census.into(),
        }
    }

    /// File name of the bus number list.
    pub fn bus_numbers(&self) -> &str {
        &self.bus_numbers
    }

    /// File name of the bus tag census.
    pub fn census(&self) -> &str {
        &self.census
    }

    /// Path of the bus number list inside `dir`.
    pub fn bus_numbers_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.bus_numbers)
    }

    /// Path of the bus tag census inside `dir`.
    pub fn census_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.census)
    }
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            bus_numbers: default_bus_numbers(),
            census: default_census(),
        }
    }
}

/// Default allocation range. Either bound may be left out and supplied at
/// call time instead.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AllocationConfig {
    #[serde(default)]
    start: Option<u32>,

    #[serde(default)]
    end: Option<u32>,
}

impl AllocationConfig {
    pub fn new(start: Option<u32>, end: Option<u32>) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> Option<u32> {
        self.start
    }

    pub fn end(&self) -> Option<u32> {
        self.end
    }

    /// Build the allocation range, with `start` and `end` taking precedence
    /// over the configured bounds.
    ///
    /// Returns `Ok(None)` if a bound is set neither here nor by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::InvalidRange`] if the resolved start is
    /// greater than the resolved end.
    pub fn resolve(
        &self,
        start: Option<u32>,
        end: Option<u32>,
    ) -> Result<Option<AllocationRange>, AllocationError> {
        match (start.or(self.start), end.or(self.end)) {
            (Some(start), Some(end)) => AllocationRange::new(start, end).map(Some),
            _ => Ok(None),
        }
    }
}

fn default_text_element() -> String {
    "Text".to_string()
}

fn default_bus_numbers() -> String {
    "bus_list_numbers.csv".to_string()
}

fn default_census() -> String {
    "bus_count_with_tags.csv".to_string()
}
