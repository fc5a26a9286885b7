//! Allocation ranges and the used-number table.
//!
//! An [`AllocationRange`] is the inclusive interval of bus numbers a session
//! may hand out. The [`AllocationTable`] records which numbers in that range
//! are already spoken for and hands out the smallest free one on request.
//! Numbers outside the range are ignored entirely.

use std::{collections::BTreeSet, fmt};

use log::trace;
use thiserror::Error;

/// Errors raised while allocating bus numbers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("no unallocated bus number left in range {0}")]
    Exhausted(AllocationRange),

    #[error("invalid allocation range: start {start} is greater than end {end}")]
    InvalidRange { start: u32, end: u32 },
}

/// Inclusive range of bus numbers available for allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationRange {
    start: u32,
    end: u32,
}

impl AllocationRange {
    /// Create the range `start..=end`.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::InvalidRange`] if `start > end`.
    pub fn new(start: u32, end: u32) -> Result<Self, AllocationError> {
        if start > end {
            return Err(AllocationError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Returns the first number of the range.
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Returns the last number of the range.
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Returns `true` if `number` lies inside the range.
    pub fn contains(&self, number: u32) -> bool {
        (self.start..=self.end).contains(&number)
    }

    /// Returns how many numbers the range holds.
    pub fn len(&self) -> u64 {
        u64::from(self.end - self.start) + 1
    }

    /// Always `false`: a valid range holds at least one number.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for AllocationRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Which numbers of an [`AllocationRange`] are already used.
#[derive(Debug, Clone)]
pub struct AllocationTable {
    range: AllocationRange,
    used: BTreeSet<u32>,
}

impl AllocationTable {
    /// Create a table for `range` with every number free.
    pub fn new(range: AllocationRange) -> Self {
        Self {
            range,
            used: BTreeSet::new(),
        }
    }

    /// Create a table with every in-range number of `numbers` marked used.
    pub fn seeded(range: AllocationRange, numbers: impl IntoIterator<Item = u32>) -> Self {
        let mut table = Self::new(range);
        for number in numbers {
            table.mark_used(number);
        }
        table
    }

    /// Returns the range this table covers.
    pub fn range(&self) -> AllocationRange {
        self.range
    }

    /// Returns `true` if `number` is in range and marked used.
    pub fn is_used(&self, number: u32) -> bool {
        self.used.contains(&number)
    }

    /// Mark `number` as used. Out-of-range numbers are ignored.
    pub fn mark_used(&mut self, number: u32) {
        if self.range.contains(number) {
            self.used.insert(number);
        }
    }

    /// Returns the number of free numbers left in the range.
    pub fn free_count(&self) -> u64 {
        self.range.len() - self.used.len() as u64
    }

    /// Returns the smallest free number, scanning the range upwards.
    pub fn first_free(&self) -> Option<u32> {
        let mut candidate = self.range.start;
        for &used in self.used.range(self.range.start..=self.range.end) {
            if used != candidate {
                break;
            }
            if candidate == self.range.end {
                return None;
            }
            candidate += 1;
        }
        Some(candidate)
    }

    /// Take the smallest free number and mark it used.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::Exhausted`] if every number is used.
    pub fn allocate(&mut self) -> Result<u32, AllocationError> {
        let number = self
            .first_free()
            .ok_or(AllocationError::Exhausted(self.range))?;
        self.used.insert(number);
        trace!(number; "Allocated bus number");
        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_invalid_range() {
        assert_eq!(
            AllocationRange::new(5, 4),
            Err(AllocationError::InvalidRange { start: 5, end: 4 })
        );
        assert!(AllocationRange::new(4, 4).is_ok());
    }

    #[test]
    fn test_range_len_and_display() {
        let range = AllocationRange::new(1, 10).unwrap();
        assert_eq!(range.len(), 10);
        assert_eq!(range.to_string(), "[1, 10]");

        let full = AllocationRange::new(0, u32::MAX).unwrap();
        assert_eq!(full.len(), u64::from(u32::MAX) + 1);
    }

    #[test]
    fn test_seed_ignores_out_of_range() {
        let range = AllocationRange::new(10, 20).unwrap();
        let table = AllocationTable::seeded(range, [3, 10, 15, 99]);

        assert!(table.is_used(10));
        assert!(table.is_used(15));
        assert!(!table.is_used(3));
        assert!(!table.is_used(99));
        assert_eq!(table.free_count(), 9);
    }

    #[test]
    fn test_allocate_smallest_free() {
        let range = AllocationRange::new(1, 5).unwrap();
        let mut table = AllocationTable::seeded(range, [1, 2, 4]);

        assert_eq!(table.allocate(), Ok(3));
        assert_eq!(table.allocate(), Ok(5));
        assert_eq!(table.allocate(), Err(AllocationError::Exhausted(range)));
    }

    #[test]
    fn test_allocate_at_top_of_u32() {
        let range = AllocationRange::new(u32::MAX - 1, u32::MAX).unwrap();
        let mut table = AllocationTable::seeded(range, [u32::MAX - 1]);

        assert_eq!(table.allocate(), Ok(u32::MAX));
        assert!(table.first_free().is_none());
    }

    proptest! {
        #[test]
        fn allocate_never_reuses(
            start in 0u32..50,
            width in 0u32..50,
            seed in proptest::collection::vec(0u32..120, 0..40),
        ) {
            let range = AllocationRange::new(start, start + width).unwrap();
            let mut table = AllocationTable::seeded(range, seed.iter().copied());
            let free = table.free_count();

            for _ in 0..free {
                let number = table.allocate().unwrap();
                prop_assert!(range.contains(number));
                prop_assert!(!seed.contains(&number));
            }
            prop_assert_eq!(table.allocate(), Err(AllocationError::Exhausted(range)));
        }
    }
}
