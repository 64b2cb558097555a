//! Page specifications.

use crate::error::VaultQueryError;
use serde::{Deserialize, Serialize};

/// Page number meaning "not specified".
///
/// Never a valid page. It keeps an unpaged query, which fails fast above
/// [`DEFAULT_PAGE_SIZE`] matches, apart from an explicit request for page 1
/// of 200, which returns the first 200 matches however many there are.
pub const DEFAULT_PAGE_NUM: i32 = -1;

/// Page size of an unspecified page, and the most results such a query may
/// match.
pub const DEFAULT_PAGE_SIZE: i32 = 200;

/// Largest explicit page size. Explicit pages are unbounded in practice; only
/// unpaged queries carry the [`DEFAULT_PAGE_SIZE`] limit.
pub const MAX_PAGE_SIZE: i32 = i32::MAX - 1;

/// Which page of results to return. Page numbers start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpecification {
    pub page_number: i32,
    pub page_size: i32,
}

impl Default for PageSpecification {
    fn default() -> Self {
        Self {
            page_number: DEFAULT_PAGE_NUM,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageSpecification {
    pub fn new(page_number: i32, page_size: i32) -> Self {
        Self {
            page_number,
            page_size,
        }
    }

    /// True when the caller did not ask for paging.
    pub fn is_default(&self) -> bool {
        self.page_number == DEFAULT_PAGE_NUM && self.page_size == DEFAULT_PAGE_SIZE
    }

    pub fn validate(&self) -> Result<(), VaultQueryError> {
        if self.is_default() {
            return Ok(());
        }
        if self.page_number < 1 {
            return Err(VaultQueryError::InvalidPaging {
                reason: format!("invalid page number {}", self.page_number),
            });
        }
        if self.page_size < 1 || self.page_size > MAX_PAGE_SIZE {
            return Err(VaultQueryError::InvalidPaging {
                reason: format!(
                    "page size {} must be between 1 and {MAX_PAGE_SIZE}",
                    self.page_size
                ),
            });
        }
        Ok(())
    }

    /// Offset of the first result on this page.
    pub fn first_result(&self) -> usize {
        let offset = (i64::from(self.page_number) - 1) * i64::from(self.page_size);
        usize::try_from(offset.max(0)).unwrap_or(usize::MAX)
    }

    /// Slices the matching results for this page.
    ///
    /// An unspecified page returns everything, or `TooManyResults` when more
    /// than [`DEFAULT_PAGE_SIZE`] results matched.
    pub fn select<T>(&self, results: Vec<T>) -> Result<Vec<T>, VaultQueryError> {
        self.validate()?;
        let limit = DEFAULT_PAGE_SIZE as usize;
        if self.is_default() {
            if results.len() > limit {
                return Err(VaultQueryError::TooManyResults {
                    count: results.len(),
                    limit,
                });
            }
            return Ok(results);
        }
        Ok(results
            .into_iter()
            .skip(self.first_result())
            .take(self.page_size as usize)
            .collect())
    }
}
