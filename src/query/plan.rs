//! Page arithmetic: how a total result count splits into bounded pages.

use crate::PageSpan;
use crate::error::{QueryError, QueryResult};
use crate::utils::config::PAGE_SIZE_CEILING;

/// `ceil(total_size / 100)`.
pub fn pages_for(total_size: usize) -> usize {
    total_size.div_ceil(PAGE_SIZE_CEILING)
}

/// Bounds of page `index` within `total_size`, or None past the last page.
pub fn page_span(index: usize, total_size: usize) -> Option<PageSpan> {
    let start = index.checked_mul(PAGE_SIZE_CEILING)?;
    if start >= total_size {
        return None;
    }
    Some(PageSpan {
        index,
        start,
        size: PAGE_SIZE_CEILING.min(total_size - start),
    })
}

/// Every page of one run. Created per invocation and dropped with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PagePlan {
    total_size: usize,
    pages_total: usize,
}

impl PagePlan {
    pub fn new(total_size: usize) -> QueryResult<Self> {
        if total_size == 0 {
            return Err(QueryError::invalid("total size must be positive"));
        }
        Ok(Self {
            total_size,
            pages_total: pages_for(total_size),
        })
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn pages_total(&self) -> usize {
        self.pages_total
    }

    pub fn span(&self, index: usize) -> Option<PageSpan> {
        page_span(index, self.total_size)
    }

    pub fn spans(&self) -> impl Iterator<Item = PageSpan> + '_ {
        (0..self.pages_total).filter_map(|i| self.span(i))
    }
}
