use thiserror::Error;

/// Rows shown per results page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A 1-indexed window over a sequence of rows.
#[derive(Debug, PartialEq)]
pub struct Page<'a, T> {
    /// 1-based page number.
    pub index: usize,
    pub total_pages: usize,
    pub rows: &'a [T],
}

impl<T> Page<'_, T> {
    pub fn has_previous(&self) -> bool {
        self.index > 1
    }

    pub fn has_next(&self) -> bool {
        self.index < self.total_pages
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("Page {requested} is outside 1..={total_pages}")]
    OutOfRange { requested: usize, total_pages: usize },
    #[error("Page size must be at least 1")]
    ZeroPageSize,
}

/// Number of pages needed for `len` rows; zero when there are no rows.
pub fn total_pages(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// Return page `page_index` (1-based) of `rows`.
///
/// Any index outside `1..=total_pages` is rejected, which also makes every
/// page of an empty sequence invalid.
pub fn paginate<T>(
    rows: &[T],
    page_index: usize,
    page_size: usize,
) -> Result<Page<'_, T>, PageError> {
    if page_size == 0 {
        return Err(PageError::ZeroPageSize);
    }
    let total = total_pages(rows.len(), page_size);
    if page_index == 0 || page_index > total {
        return Err(PageError::OutOfRange {
            requested: page_index,
            total_pages: total,
        });
    }
    let start = (page_index - 1) * page_size;
    let end = (start + page_size).min(rows.len());
    Ok(Page {
        index: page_index,
        total_pages: total,
        rows: &rows[start..end],
    })
}
