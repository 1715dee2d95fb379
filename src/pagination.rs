//! Page bookkeeping for the ticket table.

/// Rows per page in the ticket table
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    current_page: u32,
    page_size: u32,
    total_count: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    /// A zero page size is treated as one row per page.
    pub fn new(page_size: u32) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            total_count: 0,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    /// `ceil(total / page_size)`, zero for an empty result
    pub fn total_pages(&self) -> u32 {
        let pages = self.total_count.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Move to `page` if it lies in `[1, total_pages]`.
    ///
    /// Returns `true` only when the current page actually changed.
    pub fn go_to(&mut self, page: u32) -> bool {
        if page < 1 || page > self.total_pages() || page == self.current_page {
            return false;
        }
        self.current_page = page;
        true
    }

    pub fn next(&mut self) -> bool {
        self.go_to(self.current_page.saturating_add(1))
    }

    pub fn prev(&mut self) -> bool {
        self.go_to(self.current_page.saturating_sub(1))
    }

    /// Back to page 1 (filter commits)
    pub fn reset(&mut self) -> bool {
        let changed = self.current_page != 1;
        self.current_page = 1;
        changed
    }

    /// Record a new filtered total and clamp the current page into range.
    ///
    /// Returns `true` if the current page had to move.
    pub fn set_total(&mut self, total_count: u64) -> bool {
        self.total_count = total_count;
        let max_page = self.total_pages().max(1);
        if self.current_page > max_page {
            self.current_page = max_page;
            return true;
        }
        false
    }

    /// 1-based inclusive range of rows shown, `None` for an empty result
    pub fn visible_range(&self) -> Option<(u64, u64)> {
        if self.total_count == 0 {
            return None;
        }
        let size = u64::from(self.page_size);
        let start = u64::from(self.current_page - 1) * size + 1;
        let end = (start + size - 1).min(self.total_count);
        Some((start, end))
    }
}
