//! Fixed buffer pool of pre-allocated pages.
//!
//! The pool is a plain page array: the owning executor decides what lives in
//! each slot and addresses pages by index. There is no page table, no
//! pinning, and no replacement policy — BNLJ, the only client, partitions
//! the pool statically into an outer block window and one inner page.

use std::fmt;

use crate::page::Page;

/// Index past the end of the pool's page array.
#[derive(Debug)]
pub struct OutOfRange {
    /// The requested index.
    pub index: usize,
    /// The pool's page count.
    pub count: usize,
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "buffer index {} out of range for pool of {} pages",
            self.index, self.count
        )
    }
}

impl std::error::Error for OutOfRange {}

/// A fixed array of pages, allocated once at construction.
pub struct BufferPool {
    pages: Vec<Page>,
    page_size: usize,
}

impl BufferPool {
    /// Allocates `count` pages of `page_size` bytes each.
    ///
    /// # Panics
    ///
    /// Panics if `count` is 0.
    pub fn new(count: usize, page_size: usize) -> Self {
        assert!(count > 0, "buffer pool must hold at least one page");
        Self {
            pages: (0..count).map(|_| Page::new(page_size)).collect(),
            page_size,
        }
    }

    /// Returns the number of pages in the pool.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Returns the total bytes held by the pool's pages.
    pub fn memory_usage(&self) -> usize {
        self.pages.len() * self.page_size
    }

    /// Returns the page at `index`.
    pub fn page(&self, index: usize) -> Result<&Page, OutOfRange> {
        self.pages.get(index).ok_or(OutOfRange {
            index,
            count: self.pages.len(),
        })
    }

    /// Returns the page at `index` mutably.
    pub fn page_mut(&mut self, index: usize) -> Result<&mut Page, OutOfRange> {
        let count = self.pages.len();
        self.pages.get_mut(index).ok_or(OutOfRange { index, count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Record;

    #[test]
    fn test_pool_allocation() {
        let pool = BufferPool::new(10, 4096);
        assert_eq!(pool.page_count(), 10);
        assert_eq!(pool.memory_usage(), 10 * 4096);
    }

    #[test]
    fn test_pages_are_independent() {
        let mut pool = BufferPool::new(2, 4096);
        pool.page_mut(0)
            .unwrap()
            .append(&Record::new(vec!["a".to_string()]));

        assert_eq!(pool.page(0).unwrap().record_count(), 1);
        assert!(pool.page(1).unwrap().is_empty());
    }

    #[test]
    fn test_out_of_range() {
        let pool = BufferPool::new(2, 4096);
        let err = pool.page(2).unwrap_err();
        assert_eq!(err.index, 2);
        assert_eq!(err.count, 2);
    }
}
