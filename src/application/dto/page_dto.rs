//! Pagination DTOs.

use crate::domain::ports::DEFAULT_PAGE_LIMIT;

/// A request for one page of the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number, starting at 1.
    pub page: u32,
    /// Number of photos per page.
    pub limit: u32,
}

impl PageRequest {
    /// Creates new page request with the default limit.
    #[must_use]
    pub const fn new(page: u32) -> Self {
        Self {
            page,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }

    /// Sets the page size.
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// What applying a page result did to the gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// New photos were merged in.
    Merged {
        /// Photos that were not already present.
        added: usize,
        /// Gallery size after the merge.
        total: usize,
    },
    /// The source returned an empty page.
    Exhausted,
    /// The fetch failed; the message is now the gallery error.
    Failed(String),
}

impl std::fmt::Display for PageOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merged { added, total } => write!(f, "merged {added} ({total} total)"),
            Self::Exhausted => write!(f, "exhausted"),
            Self::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}
