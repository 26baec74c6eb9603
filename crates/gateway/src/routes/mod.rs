//! HTTP route handlers.

pub mod cars;
pub mod health;
pub mod metrics;
pub mod rentals;

use serde::Deserialize;

/// Pagination query shared by the list endpoints.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<u64>,
    size: Option<u64>,
}

impl PageQuery {
    const DEFAULT_SIZE: u64 = 10;
    const MAX_SIZE: u64 = 100;

    /// 1-based page number.
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size, clamped to a sane maximum.
    pub fn size(&self) -> u64 {
        self.size
            .unwrap_or(Self::DEFAULT_SIZE)
            .clamp(1, Self::MAX_SIZE)
    }

    /// Backend offset derived from page and size.
    pub fn offset(&self) -> u64 {
        (self.page() - 1) * self.size()
    }
}
