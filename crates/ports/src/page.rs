//! Paginated backend responses.

use serde::{Deserialize, Serialize};

/// One page of a backend collection plus the collection's total size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_elements: u64,
}

impl<T> Page<T> {
    /// An empty page of an empty collection.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_elements: 0,
        }
    }
}
