//! Page slicing and storage windows
//!
//! Pages are 1-based; page 0 is treated as the first page.

use serde::{Deserialize, Serialize};

/// One page of a larger result set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedCollection<T> {
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub records: Vec<T>,
}

/// Offset/limit handed to the storage layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub skip: usize,
    pub take: usize,
}

/// Storage window for a page
pub fn db_window(page: usize, per_page: usize) -> Window {
    Window {
        skip: page.max(1).saturating_sub(1).saturating_mul(per_page),
        take: per_page,
    }
}

/// Slice an in-memory collection down to one page
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> PaginatedCollection<T> {
    let total = items.len();
    let Window { skip, take } = db_window(page, per_page);
    let records = items.into_iter().skip(skip).take(take).collect();

    PaginatedCollection {
        total,
        page,
        per_page,
        records,
    }
}

/// Wrap records that were already windowed by the store
pub fn paginate_serialize<T>(
    records: Vec<T>,
    total: usize,
    page: usize,
    per_page: usize,
) -> PaginatedCollection<T> {
    PaginatedCollection {
        total,
        page,
        per_page,
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_slices_requested_page() {
        let page = paginate((1..=25).collect::<Vec<_>>(), 2, 10);
        assert_eq!(page.total, 25);
        assert_eq!(page.records, (11..=20).collect::<Vec<_>>());

        let last = paginate((1..=25).collect::<Vec<_>>(), 3, 10);
        assert_eq!(last.records, vec![21, 22, 23, 24, 25]);
    }

    #[test]
    fn test_paginate_past_end_is_empty() {
        let page = paginate(vec![1, 2, 3], 5, 10);
        assert_eq!(page.total, 3);
        assert!(page.records.is_empty());
    }

    #[test]
    fn test_page_zero_is_first_page() {
        assert_eq!(db_window(0, 20), Window { skip: 0, take: 20 });
        assert_eq!(db_window(1, 20), Window { skip: 0, take: 20 });
        assert_eq!(db_window(3, 20), Window { skip: 40, take: 20 });
    }

    #[test]
    fn test_paginate_serialize_keeps_records_and_total() {
        let page = paginate_serialize(vec!["a", "b"], 42, 4, 2);
        assert_eq!(page.total, 42);
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.page, 4);
    }
}
