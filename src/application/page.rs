//! Simple pagination without a total count.

use serde::Serialize;

/// Items per page of public listings.
pub const PER_PAGE: i64 = 20;

/// One page of results plus whether a next page exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Builds a page from a query that fetched `per_page + 1` rows.
    pub fn from_overfetch(mut items: Vec<T>, page: i64, per_page: i64) -> Self {
        let has_more = items.len() as i64 > per_page;
        items.truncate(per_page.max(0) as usize);

        Self {
            items,
            page,
            per_page,
            has_more,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            has_more: self.has_more,
        }
    }
}

/// Offset of a 1-based page number. Pages below 1 are treated as 1.
pub fn offset_of(page: i64, per_page: i64) -> i64 {
    (page.max(1) - 1) * per_page
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overfetch_sets_has_more() {
        let page = Page::from_overfetch(vec![1, 2, 3], 1, 2);

        assert_eq!(page.items, vec![1, 2]);
        assert!(page.has_more);
    }

    #[test]
    fn test_last_page_has_no_more() {
        let page = Page::from_overfetch(vec![1, 2], 3, 2);

        assert_eq!(page.items.len(), 2);
        assert!(!page.has_more);
    }

    #[test]
    fn test_offset_of() {
        assert_eq!(offset_of(1, 20), 0);
        assert_eq!(offset_of(3, 20), 40);
        assert_eq!(offset_of(0, 20), 0);
        assert_eq!(offset_of(-4, 20), 0);
    }
}
