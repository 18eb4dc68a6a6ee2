use serde::{Deserialize, Serialize};

use crate::constants::RECIPE_COUNT_PER_PAGE;

/// Offset/limit pagination parameters as they arrive in the query string.
/// `limit` overrides the default page size.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub offset: i64,
    pub limit: Option<i64>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: None,
        }
    }
}

impl PageRequest {
    pub fn page_size(&self) -> i64 {
        self.limit
            .filter(|limit| *limit > 0)
            .unwrap_or(RECIPE_COUNT_PER_PAGE)
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PageContext<T> {
    pub rows: Vec<T>,
    pub total_rows: i64,
    pub next_offset: Option<i64>,
    pub prev_offset: Option<i64>,
}

impl<T> PageContext<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, page_size: i64, current_offset: i64) -> Self {
        if rows.is_empty() {
            return Self::no_rows();
        }

        let next_offset = current_offset + page_size;
        let next_offset = (next_offset < total_rows).then_some(next_offset);
        let prev_offset = (current_offset > 0).then_some((current_offset - page_size).max(0));

        Self {
            rows,
            total_rows,
            next_offset,
            prev_offset,
        }
    }

    pub fn no_rows() -> Self {
        Self {
            rows: vec![],
            total_rows: 0,
            next_offset: None,
            prev_offset: None,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageContext<U> {
        PageContext {
            rows: self.rows.into_iter().map(f).collect(),
            total_rows: self.total_rows,
            next_offset: self.next_offset,
            prev_offset: self.prev_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_page_size_is_six() {
        assert_eq!(PageRequest::default().page_size(), 6);
    }

    #[test]
    fn limit_overrides_page_size() {
        let request = PageRequest {
            offset: 0,
            limit: Some(20),
        };
        assert_eq!(request.page_size(), 20);
    }

    #[test]
    fn non_positive_limit_falls_back_to_default() {
        let request = PageRequest {
            offset: 0,
            limit: Some(0),
        };
        assert_eq!(request.page_size(), 6);
    }

    #[test]
    fn middle_page_links_both_ways() {
        let page = PageContext::from_rows(vec![1, 2, 3], 9, 3, 3);
        assert_eq!(page.next_offset, Some(6));
        assert_eq!(page.prev_offset, Some(0));
    }

    #[test]
    fn last_page_has_no_next() {
        let page = PageContext::from_rows(vec![1, 2, 3], 9, 3, 6);
        assert_eq!(page.next_offset, None);
        assert_eq!(page.prev_offset, Some(3));
    }

    #[test]
    fn empty_result_collapses() {
        let page: PageContext<i32> = PageContext::from_rows(vec![], 0, 3, 0);
        assert_eq!(page.total_rows, 0);
        assert_eq!(page.next_offset, None);
    }
}
