use serde::Serialize;

/// A 1-based page request. Page 0 is treated as page 1.
///
/// Page numbers come straight from query strings, so they are capped to keep
/// the offset inside a signed 64-bit SQL `OFFSET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(page: u64, per_page: u64) -> Self {
        let per_page = per_page.max(1);
        let last_page = (i64::MAX as u64 / per_page).max(1);
        Self {
            page: page.clamp(1, last_page),
            per_page,
        }
    }

    /// Number of items to skip before this page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

/// One page of results plus the navigation facts a client needs.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total,
        }
    }

    /// Slice an already-sorted collection.
    pub fn from_sorted(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(request.per_page).unwrap_or(usize::MAX))
            .collect();
        Self::new(items, total, request)
    }

    pub fn has_next(&self) -> bool {
        self.page.saturating_mul(self.per_page) < self.total
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn next_page(&self) -> Option<u64> {
        self.has_next().then_some(self.page + 1)
    }

    pub fn prev_page(&self) -> Option<u64> {
        self.has_prev().then_some(self.page - 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_zero_is_first_page() {
        let req = PageRequest::new(0, 10);
        assert_eq!(req.page, 1);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn navigation_flags() {
        let page = Page::from_sorted((1..=25).collect::<Vec<_>>(), PageRequest::new(2, 10));

        assert_eq!(page.items, (11..=20).collect::<Vec<_>>());
        assert_eq!(page.next_page(), Some(3));
        assert_eq!(page.prev_page(), Some(1));

        let last = Page::from_sorted((1..=25).collect::<Vec<_>>(), PageRequest::new(3, 10));
        assert_eq!(last.items.len(), 5);
        assert!(!last.has_next());
    }

    #[test]
    fn huge_page_numbers_do_not_overflow() {
        let req = PageRequest::new(u64::MAX, 10);
        assert_eq!(req.offset(), req.page.saturating_sub(1) * 10);
        assert!(req.offset() <= i64::MAX as u64);

        let page = Page::from_sorted(vec![1, 2, 3], req);
        assert!(page.items.is_empty());
        assert!(!page.has_next());
        assert!(page.has_prev());

        let raw = Page::<u8>::new(
            Vec::new(),
            5,
            PageRequest {
                page: u64::MAX,
                per_page: u64::MAX,
            },
        );
        assert!(!raw.has_next());
        assert_eq!(raw.next_page(), None);
    }

    #[test]
    fn past_the_end_is_empty() {
        let page = Page::from_sorted(vec![1, 2, 3], PageRequest::new(5, 2));
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
        assert!(!page.has_next());
    }
}
