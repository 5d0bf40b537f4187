use serde::Serialize;

/// One page of a list. Out-of-range page numbers are clamped to the nearest valid page.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub num_pages: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub num_pages: i64,
    pub limit: i64,
    pub offset: i64,
}

impl PageWindow {
    pub fn new(requested: Option<i64>, per_page: i64, total: i64) -> Self {
        let per_page = per_page.max(1);
        let num_pages = ((total + per_page - 1) / per_page).max(1);
        let page = requested.unwrap_or(1).clamp(1, num_pages);
        Self {
            page,
            num_pages,
            limit: per_page,
            offset: (page - 1) * per_page,
        }
    }

    pub fn into_page<T>(self, items: Vec<T>, total: i64) -> Page<T> {
        Page {
            items,
            page: self.page,
            per_page: self.limit,
            total,
            num_pages: self.num_pages,
            has_next: self.page < self.num_pages,
            has_previous: self.page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_has_one_page() {
        let window = PageWindow::new(Some(3), 10, 0);
        assert_eq!(window.page, 1);
        assert_eq!(window.num_pages, 1);
        assert_eq!(window.offset, 0);
    }

    #[test]
    fn test_page_clamped_into_range() {
        let window = PageWindow::new(Some(99), 10, 25);
        assert_eq!(window.page, 3);
        assert_eq!(window.offset, 20);

        let window = PageWindow::new(Some(-4), 10, 25);
        assert_eq!(window.page, 1);

        let page = PageWindow::new(Some(2), 10, 25).into_page(vec![1, 2], 25);
        assert!(page.has_next && page.has_previous);
    }
}
