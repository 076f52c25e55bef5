use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Normalized page/limit pair derived from query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + pagination.limit - 1) / pagination.limit
        };

        Self {
            items,
            total,
            page: pagination.page,
            limit: pagination.limit,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let pagination = Pagination::default();
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(pagination.offset(), 0);
    }

    #[test]
    fn test_clamping() {
        let pagination = Pagination::new(Some(0), Some(1000));
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, MAX_PAGE_SIZE);

        let pagination = Pagination::new(Some(-3), Some(0));
        assert_eq!(pagination.page, 1);
        assert_eq!(pagination.limit, 1);
    }

    #[test]
    fn test_offset() {
        assert_eq!(Pagination::new(Some(3), Some(25)).offset(), 50);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page: Paginated<u8> = Paginated::new(vec![], 41, Pagination::new(Some(1), Some(20)));
        assert_eq!(page.total_pages, 3);

        let empty: Paginated<u8> = Paginated::new(vec![], 0, Pagination::default());
        assert_eq!(empty.total_pages, 0);
    }
}
