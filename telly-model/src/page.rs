use serde::{Deserialize, Serialize};

/// Items per page for locally served listings.
pub const PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub page: u32,
    pub results: Vec<T>,
    pub total_pages: u32,
    pub total_results: u64,
}

impl<T> Page<T> {
    /// Number of pages needed for `total` items.
    pub fn page_count(total: u64) -> u32 {
        total.div_ceil(u64::from(PAGE_SIZE)) as u32
    }

    pub fn offset(page: u32) -> u64 {
        u64::from(page.saturating_sub(1)) * u64::from(PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(Page::<()>::page_count(0), 0);
        assert_eq!(Page::<()>::page_count(1), 1);
        assert_eq!(Page::<()>::page_count(20), 1);
        assert_eq!(Page::<()>::page_count(21), 2);
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(Page::<()>::offset(1), 0);
        assert_eq!(Page::<()>::offset(3), 40);
    }
}
