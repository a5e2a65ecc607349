//! This module defines the common functionality for paging data.

/// The config for pagination.
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The maximum rows to return per page when not specified in a request.
    pub default_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 20,
        }
    }
}

impl PaginationConfig {
    /// Clamp a requested page number, falling back to the default page when
    /// the request is non-positive.
    pub fn clamp_page(&self, page: i64) -> u64 {
        if page < 1 {
            self.default_page
        } else {
            page as u64
        }
    }

    /// Clamp a requested page size, falling back to the default page size
    /// when the request is non-positive.
    pub fn clamp_limit(&self, limit: i64) -> u64 {
        if limit < 1 {
            self.default_page_size
        } else {
            limit as u64
        }
    }
}
