//! Offset pagination for catalog listings.

use serde::{Deserialize, Serialize};

/// Default number of rows per page.
const DEFAULT_LIMIT: u64 = 10;
/// Maximum number of rows per page.
const MAX_LIMIT: u64 = 100;

/// Limit/offset window over a newest-first listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Maximum number of rows to return.
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Number of rows to skip.
    #[serde(default)]
    pub offset: u64,
}

impl PageRequest {
    /// Create a page request, clamping the limit to `1..=100`.
    pub fn new(limit: u64, offset: u64) -> Self {
        Self {
            limit: limit.clamp(1, MAX_LIMIT),
            offset,
        }
    }

    /// Parse loosely typed query values, falling back to defaults the way
    /// the catalog endpoints always have: anything unparsable or zero means
    /// "use the default".
    pub fn from_query(limit: Option<&str>, offset: Option<&str>) -> Self {
        let limit = limit
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_LIMIT);
        let offset = offset
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);
        Self::new(limit, offset)
    }

    /// The SQL `LIMIT` value.
    pub fn sql_limit(&self) -> i64 {
        self.limit as i64
    }

    /// The SQL `OFFSET` value.
    pub fn sql_offset(&self) -> i64 {
        self.offset.min(i64::MAX as u64) as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// A page of results plus the total row count of the unpaged query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T: Serialize> {
    /// The rows on this page.
    pub items: Vec<T>,
    /// Total rows matching the query.
    pub total: u64,
    /// Limit used for this page.
    pub limit: u64,
    /// Offset used for this page.
    pub offset: u64,
    /// Whether rows remain after this page.
    pub has_more: bool,
}

impl<T: Serialize> PageResponse<T> {
    /// Build a response for `page` out of `total` matching rows.
    pub fn new(items: Vec<T>, page: &PageRequest, total: u64) -> Self {
        let has_more = page.offset.saturating_add(items.len() as u64) < total;
        Self {
            items,
            total,
            limit: page.limit,
            offset: page.offset,
            has_more,
        }
    }
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}
