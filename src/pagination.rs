//! Page request normalisation and the paged response envelope shared by the
//! blog and news listings.

use std::num::IntErrorKind;

use serde::{Deserialize, Deserializer, Serialize};

/// Hard upper bound on items per page, whatever the caller asks for.
pub const MAX_PAGE_SIZE: usize = 50;

/// A normalised page request: `page >= 1`, `1 <= limit <= MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl PageRequest {
    /// Normalise raw query values. Missing or zero `page` becomes 1; missing
    /// `limit` falls back to `default_limit`.
    pub fn new(page: Option<usize>, limit: Option<usize>, default_limit: usize) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Read a raw `page`/`limit` query value. Negative numbers become 0 (and
/// are then clamped by [`PageRequest::new`]), numbers too large saturate, and
/// anything unparseable is treated as absent.
pub fn parse_count(raw: &str) -> Option<usize> {
    match raw.trim().parse::<i64>() {
        Ok(n) => Some(usize::try_from(n).unwrap_or(0)),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Some(usize::MAX),
            IntErrorKind::NegOverflow => Some(0),
            _ => None,
        },
    }
}

/// `#[serde(deserialize_with)]` adapter over [`parse_count`], so a bad
/// query value never fails extraction.
pub fn lenient_count<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_count))
}

/// Same idea for boolean flags: `true`/`false`/`1`/`0`, anything else is absent.
pub fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(str::trim).and_then(|v| match v.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }))
}

/// One page of results plus the totals a client needs to render pagination.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, req: PageRequest, total: usize) -> Self {
        let total_pages = total.div_ceil(req.limit);
        Self {
            items,
            page: req.page,
            limit: req.limit,
            total,
            total_pages,
            has_more: req.page < total_pages,
        }
    }

    /// Slice an in-memory, already-ordered result set.
    pub fn from_slice(all: &[T], req: PageRequest) -> Self
    where
        T: Clone,
    {
        let items = all
            .iter()
            .skip(req.offset())
            .take(req.limit)
            .cloned()
            .collect();
        Self::new(items, req, all.len())
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            total_pages: self.total_pages,
            has_more: self.has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamps() {
        assert_eq!(PageRequest::new(None, None, 12), PageRequest { page: 1, limit: 12 });
        assert_eq!(PageRequest::new(Some(0), Some(0), 12), PageRequest { page: 1, limit: 1 });
        assert_eq!(PageRequest::new(Some(3), Some(500), 12).limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn raw_counts_are_forgiving() {
        assert_eq!(parse_count("3"), Some(3));
        assert_eq!(parse_count(" 7 "), Some(7));
        assert_eq!(parse_count("-1"), Some(0));
        assert_eq!(parse_count("abc"), None);
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("99999999999999999999999"), Some(usize::MAX));
        assert_eq!(parse_count("-99999999999999999999999"), Some(0));

        let req = PageRequest::new(parse_count("-1"), parse_count("abc"), 12);
        assert_eq!(req, PageRequest { page: 1, limit: 12 });
    }

    #[test]
    fn totals_round_up() {
        let req = PageRequest::new(Some(1), Some(10), 10);
        let page = Page::new(vec![1; 10], req, 21);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_more);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let page: Page<u8> = Page::new(Vec::new(), PageRequest::new(None, None, 5), 0);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_more);
    }

    #[test]
    fn slice_past_end_is_empty_with_totals() {
        let all: Vec<u32> = (0..7).collect();
        let page = Page::from_slice(&all, PageRequest::new(Some(4), Some(3), 3));
        assert!(page.items.is_empty());
        assert_eq!(page.total, 7);
        assert_eq!(page.total_pages, 3);
        assert!(!page.has_more);
    }

    #[test]
    fn slice_last_page_is_partial() {
        let all: Vec<u32> = (0..7).collect();
        let page = Page::from_slice(&all, PageRequest::new(Some(3), Some(3), 3));
        assert_eq!(page.items, vec![6]);
        assert!(!page.has_more);
    }
}
