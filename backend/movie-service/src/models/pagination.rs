//! Page arithmetic and prev/next link building shared by list endpoints.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PER_PAGE: i64 = 10;

/// Validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    /// Validate `page >= 1` and `1 <= per_page <= max_per_page`.
    pub fn new(page: Option<i64>, per_page: Option<i64>, max_per_page: i64) -> Result<Self> {
        let page = page.unwrap_or(1);
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE);
        if page < 1 {
            return Err(AppError::validation("page", "page must be greater than or equal to 1"));
        }
        if !(1..=max_per_page).contains(&per_page) {
            return Err(AppError::validation(
                "per_page",
                format!("per_page must be between 1 and {}", max_per_page),
            ));
        }
        Ok(Self { page, per_page })
    }

    /// Row offset of the first item; a page too far out to address is a 404.
    pub fn offset(&self) -> Result<i64> {
        (self.page - 1)
            .checked_mul(self.per_page)
            .ok_or_else(|| AppError::NotFound(format!("Page {} not found.", self.page)))
    }

    pub fn total_pages(&self, total_items: i64) -> i64 {
        if total_items <= 0 {
            0
        } else {
            (total_items + self.per_page - 1) / self.per_page
        }
    }

    /// 404 when the page lies past the last page.
    pub fn ensure_in_range(&self, total_items: i64) -> Result<i64> {
        let total_pages = self.total_pages(total_items);
        if self.page > total_pages {
            return Err(AppError::NotFound(format!(
                "Page {} not found. Total pages available: {}.",
                self.page, total_pages
            )));
        }
        Ok(total_pages)
    }
}

/// Page-count summary used by endpoints that do not emit links
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PageInfo {
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
}

/// Build `path?page=N&per_page=M&<params>`; empty values are skipped.
pub fn page_link(path: &str, page: i64, per_page: i64, params: &[(&str, String)]) -> String {
    let mut link = format!("{}?page={}&per_page={}", path, page, per_page);
    for (key, value) in params {
        if value.is_empty() {
            continue;
        }
        link.push('&');
        link.push_str(key);
        link.push('=');
        link.push_str(&urlencoding::encode(value));
    }
    link
}

/// Previous and next links for a page that is known to be in range.
pub fn neighbour_links(
    path: &str,
    request: PageRequest,
    total_pages: i64,
    params: &[(&str, String)],
) -> (Option<String>, Option<String>) {
    let prev = (request.page > 1)
        .then(|| page_link(path, request.page - 1, request.per_page, params));
    let next = (request.page < total_pages)
        .then(|| page_link(path, request.page + 1, request.per_page, params));
    (prev, next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let req = PageRequest::new(None, None, 20).unwrap();
        assert_eq!(req, PageRequest { page: 1, per_page: 10 });
        assert_eq!(req.offset().unwrap(), 0);
        assert_eq!(PageRequest::new(Some(3), Some(20), 20).unwrap().offset().unwrap(), 40);
    }

    #[test]
    fn unaddressable_page_is_not_found() {
        let req = PageRequest::new(Some(i64::MAX), Some(50), 50).unwrap();
        let err = req.offset().unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.message(), format!("Page {} not found.", i64::MAX));

        let req = PageRequest::new(Some(200_000_000_000_000_000), Some(50), 50).unwrap();
        assert!(req.offset().is_err());
    }

    #[test]
    fn bounds_are_enforced() {
        assert!(PageRequest::new(Some(0), None, 20).is_err());
        assert!(PageRequest::new(None, Some(21), 20).is_err());
        assert!(PageRequest::new(None, Some(0), 20).is_err());
        assert!(PageRequest::new(None, Some(50), 50).is_ok());
    }

    #[test]
    fn total_pages_rounds_up() {
        let req = PageRequest::new(Some(1), Some(10), 20).unwrap();
        assert_eq!(req.total_pages(0), 0);
        assert_eq!(req.total_pages(10), 1);
        assert_eq!(req.total_pages(11), 2);
    }

    #[test]
    fn out_of_range_page_reports_total() {
        let req = PageRequest::new(Some(3), Some(10), 20).unwrap();
        let err = req.ensure_in_range(15).unwrap_err();
        assert_eq!(err.message(), "Page 3 not found. Total pages available: 2.");
        assert_eq!(PageRequest::new(Some(2), Some(10), 20).unwrap().ensure_in_range(15).unwrap(), 2);
    }

    #[test]
    fn links_carry_filters() {
        let req = PageRequest::new(Some(2), Some(5), 20).unwrap();
        let params = [("genre", "Sci-Fi".to_string()), ("title", String::new())];
        let (prev, next) = neighbour_links("/api/v1/movies", req, 3, &params);
        assert_eq!(prev.unwrap(), "/api/v1/movies?page=1&per_page=5&genre=Sci-Fi");
        assert_eq!(next.unwrap(), "/api/v1/movies?page=3&per_page=5&genre=Sci-Fi");

        let (prev, next) = neighbour_links("/api/v1/movies", PageRequest { page: 1, per_page: 5 }, 1, &[]);
        assert!(prev.is_none());
        assert!(next.is_none());
    }

    #[test]
    fn link_values_are_encoded() {
        let link = page_link("/m", 1, 10, &[("title", "star wars&co".to_string())]);
        assert_eq!(link, "/m?page=1&per_page=10&title=star%20wars%26co");
    }
}
