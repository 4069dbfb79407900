//! Pagination query parameters.

use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};

use crate::application::page::PER_PAGE;

/// Page number query parameter.
///
/// Uses `serde_with` to parse the page number from the query string, which
/// also keeps it working under `#[serde(flatten)]`.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<u32>,
}

impl PageParams {
    /// Validates the page number and returns it with the fixed page size.
    ///
    /// Defaults to page 1. Page 0 is rejected.
    pub fn validate_and_get_page(&self) -> Result<(i64, i64), String> {
        let page = self.page.unwrap_or(1);

        if page == 0 {
            return Err("Page must be greater than 0".to_string());
        }

        Ok((page as i64, PER_PAGE))
    }
}
