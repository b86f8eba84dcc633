//! Pagination and sorting for identity listings

use crate::domain::{ClinicError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// Sortable identity columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSortField {
    #[default]
    #[serde(alias = "firstName")]
    FirstName,
    #[serde(alias = "lastName")]
    LastName,
    Username,
    Email,
    #[serde(alias = "createdAt")]
    CreatedAt,
}

impl UserSortField {
    /// Column name in the `users` table
    pub fn column(&self) -> &'static str {
        match self {
            UserSortField::FirstName => "first_name",
            UserSortField::LastName => "last_name",
            UserSortField::Username => "username",
            UserSortField::Email => "email",
            UserSortField::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    #[serde(alias = "ASC")]
    Asc,
    #[serde(alias = "DESC")]
    Desc,
}

impl SortDirection {
    pub fn sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Zero-based page request; size is clamped to 1..=MAX_PAGE_SIZE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_size")]
    pub size: usize,
    #[serde(default)]
    pub sort_by: UserSortField,
    #[serde(default)]
    pub direction: SortDirection,
}

fn default_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort_by: UserSortField::default(),
            direction: SortDirection::default(),
        }
    }
}

impl PageRequest {
    pub fn normalized(self) -> Self {
        Self {
            size: self.size.clamp(1, MAX_PAGE_SIZE),
            ..self
        }
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }

    /// `LIMIT` and `OFFSET` as SQL `BIGINT` values
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` when the page lies beyond what a `BIGINT`
    /// offset can address
    pub fn sql_window(&self) -> Result<(i64, i64)> {
        let limit = i64::try_from(self.size)
            .map_err(|_| ClinicError::invalid(format!("Page size {} is out of range", self.size)))?;
        let offset = i64::try_from(self.offset())
            .map_err(|_| ClinicError::invalid(format!("Page {} is out of range", self.page)))?;
        Ok((limit, offset))
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: usize,
    pub size: usize,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        let size = request.size.max(1) as u64;
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages: total_elements.div_ceil(size),
        }
    }
}
