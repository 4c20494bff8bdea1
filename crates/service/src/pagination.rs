//! Pagination utilities for service layer
//!
//! Turns raw `page`/`size`/`sort` query values into a normalized `PageRequest`.
//! Pages are 0-based. Sort values follow the `property[,property...][,asc|desc]`
//! form and may be repeated to sort by several keys.

use crate::errors::ServiceError;

/// Properties a cash card listing can be sorted by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
    Id,
    Amount,
    Owner,
}

impl SortField {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Some(SortField::Id),
            "amount" => Some(SortField::Amount),
            "owner" => Some(SortField::Owner),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Direction::Asc),
            "desc" => Some(Direction::Desc),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Order {
    pub field: SortField,
    pub direction: Direction,
}

impl Order {
    pub fn asc(field: SortField) -> Self { Self { field, direction: Direction::Asc } }
    pub fn desc(field: SortField) -> Self { Self { field, direction: Direction::Desc } }
}

/// Ordered list of sort keys; empty means "unsorted".
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub fn by(orders: Vec<Order>) -> Self { Self { orders } }

    pub fn unsorted() -> Self { Self::default() }

    pub fn is_unsorted(&self) -> bool { self.orders.is_empty() }

    pub fn orders(&self) -> &[Order] { &self.orders }

    /// Keep this sort if it has any keys, otherwise use `fallback`.
    pub fn or(self, fallback: Sort) -> Sort {
        if self.is_unsorted() { fallback } else { self }
    }

    /// Parse repeated `sort` query values.
    ///
    /// `amount` sorts ascending, `amount,desc` descending, and
    /// `owner,amount,desc` applies one direction to several properties.
    /// Blank values are skipped; unknown properties are a validation error.
    pub fn parse<S: AsRef<str>>(params: &[S]) -> Result<Sort, ServiceError> {
        let mut orders = Vec::new();
        for raw in params {
            let mut tokens: Vec<&str> = raw.as_ref().split(',').map(str::trim).filter(|t| !t.is_empty()).collect();
            if tokens.is_empty() {
                continue;
            }
            let mut direction = Direction::Asc;
            if tokens.len() > 1 {
                if let Some(d) = tokens.last().and_then(|t| Direction::parse(t)) {
                    direction = d;
                    tokens.pop();
                }
            }
            for t in tokens {
                let field = SortField::parse(t)
                    .ok_or_else(|| ServiceError::Validation(format!("unknown sort property '{}'", t)))?;
                orders.push(Order { field, direction });
            }
        }
        Ok(Sort { orders })
    }

    /// The sort keys followed by `id asc` when `id` is not already a key,
    /// so rows with equal keys keep a stable order across pages.
    pub fn with_tie_breaker(&self) -> Vec<Order> {
        let mut orders = self.orders.clone();
        if !orders.iter().any(|o| o.field == SortField::Id) {
            orders.push(Order::asc(SortField::Id));
        }
        orders
    }
}

/// Largest row offset a page may start at.
pub const MAX_OFFSET: u64 = i64::MAX as u64;

/// Bounds applied to caller supplied page sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageLimits {
    pub default_size: u64,
    pub max_size: u64,
}

impl Default for PageLimits {
    fn default() -> Self { Self { default_size: 20, max_size: 100 } }
}

/// Raw pagination parameters as received from the caller
#[derive(Clone, Copy, Debug, Default)]
pub struct Pagination {
    /// 0-based page index
    pub page: Option<i64>,
    /// items per page
    pub size: Option<i64>,
}

impl Pagination {
    /// Clamp to sane defaults and convert to `u64` (page index, page size).
    /// The page index is capped so `page * size` stays within a SQL BIGINT offset.
    pub fn normalize(self, limits: PageLimits) -> (u64, u64) {
        let size = match self.size {
            Some(s) if s >= 1 => (s as u64).min(limits.max_size),
            _ => limits.default_size,
        }
        .max(1);
        let page = self.page.filter(|p| *p > 0).map(|p| p as u64).unwrap_or(0);
        (page.min(MAX_OFFSET / size), size)
    }
}

/// A normalized request for one page of sorted results.
#[derive(Clone, Debug, PartialEq)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
    pub sort: Sort,
}

impl PageRequest {
    pub fn of(page: u64, size: u64, sort: Sort) -> Self {
        Self { page, size: size.max(1), sort }
    }

    pub fn from_params<S: AsRef<str>>(
        page: Option<i64>,
        size: Option<i64>,
        sort: &[S],
        limits: PageLimits,
    ) -> Result<Self, ServiceError> {
        let (page, size) = Pagination { page, size }.normalize(limits);
        Ok(Self { page, size, sort: Sort::parse(sort)? })
    }

    /// Number of rows to skip before this page.
    pub fn offset(&self) -> u64 { self.page.saturating_mul(self.size) }

    /// Row offset, or `None` when it lies past anything a store can address.
    pub fn checked_offset(&self) -> Option<u64> {
        self.page.checked_mul(self.size).filter(|o| *o <= MAX_OFFSET)
    }

    pub fn with_sort_or(self, fallback: Sort) -> Self {
        let sort = self.sort.or(fallback);
        Self { sort, ..self }
    }
}
