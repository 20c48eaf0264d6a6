use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::models::api_key::KeyStatus;

/// 1-based page plus page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }
}

/// Optional catalog filters from the query string.
#[derive(Debug, Clone, Default)]
pub struct ShoeFilter {
    pub brand: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// One conjunct of a catalog query.
#[derive(Debug, Clone, PartialEq)]
pub enum ShoePredicate {
    /// Case-insensitive substring of the brand
    BrandContains(String),
    CategoryIs(String),
    MinPrice(f64),
    MaxPrice(f64),
}

impl ShoeFilter {
    /// Each present, non-blank filter becomes one predicate; the query is their conjunction.
    pub fn predicates(&self) -> Vec<ShoePredicate> {
        let mut predicates = Vec::new();
        if let Some(brand) = non_blank(&self.brand) {
            predicates.push(ShoePredicate::BrandContains(brand.to_string()));
        }
        if let Some(category) = non_blank(&self.category) {
            predicates.push(ShoePredicate::CategoryIs(category.to_string()));
        }
        if let Some(min) = self.min_price {
            predicates.push(ShoePredicate::MinPrice(min));
        }
        if let Some(max) = self.max_price {
            predicates.push(ShoePredicate::MaxPrice(max));
        }
        predicates
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiKeyFilter {
    pub status: Option<KeyStatus>,
}

/// Admin activity-log filters. `start` and `end` are inclusive calendar days (UTC).
#[derive(Debug, Clone)]
pub struct LogFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Case-insensitive substring of the owning username
    pub username: Option<String>,
    pub limit: u32,
}

impl Default for LogFilter {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            username: None,
            limit: 100,
        }
    }
}

impl LogFilter {
    pub fn recent(limit: u32) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Inclusive lower bound on `request_time`
    pub fn start_bound(&self) -> Option<DateTime<Utc>> {
        self.start.map(start_of_day)
    }

    /// Exclusive upper bound: midnight after `end`
    pub fn end_bound(&self) -> Option<DateTime<Utc>> {
        self.end
            .map(|end| end.succ_opt().map(start_of_day).unwrap_or(DateTime::<Utc>::MAX_UTC))
    }

    pub fn username_term(&self) -> Option<&str> {
        non_blank(&self.username)
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `%term%` for LIKE/ILIKE with the pattern metacharacters in `term` escaped.
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
