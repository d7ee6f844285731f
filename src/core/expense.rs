//! Expense reports for the secretary's report screen.
//!
//! Reports are read from the parish backend's report resource. Transport is
//! pluggable through [`ExpenseReportSource`] so the host decides how requests
//! go out; this module owns the URL, the payload shape and the screen-side
//! filtering.

use crate::{
    config::AppConfig,
    errors::{Error, Result},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use tracing::{debug, warn};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Server-side filters for an expense report request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseQuery {
    /// Expense category, see [`crate::core::payment::CATEGORIES`]
    pub category: Option<String>,
    /// Month number, 1 to 12
    pub month: Option<u32>,
    /// Calendar year
    pub year: Option<i32>,
}

impl ExpenseQuery {
    /// Month number for an English month name such as `"March"`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidMonth`] for anything that is not a month name.
    pub fn month_from_name(name: &str) -> Result<u32> {
        let name = name.trim();
        MONTH_NAMES
            .iter()
            .zip(1..)
            .find(|(month, _)| month.eq_ignore_ascii_case(name))
            .map(|(_, number)| number)
            .ok_or_else(|| Error::InvalidMonth {
                month: name.to_string(),
            })
    }

    /// Sets the month filter.
    ///
    /// # Errors
    /// Returns [`Error::InvalidMonth`] outside 1..=12.
    pub fn with_month(mut self, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidMonth {
                month: month.to_string(),
            });
        }
        self.month = Some(month);
        Ok(self)
    }

    /// Percent-encoded `category=..&month=..&year=..`, skipping unset filters.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut params = Vec::new();
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            params.push(format!("category={}", urlencoding::encode(category)));
        }
        if let Some(month) = self.month {
            params.push(format!("month={month}"));
        }
        if let Some(year) = self.year {
            params.push(format!("year={year}"));
        }
        params.join("&")
    }
}

/// One expense line as the backend reports it
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// Backend identifier
    #[serde(rename = "reportID", deserialize_with = "lenient_i64")]
    pub report_id: i64,
    /// Short name of the expense
    pub expense_name: String,
    /// Expense category
    pub category: String,
    /// Unit cost
    #[serde(deserialize_with = "lenient_f64")]
    pub amount: f64,
    /// Number of units
    #[serde(deserialize_with = "lenient_f64")]
    pub quantity: f64,
    /// `amount * quantity` as computed by the backend
    #[serde(deserialize_with = "lenient_f64")]
    pub total_cost: f64,
    /// `YYYY-MM-DD`, possibly followed by a time
    pub date_of_expense: String,
    /// Free text
    #[serde(default)]
    pub description: Option<String>,
}

/// Decoded report payload
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseReport {
    /// Expense lines matching the query
    pub expenses: Vec<Expense>,
    /// Backend total over `expenses`
    pub total_expenses: f64,
    /// Years that have any expenses, for the year filter
    pub available_years: Vec<i32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportResponse {
    success: bool,
    #[serde(default)]
    reports: Vec<Expense>,
    #[serde(default, deserialize_with = "lenient_f64")]
    total_expenses: f64,
    #[serde(default)]
    available_years: Option<Vec<Lenient>>,
}

/// PHP backends send numbers as either JSON numbers or strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Number(f64),
    Text(String),
}

impl Lenient {
    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    let value = Lenient::deserialize(deserializer)?;
    value
        .as_f64()
        .ok_or_else(|| serde::de::Error::custom("expected a number"))
}

#[allow(clippy::cast_possible_truncation)]
fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i64, D::Error> {
    lenient_f64(deserializer).map(|n| n as i64)
}

/// Fetches the raw body of a GET request.
#[async_trait]
pub trait ExpenseReportSource: Send + Sync {
    /// Returns the response body for `url`.
    async fn get(&self, url: &str) -> Result<String>;
}

/// Builds report requests and decodes their responses.
pub struct ExpenseReportClient {
    endpoint: String,
    source: Arc<dyn ExpenseReportSource>,
}

impl std::fmt::Debug for ExpenseReportClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpenseReportClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl ExpenseReportClient {
    /// Client for `endpoint` using `source` for transport
    pub fn new(endpoint: impl Into<String>, source: Arc<dyn ExpenseReportSource>) -> Self {
        Self {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Client for the configured endpoint
    #[must_use]
    pub fn from_config(config: &AppConfig, source: Arc<dyn ExpenseReportSource>) -> Self {
        Self::new(config.reports.endpoint.clone(), source)
    }

    /// Full request URL for `query`
    #[must_use]
    pub fn url(&self, query: &ExpenseQuery) -> String {
        let params = query.to_query_string();
        if params.is_empty() {
            self.endpoint.clone()
        } else {
            format!("{}?{}", self.endpoint, params)
        }
    }

    /// Fetches the report for `query`.
    ///
    /// # Errors
    /// Returns [`Error::Report`] when the backend reports failure, plus any
    /// transport or decoding error.
    #[allow(clippy::cast_possible_truncation)]
    pub async fn fetch(&self, query: &ExpenseQuery) -> Result<ExpenseReport> {
        let url = self.url(query);
        debug!("Fetching expense report from {}", url);

        let body = self.source.get(&url).await?;
        let response: ReportResponse = serde_json::from_str(&body)?;
        if !response.success {
            warn!("Expense report request was not successful: {}", url);
            return Err(Error::Report {
                message: "Failed to fetch expense reports".to_string(),
            });
        }

        let available_years = response
            .available_years
            .unwrap_or_default()
            .iter()
            .filter_map(Lenient::as_f64)
            .map(|y| y as i32)
            .collect();

        debug!("Fetched {} expense line(s)", response.reports.len());
        Ok(ExpenseReport {
            expenses: response.reports,
            total_expenses: response.total_expenses,
            available_years,
        })
    }
}

/// Expenses whose name or description contains `term`, ignoring case
#[must_use]
pub fn search_expenses<'a>(expenses: &'a [Expense], term: &str) -> Vec<&'a Expense> {
    let term = term.to_lowercase();
    expenses
        .iter()
        .filter(|e| {
            term.is_empty()
                || e.expense_name.to_lowercase().contains(&term)
                || e.description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&term))
        })
        .collect()
}

/// Cost of `quantity` units at `amount`, rounded to centavos
#[must_use]
pub fn total_cost(amount: f64, quantity: f64) -> f64 {
    super::donation::round_to_cents(amount * quantity)
}

/// `MM/DD/YYYY` for a `YYYY-MM-DD hh:mm:ss` timestamp.
///
/// A bare `YYYY-MM-DD` and anything unparseable come back unchanged.
#[must_use]
pub fn format_expense_date(value: &str) -> String {
    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok() {
        return value.to_string();
    }
    let date_part = value.split(' ').next().unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_or_else(|_| value.to_string(), |d| d.format("%m/%d/%Y").to_string())
}
