//! Quote snapshot handed over by the form
//!
//! The form owns the editable state. Each export receives an immutable copy,
//! and edits produce a new snapshot rather than mutating the old one.

use crate::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the services table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineItem {
    #[serde(alias = "item", alias = "time")]
    pub label: String,
    pub description: String,
    pub quantity: String,
    pub unit_price: String,
    pub total: String,
}

impl LineItem {
    pub fn new(
        label: impl Into<String>,
        description: impl Into<String>,
        quantity: impl Into<String>,
        unit_price: impl Into<String>,
        total: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            quantity: quantity.into(),
            unit_price: unit_price.into(),
            total: total.into(),
        }
    }
}

/// Everything the form collected for one quote
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuoteSnapshot {
    /// ISO `YYYY-MM-DD` as produced by a date input
    pub date: String,
    #[serde(alias = "managerName")]
    pub client_name: String,
    #[serde(alias = "re")]
    pub subject: String,
    pub body: String,
    pub tax_percentage: Option<String>,
    #[serde(alias = "tableData")]
    pub line_items: Vec<LineItem>,
}

impl QuoteSnapshot {
    /// A blank quote with a single empty row, as the form starts out
    pub fn new() -> Self {
        Self {
            line_items: vec![LineItem::default()],
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_line_item_added(&self) -> Self {
        let mut next = self.clone();
        next.line_items.push(LineItem::default());
        next
    }

    /// Remove row `index`. The last remaining row is never removed.
    pub fn with_line_item_removed(&self, index: usize) -> Self {
        let mut next = self.clone();
        if next.line_items.len() > 1 && index < next.line_items.len() {
            next.line_items.remove(index);
        }
        next
    }

    pub fn with_line_item(&self, index: usize, item: LineItem) -> Self {
        let mut next = self.clone();
        if let Some(slot) = next.line_items.get_mut(index) {
            *slot = item;
        }
        next
    }

    /// Long US form of the quote date, e.g. `October 19, 2026`.
    ///
    /// An empty date stays empty; anything that is not an ISO date is shown as typed.
    pub fn formatted_date(&self) -> String {
        let raw = self.date.trim();
        if raw.is_empty() {
            return String::new();
        }
        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => date.format("%B %-d, %Y").to_string(),
            Err(_) => raw.to_string(),
        }
    }

    pub fn body_paragraphs(&self) -> impl Iterator<Item = &str> {
        self.body.split('\n')
    }
}
