//! Core data models shared by the stores, the resolver, and the server.
//!
//! Everything here is immutable once loaded: the stores build these values
//! at startup and the resolver only reads them.

use serde::Serialize;

/// Placeholder rendered for a field the spreadsheet left empty.
pub const NOT_INFORMED: &str = "Not informed";

/// One row of the notification spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotificationRecord {
    pub address: String,
    pub owner: Option<String>,
    pub status: Option<String>,
    pub date: Option<String>,
    pub sector: Option<String>,
    pub article: Option<String>,
    pub remark: Option<String>,
}

impl NotificationRecord {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Labeled fields in display order.
    pub fn fields(&self) -> [(&'static str, Option<&str>); 7] {
        [
            ("Address", Some(self.address.as_str())),
            ("Owner", self.owner.as_deref()),
            ("Status", self.status.as_deref()),
            ("Date", self.date.as_deref()),
            ("Sector", self.sector.as_deref()),
            ("Article", self.article.as_deref()),
            ("Remark", self.remark.as_deref()),
        ]
    }

    /// Renders the record as a `label: value` block headed by its ordinal.
    ///
    /// ```rust
    /// use inspection_desk::models::NotificationRecord;
    ///
    /// let mut rec = NotificationRecord::new("Rua Principal, 100");
    /// rec.status = Some("Pending".to_string());
    /// let block = rec.to_context_block(1);
    /// assert!(block.starts_with("Notification 1:\n"));
    /// assert!(block.contains("- Status: Pending\n"));
    /// assert!(block.contains("- Owner: Not informed\n"));
    /// ```
    pub fn to_context_block(&self, ordinal: usize) -> String {
        let mut out = format!("Notification {}:\n", ordinal);
        for (label, value) in self.fields() {
            out.push_str(&format!("- {}: {}\n", label, value.unwrap_or(NOT_INFORMED)));
        }
        out
    }
}

/// All records loaded from the spreadsheet, in sheet order.
#[derive(Debug, Clone, Default)]
pub struct NotificationDataset {
    records: Vec<NotificationRecord>,
}

impl NotificationDataset {
    pub fn new(records: Vec<NotificationRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[NotificationRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&NotificationRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.address.as_str())
    }
}

/// Full text of the building code, pages joined in order.
#[derive(Debug, Clone)]
pub struct ReferenceDocument {
    pub text: String,
    pub page_count: usize,
}

impl ReferenceDocument {
    /// Separator placed between consecutive page texts.
    pub const PAGE_SEPARATOR: &'static str = " ";

    pub fn from_pages<S: AsRef<str>>(pages: &[S]) -> Self {
        let text = pages
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join(Self::PAGE_SEPARATOR);
        Self {
            text,
            page_count: pages.len(),
        }
    }
}

/// Text returned by the language model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedAnswer {
    pub text: String,
}

impl GeneratedAnswer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
