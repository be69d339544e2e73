use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const INCOME_TAGS: &[&str] = &["salary", "bonus", "gift", "other"];

pub const EXPENSE_TAGS: &[&str] = &[
    "food",
    "rent",
    "transport",
    "other",
    "clothing",
    "entertainment",
    "health",
    "education",
];

/// Income and expense entries share one record shape; the kind decides
/// the tag set, the collection and which user reference list owns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn label(self) -> &'static str {
        match self {
            EntryKind::Income => "income",
            EntryKind::Expense => "expense",
        }
    }

    pub fn tags(self) -> &'static [&'static str] {
        match self {
            EntryKind::Income => INCOME_TAGS,
            EntryKind::Expense => EXPENSE_TAGS,
        }
    }

    pub fn description_required(self) -> bool {
        matches!(self, EntryKind::Expense)
    }

    /// Collection name, also the name of the user's reference list field.
    pub fn collection(self) -> &'static str {
        match self {
            EntryKind::Income => "incomes",
            EntryKind::Expense => "expenses",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Ils,
    Usd,
    Eur,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Ils, Currency::Usd, Currency::Eur];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Ils => "ILS",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }
}

impl FromStr for Currency {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|c| c.code() == s)
            .ok_or(())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Incoming add/update payload, before validation.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EntryRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub tag: Option<String>,
    pub currency: Option<String>,
}

/// Validated entry fields. Serializes with the same field names as
/// [`Entry`] so it can be used directly as an update document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEntry {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub amount: f64,
    pub tag: String,
    pub currency: Currency,
}

/// Stored income or expense document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub amount: f64,
    pub tag: String,
    #[serde(default)]
    pub currency: Currency,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    pub fn new(fields: NewEntry) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            title: fields.title,
            description: fields.description,
            amount: fields.amount,
            tag: fields.tag,
            currency: fields.currency,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites every user-editable field and bumps `updated_at`.
    pub fn apply(&mut self, fields: NewEntry) {
        self.title = fields.title;
        self.description = fields.description;
        self.amount = fields.amount;
        self.tag = fields.tag;
        self.currency = fields.currency;
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryView {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub amount: f64,
    pub tag: String,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Entry> for EntryView {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id.to_hex(),
            title: entry.title.clone(),
            description: entry.description.clone(),
            amount: entry.amount,
            tag: entry.tag.clone(),
            currency: entry.currency,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        }
    }
}
