//! Store records as returned by the remote collection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Logo shown when a store has none
pub const DEFAULT_LOGO: &str = "default-logo.png";

/// Stable identity of a store
///
/// The collection may hand out numeric or string ids; both are accepted and
/// compared as-is (`7` and `"7"` are different stores).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreId {
    Number(u64),
    Text(String),
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreId::Number(n) => write!(f, "{}", n),
            StoreId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for StoreId {
    fn from(id: u64) -> Self {
        StoreId::Number(id)
    }
}

impl From<&str> for StoreId {
    fn from(id: &str) -> Self {
        StoreId::Text(id.to_string())
    }
}

/// How the cashback rate is advertised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateType {
    Upto,
    #[default]
    Flat,
}

/// Unit of the cashback amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmountType {
    Fixed,
    #[default]
    Percent,
}

impl AmountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmountType::Fixed => "fixed",
            AmountType::Percent => "percent",
        }
    }
}

/// A store listed by the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub logo: Option<String>,

    /// Outbound link opened when the store card is clicked
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub cashback_enabled: bool,

    /// Sent either as a number or a numeric string
    #[serde(default, deserialize_with = "lenient_amount")]
    pub cashback_amount: f64,

    #[serde(default)]
    pub rate_type: RateType,

    #[serde(default)]
    pub amount_type: AmountType,

    #[serde(default)]
    pub clicks: u64,

    #[serde(default)]
    pub is_promoted: bool,

    #[serde(default)]
    pub is_sharable: bool,

    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    /// Category identifiers the store is filed under
    #[serde(default)]
    pub cats: Vec<String>,
}

impl Store {
    /// Create a store with only identity and name set
    pub fn new(id: impl Into<StoreId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            logo: None,
            url: None,
            cashback_enabled: false,
            cashback_amount: 0.0,
            rate_type: RateType::default(),
            amount_type: AmountType::default(),
            clicks: 0,
            is_promoted: false,
            is_sharable: false,
            published_at: None,
            updated_at: None,
            cats: Vec::new(),
        }
    }

    /// Enable cashback with the given terms
    pub fn with_cashback(mut self, amount: f64, rate_type: RateType, amount_type: AmountType) -> Self {
        self.cashback_enabled = true;
        self.cashback_amount = amount;
        self.rate_type = rate_type;
        self.amount_type = amount_type;
        self
    }

    /// Text shown under the store name, e.g. `Upto 5.00% cashback`
    pub fn cashback_label(&self) -> String {
        if !self.cashback_enabled {
            return "No cashback available".to_string();
        }
        let prefix = match self.rate_type {
            RateType::Upto => "Upto ",
            RateType::Flat => "Flat ",
        };
        let amount = match self.amount_type {
            AmountType::Fixed => format!("${:.2}", self.cashback_amount),
            AmountType::Percent => format!("{:.2}%", self.cashback_amount),
        };
        format!("{}{} cashback", prefix, amount)
    }

    pub fn logo_or_default(&self) -> &str {
        self.logo.as_deref().unwrap_or(DEFAULT_LOGO)
    }

    pub fn outbound_url(&self) -> &str {
        self.url.as_deref().unwrap_or("#")
    }
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
        Missing(Option<()>),
    }

    match Amount::deserialize(deserializer)? {
        Amount::Number(n) => Ok(n),
        Amount::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid cashback amount '{}'", s))),
        Amount::Missing(_) => Ok(0.0),
    }
}
