use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::InsightError;

/// Calendar format used by the daily chart feed and by joined date strings.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Daily bar as delivered by a market data source, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub open: f64,
    #[serde(default)]
    pub high: f64,
    #[serde(default)]
    pub low: f64,
    #[serde(default)]
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

/// Validated daily OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Date rendered the way the chart feed spells it (`YYYY-MM-DD`).
    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}

impl TryFrom<RawBar> for Bar {
    type Error = InsightError;

    fn try_from(raw: RawBar) -> Result<Self, Self::Error> {
        let text = raw
            .date
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| InsightError::InvalidInput("bar has no date".to_string()))?;

        let date = NaiveDate::parse_from_str(text, DATE_FORMAT)
            .map_err(|e| InsightError::InvalidInput(format!("unparsable bar date '{}': {}", text, e)))?;

        Ok(Bar {
            date,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
        })
    }
}

/// A listed company and its sector/type classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl Company {
    pub fn new(symbol: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
            kind: kind.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
