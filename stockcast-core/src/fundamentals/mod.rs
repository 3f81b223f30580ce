//! Fundamentals panel model: labelled sections built from a snapshot.
//!
//! Every field lookup falls back to [`NOT_AVAILABLE`]; a missing key is never
//! an error. The recommendation label is derived from the mean analyst rating
//! on the 1 (strong buy) to 5 (strong sell) scale.

pub mod snapshot;

pub use snapshot::{Snapshot, SnapshotValue};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Text shown for any missing field.
pub const NOT_AVAILABLE: &str = "N/A";

/// Analyst consensus bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    NotAvailable,
}

impl Recommendation {
    /// Bucket a mean rating: `<= 2` strong buy, `<= 3` buy, `<= 4` hold,
    /// otherwise sell.
    ///
    /// Absent and non-finite values are `NotAvailable`. Means off the 1..5
    /// scale still bucket: below 1 is strong buy, above 5 is sell.
    pub fn from_mean(mean: Option<f64>) -> Self {
        let Some(m) = mean else {
            return Recommendation::NotAvailable;
        };
        if !m.is_finite() {
            return Recommendation::NotAvailable;
        }
        if m <= 2.0 {
            Recommendation::StrongBuy
        } else if m <= 3.0 {
            Recommendation::Buy
        } else if m <= 4.0 {
            Recommendation::Hold
        } else {
            Recommendation::Sell
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "Strong Buy",
            Recommendation::Buy => "Buy",
            Recommendation::Hold => "Hold",
            Recommendation::Sell => "Sell",
            Recommendation::NotAvailable => NOT_AVAILABLE,
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One labelled field lookup.
#[derive(Debug, Clone, Copy)]
struct Field {
    label: &'static str,
    key: &'static str,
    /// Currency prefix, applied only when the value is present.
    prefix: &'static str,
}

const fn field(label: &'static str, key: &'static str) -> Field {
    Field {
        label,
        key,
        prefix: "",
    }
}

const fn price(label: &'static str, key: &'static str) -> Field {
    Field {
        label,
        key,
        prefix: "$",
    }
}

const LAYOUT: &[(&str, &[Field])] = &[
    (
        "Basic Information",
        &[
            field("Company Name", "longName"),
            field("Sector", "sector"),
            field("Industry", "industry"),
            field("Market Cap", "marketCap"),
            field("Country", "country"),
        ],
    ),
    (
        "Market Data",
        &[
            price("Current Price", "currentPrice"),
            price("52 Week High", "fiftyTwoWeekHigh"),
            price("52 Week Low", "fiftyTwoWeekLow"),
            field("PE Ratio", "trailingPE"),
        ],
    ),
    (
        "Dividends and Yield",
        &[
            field("Dividend Yield", "dividendYield"),
            field("Dividend Rate", "dividendRate"),
        ],
    ),
    (
        "Valuation and Ratios",
        &[
            field("Price to Earnings (P/E)", "trailingPE"),
            field("Price to Book (P/B)", "priceToBook"),
        ],
    ),
    (
        "Financial Performance",
        &[
            field("Revenue", "totalRevenue"),
            field("Gross Profit", "grossProfits"),
        ],
    ),
    ("Cash Flow", &[field("Free Cash Flow", "freeCashflow")]),
    (
        "Analyst Ratings",
        &[field("Recommendation Mean", "recommendationMean")],
    ),
];

/// Snapshot key of the mean analyst rating.
pub const RECOMMENDATION_KEY: &str = "recommendationMean";

/// Look up `key` and render it, or [`NOT_AVAILABLE`].
pub fn display_field(snapshot: &Snapshot, key: &str) -> String {
    snapshot
        .get(key)
        .map(ToString::to_string)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// A rendered `label: value` line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub rows: Vec<FieldRow>,
}

impl Section {
    /// Value of the row labelled `label`.
    pub fn value(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.value.as_str())
    }
}

/// Everything the Stock Info page shows as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsPanel {
    pub ticker: String,
    pub sections: Vec<Section>,
    pub recommendation: Recommendation,
    /// P/E and P/B, present values only.
    pub valuation: Vec<(String, f64)>,
}

impl FundamentalsPanel {
    pub fn build(ticker: &str, snapshot: &Snapshot) -> Self {
        let recommendation = Recommendation::from_mean(snapshot.number(RECOMMENDATION_KEY));

        let mut sections: Vec<Section> = LAYOUT
            .iter()
            .map(|(title, fields)| Section {
                title: (*title).to_string(),
                rows: fields
                    .iter()
                    .map(|f| FieldRow {
                        label: f.label.to_string(),
                        value: match snapshot.get(f.key) {
                            Some(v) => format!("{}{v}", f.prefix),
                            None => NOT_AVAILABLE.to_string(),
                        },
                    })
                    .collect(),
            })
            .collect();

        if let Some(ratings) = sections.last_mut() {
            ratings.rows.push(FieldRow {
                label: "Current Recommendation".to_string(),
                value: recommendation.label().to_string(),
            });
        }

        Self {
            ticker: ticker.to_string(),
            sections,
            recommendation,
            valuation: valuation_metrics(snapshot),
        }
    }

    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }

    /// Every `(label, value)` pair, in display order.
    pub fn rows(&self) -> impl Iterator<Item = &FieldRow> {
        self.sections.iter().flat_map(|s| s.rows.iter())
    }
}

/// P/E and P/B bars. Missing ratios are skipped rather than plotted as zero.
pub fn valuation_metrics(snapshot: &Snapshot) -> Vec<(String, f64)> {
    [("P/E Ratio", "trailingPE"), ("P/B Ratio", "priceToBook")]
        .into_iter()
        .filter_map(|(label, key)| snapshot.number(key).map(|v| (label.to_string(), v)))
        .collect()
}
