//! Storage-type inference from sampled text values.
//!
//! Every CSV field is text until a column is created for it; [`infer_kind()`]
//! decides the storage [`Kind`] once, from an ordered sample, and the column
//! keeps that kind for its lifetime. The scan is first-match: the first sample
//! that reads as a number or a date settles the kind, later samples are never
//! consulted. A column whose early samples happen to be numeric is typed
//! numeric even if later values are genuinely textual — callers needing
//! majority-vote semantics should sample accordingly rather than expect this
//! function to re-vote.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Length used for text columns; inference never produces a tighter bound.
pub const DEFAULT_TEXT_LENGTH: usize = 255;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Number,
    Date,
    Text,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Number => "number",
            Kind::Date => "date",
            Kind::Text => "text",
        }
    }

    /// Native column type used in DDL for this kind.
    pub fn sql_type(&self) -> String {
        match self {
            Kind::Number => "NUMERIC".to_string(),
            Kind::Date => "DATE".to_string(),
            Kind::Text => format!("VARCHAR({DEFAULT_TEXT_LENGTH})"),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Infers the storage kind for one field from an ordered sequence of raw
/// sample values. Never fails: an empty sample, or one with no recognizable
/// value, yields [`Kind::Text`].
pub fn infer_kind<'a, I>(samples: I) -> Kind
where
    I: IntoIterator<Item = &'a str>,
{
    for value in samples {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.parse::<i64>().is_ok() || trimmed.parse::<f64>().is_ok() {
            return Kind::Number;
        }
        if NaiveDate::parse_from_str(trimmed, DATE_FORMAT).is_ok() {
            return Kind::Date;
        }
    }
    Kind::Text
}
