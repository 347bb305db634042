use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use shared_models::user::UserSummary;

/// Emotion label attached to a prediction. Stored uppercase; parsing accepts
/// any casing from clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Emotion {
    #[serde(alias = "negative", alias = "Negative")]
    Negative,
    #[serde(alias = "neutral", alias = "Neutral")]
    Neutral,
    #[serde(alias = "positive", alias = "Positive")]
    Positive,
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Emotion::Negative => write!(f, "NEGATIVE"),
            Emotion::Neutral => write!(f, "NEUTRAL"),
            Emotion::Positive => write!(f, "POSITIVE"),
        }
    }
}

impl FromStr for Emotion {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NEGATIVE" => Ok(Emotion::Negative),
            "NEUTRAL" => Ok(Emotion::Neutral),
            "POSITIVE" => Ok(Emotion::Positive),
            _ => Err(()),
        }
    }
}

/// Projection used by the streak scan: label and timestamp only.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionSample {
    pub emotion: Emotion,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPrediction {
    pub id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordPredictionRequest {
    pub emotion: Option<String>,
    pub at: Option<DateTime<Utc>>,
}

/// A patient whose current run of NEGATIVE predictions crossed the alert
/// threshold.
#[derive(Debug, Clone, Serialize)]
pub struct PatientAlert {
    pub patient: UserSummary,
    pub streak: usize,
    #[serde(rename = "lastAt")]
    pub last_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EmotionSummary {
    pub total: i64,
    #[serde(rename = "NEGATIVE")]
    pub negative: i64,
    #[serde(rename = "NEUTRAL")]
    pub neutral: i64,
    #[serde(rename = "POSITIVE")]
    pub positive: i64,
}

impl EmotionSummary {
    pub fn add(&mut self, emotion: Emotion) {
        self.total += 1;
        match emotion {
            Emotion::Negative => self.negative += 1,
            Emotion::Neutral => self.neutral += 1,
            Emotion::Positive => self.positive += 1,
        }
    }
}

/// Per-patient emotion counts for the provider analytics view.
#[derive(Debug, Clone, Serialize)]
pub struct PatientEmotionBreakdown {
    pub patient: UserSummary,
    #[serde(rename = "NEGATIVE")]
    pub negative: i64,
    #[serde(rename = "NEUTRAL")]
    pub neutral: i64,
    #[serde(rename = "POSITIVE")]
    pub positive: i64,
    #[serde(rename = "lastAt")]
    pub last_at: Option<DateTime<Utc>>,
}
