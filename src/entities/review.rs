// 💬 Review Record - one classified review in the append-only log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label stored when the classifier returns nothing
pub const UNKNOWN_EMOTION: &str = "Unknown";

// ============================================================================
// EMOTION
// ============================================================================

/// Closed label set produced by the emotion classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Anger,
    Disgust,
    Fear,
    Joy,
    Neutral,
    Sadness,
    Surprise,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Anger,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Joy,
        Emotion::Neutral,
        Emotion::Sadness,
        Emotion::Surprise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Anger => "anger",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Joy => "joy",
            Emotion::Neutral => "neutral",
            Emotion::Sadness => "sadness",
            Emotion::Surprise => "surprise",
        }
    }

    /// Case-insensitive label lookup; `None` for labels outside the set
    pub fn from_label(label: &str) -> Option<Emotion> {
        let label = label.trim();
        Emotion::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(label))
    }

    /// Ordinal used as the clustering emotion dimension.
    /// `fear` has no slot in the scale and scores 0 like unknown labels.
    pub fn ordinal(&self) -> u8 {
        match self {
            Emotion::Anger => 1,
            Emotion::Disgust => 2,
            Emotion::Sadness => 3,
            Emotion::Surprise => 4,
            Emotion::Neutral => 5,
            Emotion::Joy => 6,
            Emotion::Fear => 0,
        }
    }
}

// ============================================================================
// REVIEW RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Provider id of the reviewed place.
    /// Absent in logs written before ids were recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,

    /// Name of the reviewed place at write time
    #[serde(alias = "restaurant_name")]
    pub entity_name: String,

    #[serde(default)]
    pub author: String,

    /// Full review text (the classifier only saw a truncated prefix)
    #[serde(alias = "review_text")]
    pub text: String,

    /// Classifier label, or "Unknown"
    pub emotion: String,

    /// Classifier confidence in [0, 1]
    pub confidence: f64,

    /// Enrichment run that produced this record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classified_at: Option<DateTime<Utc>>,
}

impl ReviewRecord {
    /// Ordinal of this review's emotion, 0 for unknown labels
    pub fn emotion_ordinal(&self) -> u8 {
        Emotion::from_label(&self.emotion)
            .map(|e| e.ordinal())
            .unwrap_or(0)
    }
}
