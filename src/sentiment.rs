// 💬 Sentiment - emotion classification of review text
//
// Text in, at most one {label, confidence} out. KeywordEmotionClassifier is
// the lexicon fallback when no model-backed classifier is wired in.

use crate::entities::Emotion;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub confidence: f64,
}

pub trait SentimentClassifier {
    /// `None` when the classifier has no answer for this text
    fn classify(&self, text: &str) -> Option<Classification>;
}

impl<T: SentimentClassifier + ?Sized> SentimentClassifier for &T {
    fn classify(&self, text: &str) -> Option<Classification> {
        (**self).classify(text)
    }
}

impl<T: SentimentClassifier + ?Sized> SentimentClassifier for Box<T> {
    fn classify(&self, text: &str) -> Option<Classification> {
        (**self).classify(text)
    }
}

/// First `limit` characters of `text` (char boundaries, not bytes)
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

// ============================================================================
// KEYWORD CLASSIFIER
// ============================================================================

pub struct KeywordEmotionClassifier {
    lexicon: HashMap<&'static str, Emotion>,
}

impl KeywordEmotionClassifier {
    pub fn new() -> Self {
        let entries: [(Emotion, &[&'static str]); 6] = [
            (
                Emotion::Joy,
                &[
                    "good", "great", "excellent", "love", "loved", "amazing", "wonderful",
                    "delicious", "tasty", "friendly", "perfect", "best", "recommend", "happy",
                    "fantastic", "awesome", "cozy", "lovely",
                ],
            ),
            (
                Emotion::Anger,
                &["rude", "angry", "furious", "worst", "never", "unacceptable", "scam", "ignored"],
            ),
            (
                Emotion::Disgust,
                &["disgusting", "dirty", "gross", "stale", "smelly", "cold", "raw", "hair"],
            ),
            (
                Emotion::Sadness,
                &["sad", "disappointed", "disappointing", "unfortunately", "sadly", "miss", "poor"],
            ),
            (
                Emotion::Surprise,
                &["surprised", "surprising", "unexpected", "wow", "shocked", "unbelievable"],
            ),
            (Emotion::Fear, &["afraid", "scared", "worried", "dangerous", "sick"]),
        ];

        let mut lexicon = HashMap::new();
        for (emotion, words) in entries {
            for word in words {
                lexicon.insert(*word, emotion);
            }
        }

        Self { lexicon }
    }
}

impl Default for KeywordEmotionClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentClassifier for KeywordEmotionClassifier {
    fn classify(&self, text: &str) -> Option<Classification> {
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect();

        if words.is_empty() {
            return None;
        }

        let mut hits: HashMap<Emotion, usize> = HashMap::new();
        for word in &words {
            if let Some(emotion) = self.lexicon.get(word.as_str()) {
                *hits.entry(*emotion).or_insert(0) += 1;
            }
        }

        let total: usize = hits.values().sum();
        if total == 0 {
            return Some(Classification {
                label: Emotion::Neutral.as_str().to_string(),
                confidence: 0.5,
            });
        }

        // Ties resolve by label order so results are stable
        let (emotion, count) = hits
            .into_iter()
            .max_by(|(ea, ca), (eb, cb)| ca.cmp(cb).then_with(|| eb.as_str().cmp(ea.as_str())))?;

        Some(Classification {
            label: emotion.as_str().to_string(),
            confidence: count as f64 / total as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("ciorbă de burtă", 5), "ciorb");
        assert_eq!(truncate_chars("ciorbă", 6), "ciorbă");
        assert_eq!(truncate_chars("short", 512), "short");
        assert_eq!(truncate_chars("ăăă", 2), "ăă");
    }

    #[test]
    fn test_keyword_joy() {
        let classifier = KeywordEmotionClassifier::new();
        let result = classifier.classify("Delicious food and friendly staff!").unwrap();
        assert_eq!(result.label, "joy");
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_keyword_mixed_picks_majority() {
        let classifier = KeywordEmotionClassifier::new();
        let result = classifier
            .classify("Rude waiter, rude manager, but the soup was good")
            .unwrap();
        assert_eq!(result.label, "anger");
        assert!((result.confidence - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_keyword_no_hits_is_neutral() {
        let classifier = KeywordEmotionClassifier::new();
        let result = classifier.classify("We ordered soup.").unwrap();
        assert_eq!(result.label, "neutral");
    }

    #[test]
    fn test_keyword_no_words_is_none() {
        let classifier = KeywordEmotionClassifier::new();
        assert!(classifier.classify("!!! ...").is_none());
    }
}
