use analysis_core::Sentiment;
use serde::Serialize;

const POSITIVE_WORDS: &[&str] = &[
    "gain", "rise", "up", "positive", "growth", "profit", "bull", "surge", "rally", "strong",
];

const NEGATIVE_WORDS: &[&str] = &[
    "fall", "drop", "down", "negative", "loss", "bear", "decline", "weak", "crash", "plunge",
];

/// How many words from each list appear in a piece of text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WordCounts {
    pub positive: usize,
    pub negative: usize,
}

impl WordCounts {
    pub fn sentiment(&self) -> Sentiment {
        if self.positive > self.negative {
            Sentiment::Positive
        } else if self.negative > self.positive {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

/// Count list words present in `text`.
///
/// Matching is a case-insensitive substring test, so "gains" counts for
/// "gain". Each list word contributes at most once no matter how often it
/// occurs.
pub fn count_words(text: &str) -> WordCounts {
    let text_lower = text.to_lowercase();

    WordCounts {
        positive: POSITIVE_WORDS
            .iter()
            .filter(|w| text_lower.contains(*w))
            .count(),
        negative: NEGATIVE_WORDS
            .iter()
            .filter(|w| text_lower.contains(*w))
            .count(),
    }
}

pub fn tag_sentiment(text: &str) -> Sentiment {
    count_words(text).sentiment()
}

/// Tag an article from its title and description.
pub fn tag_article(title: &str, description: &str) -> Sentiment {
    tag_sentiment(&format!("{} {}", title, description))
}
