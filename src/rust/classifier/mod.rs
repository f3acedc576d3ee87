mod error;
mod logistic;
mod model;
mod pretrained;
mod tfidf;
mod utils;
pub mod builder;

pub use builder::PipelineBuilder;
pub use error::ClassifierError;
pub use logistic::{ClassWeight, LogisticParams, LogisticRegression};
pub use model::TrainedClassifier;
pub use pretrained::PretrainedClassifier;
pub use tfidf::{SparseVector, TfidfVectorizer};

/// Class names of the trained pipeline, indexed by label (`0 = negative`, `1 = positive`).
pub const CLASS_LABELS: [&str; 2] = ["negative", "positive"];

/// The outcome of classifying one text.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Label as emitted by the backend, e.g. `positive` or `POSITIVE`
    pub label: String,
    /// Probability of the predicted label, in `[0, 1]`
    pub confidence: f64,
}

/// Information about a loaded classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierInfo {
    /// `trained` or `pretrained`
    pub backend: String,
    pub class_labels: Vec<String>,
    /// Size of the TF-IDF vocabulary, when the backend has one
    pub vocabulary_size: Option<usize>,
}

/// A read-only text -> sentiment predictor.
///
/// Implementations are immutable after construction and safe to share between request
/// handlers behind an `Arc`.
pub trait SentimentModel: Send + Sync {
    fn classify(&self, text: &str) -> Result<Prediction, ClassifierError>;

    fn info(&self) -> ClassifierInfo;
}

/// Russian name of a sentiment label. Unknown labels are returned unchanged.
pub fn localize_label(label: &str) -> &str {
    match label.to_ascii_lowercase().as_str() {
        "positive" => "позитивное",
        "negative" => "негативное",
        "neutral" => "нейтральное",
        _ => label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_localize_label_is_case_insensitive() {
        assert_eq!(localize_label("POSITIVE"), "позитивное");
        assert_eq!(localize_label("positive"), "позитивное");
        assert_eq!(localize_label("NEGATIVE"), "негативное");
        assert_eq!(localize_label("negative"), "негативное");
        assert_eq!(localize_label("NEUTRAL"), "нейтральное");
    }

    #[test]
    fn test_localize_label_passes_unknown_through() {
        assert_eq!(localize_label("LABEL_7"), "LABEL_7");
    }
}
