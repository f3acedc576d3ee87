use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::logistic::LogisticRegression;
use super::tfidf::TfidfVectorizer;
use super::{ClassifierInfo, Prediction, SentimentModel, CLASS_LABELS};

/// A fitted TF-IDF + logistic regression pipeline mapping text to
/// `0 = negative` / `1 = positive`.
///
/// The pipeline is immutable once fitted, so a loaded instance can be shared across
/// threads behind an `Arc` and queried concurrently:
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use sentiment_demo::{SentimentModel, TrainedClassifier};
/// use std::sync::Arc;
///
/// let classifier = Arc::new(TrainedClassifier::load("sentiment_model/sentiment_model.json")?);
/// let prediction = classifier.classify("great movie")?;
/// println!("{} ({:.2})", prediction.label, prediction.confidence);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainedClassifier {
    pub vectorizer: TfidfVectorizer,
    pub classifier: LogisticRegression,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<TrainedClassifier>();
    }
};

impl TrainedClassifier {
    /// Creates a new PipelineBuilder for fluent configuration and fitting
    pub fn builder() -> super::builder::PipelineBuilder {
        super::builder::PipelineBuilder::new()
    }

    /// Probabilities for `[negative, positive]`.
    pub fn predict_proba(&self, text: &str) -> [f64; 2] {
        let row = self.vectorizer.transform(text);
        self.classifier.predict_proba(&row)
    }

    /// Predicted class index: `0` for negative, `1` for positive.
    pub fn predict(&self, text: &str) -> u8 {
        let row = self.vectorizer.transform(text);
        self.classifier.predict(&row)
    }

    /// Mean accuracy on the given texts and labels. Returns `0.0` for an empty set.
    pub fn score<S: AsRef<str>>(&self, texts: &[S], labels: &[u8]) -> f64 {
        if texts.is_empty() {
            return 0.0;
        }
        let correct = texts
            .iter()
            .zip(labels)
            .filter(|&(text, &label)| self.predict(text.as_ref()) == label)
            .count();
        correct as f64 / texts.len() as f64
    }

    pub fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            backend: "trained".to_string(),
            class_labels: CLASS_LABELS.iter().map(|s| s.to_string()).collect(),
            vocabulary_size: Some(self.vectorizer.vocabulary_size()),
        }
    }

    /// Writes the pipeline as JSON to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ClassifierError> {
        let path = path.as_ref();
        let json = serde_json::to_vec(self)
            .map_err(|e| ClassifierError::ModelLoad(format!("Failed to serialize pipeline: {}", e)))?;
        fs::write(path, json).map_err(|e| {
            ClassifierError::ModelLoad(format!("Failed to write {}: {}", path.display(), e))
        })?;
        info!("Pipeline saved to {:?}", path);
        Ok(())
    }

    /// Loads a pipeline previously written by [`TrainedClassifier::save`].
    ///
    /// # Errors
    /// - `ModelLoad` if the file does not exist, cannot be read or is not a valid pipeline
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ClassifierError::ModelLoad(format!(
                "Model file not found: {}. Run the `train` command first.",
                path.display()
            )));
        }
        let bytes = fs::read(path).map_err(|e| {
            ClassifierError::ModelLoad(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let pipeline: Self = serde_json::from_slice(&bytes).map_err(|e| {
            ClassifierError::ModelLoad(format!("Invalid model file {}: {}", path.display(), e))
        })?;
        if pipeline.classifier.n_features() != pipeline.vectorizer.vocabulary_size() {
            return Err(ClassifierError::ModelLoad(format!(
                "Model file {} is inconsistent: {} coefficients for {} vocabulary terms",
                path.display(),
                pipeline.classifier.n_features(),
                pipeline.vectorizer.vocabulary_size()
            )));
        }
        info!(
            "Loaded pipeline from {:?} ({} features)",
            path,
            pipeline.vectorizer.vocabulary_size()
        );
        Ok(pipeline)
    }
}

impl SentimentModel for TrainedClassifier {
    fn classify(&self, text: &str) -> Result<Prediction, ClassifierError> {
        if text.trim().is_empty() {
            return Err(ClassifierError::ValidationError("Input text cannot be empty".into()));
        }

        let probs = self.predict_proba(text);
        let class = if probs[1] > probs[0] { 1 } else { 0 };
        Ok(Prediction {
            label: CLASS_LABELS[class].to_string(),
            confidence: probs[class],
        })
    }

    fn info(&self) -> ClassifierInfo {
        TrainedClassifier::info(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted() -> TrainedClassifier {
        TrainedClassifier::builder()
            .fit(
                &["good film", "great plot", "bad film", "awful plot"],
                &[1, 1, 0, 0],
            )
            .expect("toy corpus should fit")
    }

    #[test]
    fn test_classify_returns_label_and_confidence() -> Result<(), ClassifierError> {
        let model = fitted();
        let prediction = model.classify("good plot")?;
        assert_eq!(prediction.label, "positive");
        assert!(prediction.confidence > 0.5 && prediction.confidence <= 1.0);

        let prediction = model.classify("awful film")?;
        assert_eq!(prediction.label, "negative");
        Ok(())
    }

    #[test]
    fn test_classify_rejects_blank_text() {
        let model = fitted();
        assert!(matches!(model.classify(""), Err(ClassifierError::ValidationError(_))));
        assert!(matches!(model.classify("   "), Err(ClassifierError::ValidationError(_))));
    }

    #[test]
    fn test_score_counts_correct_predictions() {
        let model = fitted();
        assert_eq!(model.score(&["good film", "bad film"], &[1, 0]), 1.0);
        assert_eq!(model.score(&["good film", "bad film"], &[0, 1]), 0.0);
        assert_eq!(model.score::<&str>(&[], &[]), 0.0);
    }

    #[test]
    fn test_load_missing_file() {
        let result = TrainedClassifier::load("/nonexistent/sentiment_model.json");
        assert!(matches!(result, Err(ClassifierError::ModelLoad(_))));
    }
}
