use log::info;

use super::error::ClassifierError;
use super::logistic::{ClassWeight, LogisticParams, LogisticRegression};
use super::model::TrainedClassifier;
use super::tfidf::TfidfVectorizer;

/// Default vocabulary cap for the TF-IDF stage.
pub const DEFAULT_MAX_FEATURES: usize = 10_000;

/// A builder for configuring and fitting a [`TrainedClassifier`] with a fluent interface.
///
/// # Example
/// ```
/// use sentiment_demo::{ClassWeight, PipelineBuilder};
///
/// let pipeline = PipelineBuilder::new()
///     .with_max_features(5_000)
///     .with_class_weight(ClassWeight::Balanced)
///     .fit(&["great movie", "terrible movie"], &[1, 0])
///     .unwrap();
/// assert_eq!(pipeline.predict("great"), 1);
/// ```
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    max_features: usize,
    ngram_range: (usize, usize),
    params: LogisticParams,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineBuilder {
    /// Creates a builder with the defaults: 10 000 features, unigrams and bigrams,
    /// `C = 1.0`, 1000 iterations, balanced class weights.
    pub fn new() -> Self {
        Self {
            max_features: DEFAULT_MAX_FEATURES,
            ngram_range: (1, 2),
            params: LogisticParams::default(),
        }
    }

    /// Caps the vocabulary at the `max_features` most frequent terms
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    /// Sets the inclusive range of n-gram lengths used as features
    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        self.ngram_range = (min_n, max_n);
        self
    }

    /// Sets the inverse regularisation strength
    pub fn with_c(mut self, c: f64) -> Self {
        self.params.c = c;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.params.max_iter = max_iter;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.params.tol = tol;
        self
    }

    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.params.class_weight = class_weight;
        self
    }

    /// Validates the configuration according to the following rules:
    /// - `max_features` must be positive
    /// - n-gram bounds must satisfy `1 <= min_n <= max_n`
    /// - `max_iter` must be positive
    fn validate_config(&self) -> Result<(), ClassifierError> {
        let (min_n, max_n) = self.ngram_range;
        if self.max_features == 0 {
            return Err(ClassifierError::ValidationError("max_features must be positive".into()));
        }
        if min_n == 0 || min_n > max_n {
            return Err(ClassifierError::ValidationError(format!(
                "Invalid n-gram range ({}, {})",
                min_n, max_n
            )));
        }
        if self.params.max_iter == 0 {
            return Err(ClassifierError::ValidationError("max_iter must be positive".into()));
        }
        Ok(())
    }

    /// Fits the vectorizer and the classifier on `texts` / `labels`.
    ///
    /// # Returns
    /// * `Result<TrainedClassifier, ClassifierError>` - The fitted pipeline, or an error if:
    ///   - The configuration is invalid
    ///   - `texts` and `labels` differ in length or are empty
    ///   - A label is not `0` or `1`
    ///   - The texts contain no word tokens at all
    pub fn fit<S: AsRef<str>>(
        self,
        texts: &[S],
        labels: &[u8],
    ) -> Result<TrainedClassifier, ClassifierError> {
        self.validate_config()?;
        if texts.len() != labels.len() {
            return Err(ClassifierError::ValidationError(format!(
                "Got {} texts but {} labels",
                texts.len(),
                labels.len()
            )));
        }
        if texts.is_empty() {
            return Err(ClassifierError::ValidationError("Cannot fit on an empty dataset".into()));
        }

        info!(
            "Fitting pipeline on {} texts (max_features={}, ngram_range={:?}, C={})",
            texts.len(),
            self.max_features,
            self.ngram_range,
            self.params.c
        );

        let mut vectorizer = TfidfVectorizer::new(self.max_features, self.ngram_range);
        let rows = vectorizer.fit_transform(texts)?;
        let classifier =
            LogisticRegression::fit(&rows, labels, vectorizer.vocabulary_size(), self.params)?;

        Ok(TrainedClassifier {
            vectorizer,
            classifier,
        })
    }
}
