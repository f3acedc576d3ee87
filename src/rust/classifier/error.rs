use ort::Error as OrtError;

/// Represents the different types of errors that can occur while loading or running a
/// sentiment classifier.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// Error occurred while loading or using the tokenizer
    #[error("Tokenizer error: {0}")]
    TokenizerError(String),
    /// The model artifact is missing or could not be loaded
    #[error("Model load error: {0}")]
    ModelLoad(String),
    /// Error occurred while running the model
    #[error("Prediction error: {0}")]
    Prediction(String),
    /// Error occurred due to invalid input parameters
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<OrtError> for ClassifierError {
    fn from(err: OrtError) -> Self {
        ClassifierError::ModelLoad(err.to_string())
    }
}
