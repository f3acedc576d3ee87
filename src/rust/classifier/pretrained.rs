use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use log::{error, info};
use ndarray::{Array1, Array2};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use super::error::ClassifierError;
use super::utils::softmax;
use super::{ClassifierInfo, Prediction, SentimentModel};
use crate::runtime::{create_session_builder, RuntimeConfig};
use crate::{BuiltinModel, ModelCharacteristics, ModelManager};

/// A sentiment classifier backed by a pretrained transformer exported to ONNX.
///
/// The ONNX model is expected to:
/// - Accept `input_ids` and `attention_mask` (and optionally `token_type_ids`), all of
///   shape `[batch_size, sequence_length]`
/// - Output logits of shape `[batch_size, num_labels]`
///
/// Confidence is the softmax probability of the arg-max label.
#[derive(Debug)]
pub struct PretrainedClassifier {
    pub model_path: String,
    pub tokenizer_path: String,
    tokenizer: Arc<Tokenizer>,
    session: Arc<Session>,
    characteristics: ModelCharacteristics,
    uses_token_type_ids: bool,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<PretrainedClassifier>();
    }
};

impl PretrainedClassifier {
    /// Loads a built-in model from the manager's cache.
    ///
    /// # Errors
    /// - `ModelLoad` if the model has not been downloaded yet
    /// - `ModelLoad` if the tokenizer or the ONNX model fails to load or validate
    pub fn from_builtin(
        model: BuiltinModel,
        manager: &ModelManager,
        config: &RuntimeConfig,
    ) -> Result<Self, ClassifierError> {
        let info = model.get_model_info();
        if !manager.is_model_downloaded(&info.name) {
            return Err(ClassifierError::ModelLoad(format!(
                "Model '{:?}' is not downloaded. Download it first with ModelManager::download_model()",
                model
            )));
        }

        Self::from_files(
            manager.get_model_path(&info.name),
            manager.get_tokenizer_path(&info.name),
            model.characteristics(),
            config,
        )
    }

    /// Loads an ONNX model and a HuggingFace `tokenizer.json` from explicit paths.
    pub fn from_files<P: AsRef<Path>, Q: AsRef<Path>>(
        model_path: P,
        tokenizer_path: Q,
        characteristics: ModelCharacteristics,
        config: &RuntimeConfig,
    ) -> Result<Self, ClassifierError> {
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();
        if !model_path.exists() {
            return Err(ClassifierError::ModelLoad(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }
        if !tokenizer_path.exists() {
            return Err(ClassifierError::ModelLoad(format!(
                "Tokenizer file not found: {}",
                tokenizer_path.display()
            )));
        }
        if characteristics.labels.is_empty() {
            return Err(ClassifierError::ModelLoad("Model must declare at least one label".into()));
        }

        let tokenizer = Tokenizer::from_file(tokenizer_path).map_err(|e| {
            error!("Failed to load tokenizer: {}", e);
            ClassifierError::ModelLoad(format!("Failed to load tokenizer: {}", e))
        })?;
        info!("Tokenizer loaded successfully");

        let session = create_session_builder(config)?.commit_from_file(model_path)?;
        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        let uses_token_type_ids = session.inputs.iter().any(|input| input.name == "token_type_ids");

        Ok(Self {
            model_path: model_path.to_string_lossy().to_string(),
            tokenizer_path: tokenizer_path.to_string_lossy().to_string(),
            tokenizer: Arc::new(tokenizer),
            session: Arc::new(session),
            characteristics,
            uses_token_type_ids,
        })
    }

    /// Validates that the model has the expected input/output structure
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        let has_input = |name: &str| session.inputs.iter().any(|input| input.name == name);
        if !has_input("input_ids") || !has_input("attention_mask") {
            return Err(ClassifierError::ModelLoad(format!(
                "Model must take input_ids and attention_mask, found {:?}",
                session.inputs.iter().map(|input| input.name.as_str()).collect::<Vec<_>>()
            )));
        }
        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelLoad(
                "Model must have at least 1 output for logits".to_string(),
            ));
        }
        Ok(())
    }

    /// Encodes text with special tokens and checks it against the model's sequence limit.
    ///
    /// # Errors
    /// - `TokenizerError` if the text cannot be encoded
    /// - `ValidationError` if the encoding exceeds `max_sequence_length`
    fn tokenize(&self, text: &str) -> Result<(Vec<i64>, Vec<i64>), ClassifierError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))?;

        let token_len = encoding.get_ids().len();
        let max_length = self.characteristics.max_sequence_length;
        if token_len > max_length {
            return Err(ClassifierError::ValidationError(format!(
                "Input text too long: {} tokens (max: {}). Consider splitting the text into smaller chunks.",
                token_len, max_length
            )));
        }

        let ids = encoding.get_ids().iter().map(|&id| id as i64).collect();
        let mask = encoding.get_attention_mask().iter().map(|&m| m as i64).collect();
        Ok((ids, mask))
    }

    fn input_tensor(name: &str, values: Vec<i64>) -> Result<Tensor<i64>, ClassifierError> {
        let array = Array2::from_shape_vec((1, values.len()), values).map_err(|e| {
            ClassifierError::Prediction(format!("Failed to create {} array: {}", name, e))
        })?;
        Tensor::from_array(array).map_err(|e| {
            ClassifierError::Prediction(format!("Failed to create {} tensor: {}", name, e))
        })
    }

    fn logits(&self, ids: Vec<i64>, mask: Vec<i64>) -> Result<Array1<f32>, ClassifierError> {
        let len = ids.len();
        let mut input_tensors = HashMap::new();
        input_tensors.insert("input_ids", Self::input_tensor("input_ids", ids)?);
        input_tensors.insert("attention_mask", Self::input_tensor("attention_mask", mask)?);
        if self.uses_token_type_ids {
            input_tensors.insert("token_type_ids", Self::input_tensor("token_type_ids", vec![0; len])?);
        }

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| ClassifierError::Prediction(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>().map_err(|e| {
            ClassifierError::Prediction(format!("Failed to extract output tensor: {}", e))
        })?;

        let shape = output_tensor.shape();
        if shape.len() != 2 || shape[1] != self.characteristics.labels.len() {
            return Err(ClassifierError::Prediction(format!(
                "Unexpected logits shape {:?} for {} labels",
                shape,
                self.characteristics.labels.len()
            )));
        }
        let row = output_tensor.slice(ndarray::s![0, ..]);
        Ok(Array1::from_iter(row.iter().cloned()))
    }
}

impl SentimentModel for PretrainedClassifier {
    fn classify(&self, text: &str) -> Result<Prediction, ClassifierError> {
        if text.trim().is_empty() {
            return Err(ClassifierError::ValidationError("Input text cannot be empty".into()));
        }

        let (ids, mask) = self.tokenize(text)?;
        let probs = softmax(self.logits(ids, mask)?.view());

        let (best, confidence) = probs
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, &p)| (i, p))
            .ok_or_else(|| ClassifierError::Prediction("Model returned no scores".into()))?;

        Ok(Prediction {
            label: self.characteristics.labels[best].clone(),
            confidence: f64::from(confidence),
        })
    }

    fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            backend: "pretrained".to_string(),
            class_labels: self.characteristics.labels.clone(),
            vocabulary_size: None,
        }
    }
}
