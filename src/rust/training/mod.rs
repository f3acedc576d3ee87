//! Dataset loading, evaluation and persistence for the trained pipeline.

mod dataset;
mod split;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

pub use dataset::{load_dataset, parse_dataset, Dataset, DatasetError, TARGET_FIELD, TEXT_FIELD};
pub use split::{stratified_split, Split};

use crate::classifier::{ClassifierError, PipelineBuilder, TrainedClassifier, CLASS_LABELS};

pub const MODEL_FILE_NAME: &str = "sentiment_model.json";
pub const METADATA_FILE_NAME: &str = "metadata.json";

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error("Invalid training configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to serialize metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Descriptive record written next to the pipeline for operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_type: String,
    pub features: String,
    pub target: String,
    pub classes: Vec<String>,
}

impl Default for ModelMetadata {
    fn default() -> Self {
        Self {
            model_type: "LogisticRegression".to_string(),
            features: TEXT_FIELD.to_string(),
            target: TARGET_FIELD.to_string(),
            classes: CLASS_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub data_path: PathBuf,
    pub model_dir: PathBuf,
    /// Seeds the train/test shuffle
    pub seed: u64,
    /// Fraction of each class held out for evaluation
    pub test_size: f64,
    pub max_features: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("train.json"),
            model_dir: PathBuf::from("sentiment_model"),
            seed: 42,
            test_size: 0.2,
            max_features: crate::classifier::builder::DEFAULT_MAX_FEATURES,
        }
    }
}

/// What a training run produced.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub train_rows: usize,
    pub test_rows: usize,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub model_path: PathBuf,
    pub metadata_path: PathBuf,
}

/// Path of the pipeline artifact inside `model_dir`.
pub fn model_path<P: AsRef<Path>>(model_dir: P) -> PathBuf {
    model_dir.as_ref().join(MODEL_FILE_NAME)
}

/// Fits the default pipeline on the given rows.
pub fn train_model<S: AsRef<str>>(
    texts: &[S],
    labels: &[u8],
    max_features: usize,
) -> Result<TrainedClassifier, ClassifierError> {
    PipelineBuilder::new()
        .with_max_features(max_features)
        .fit(texts, labels)
}

/// Creates `model_dir` and writes the pipeline and its metadata into it.
///
/// Returns the paths of the pipeline file and the metadata file.
pub fn save_model<P: AsRef<Path>>(
    pipeline: &TrainedClassifier,
    model_dir: P,
) -> Result<(PathBuf, PathBuf), TrainingError> {
    let model_dir = model_dir.as_ref();
    fs::create_dir_all(model_dir).map_err(|source| TrainingError::Io {
        path: model_dir.to_path_buf(),
        source,
    })?;

    let pipeline_path = model_path(model_dir);
    pipeline.save(&pipeline_path)?;

    let metadata_path = model_dir.join(METADATA_FILE_NAME);
    let metadata = serde_json::to_vec(&ModelMetadata::default())?;
    fs::write(&metadata_path, metadata).map_err(|source| TrainingError::Io {
        path: metadata_path.clone(),
        source,
    })?;

    info!("Model and metadata saved to {:?}", model_dir);
    Ok((pipeline_path, metadata_path))
}

/// Loads the dataset, fits on a stratified train split, scores both splits and saves
/// the pipeline. The model is saved whatever its accuracy.
///
/// # Errors
/// - `Dataset(Empty)` before any split or fit when no valid rows survive loading
/// - any loader, fitting or I/O error
pub fn run_training(config: &TrainingConfig) -> Result<TrainingReport, TrainingError> {
    if !(config.test_size > 0.0 && config.test_size < 1.0) {
        return Err(TrainingError::InvalidConfig(format!(
            "test_size must be between 0 and 1, got {}",
            config.test_size
        )));
    }

    let dataset = load_dataset(&config.data_path)?;
    if dataset.is_empty() {
        return Err(DatasetError::Empty.into());
    }
    info!(
        "Dataset: {} rows, {:.1}% positive",
        dataset.len(),
        dataset.positive_fraction() * 100.0
    );

    let split = stratified_split(&dataset.labels, config.test_size, config.seed);
    let train = dataset.select(&split.train);
    let test = dataset.select(&split.test);
    info!("Split: {} train rows, {} test rows", train.len(), test.len());

    let pipeline = train_model(&train.texts, &train.labels, config.max_features)?;

    let train_accuracy = pipeline.score(&train.texts, &train.labels);
    let test_accuracy = pipeline.score(&test.texts, &test.labels);
    info!("Accuracy: train={:.3}, test={:.3}", train_accuracy, test_accuracy);

    let (model_path, metadata_path) = save_model(&pipeline, &config.model_dir)?;

    Ok(TrainingReport {
        train_rows: train.len(),
        test_rows: test.len(),
        train_accuracy,
        test_accuracy,
        model_path,
        metadata_path,
    })
}
