//! Sentiment analysis for short texts, served over HTTP and Telegram.
//!
//! Two interchangeable classifiers implement [`SentimentModel`]:
//!
//! - [`TrainedClassifier`]: a TF-IDF + logistic regression pipeline trained from a JSON
//!   dataset (see [`training`]) and persisted as `sentiment_model.json`
//! - [`PretrainedClassifier`]: a DistilBERT SST-2 model run with ONNX Runtime, downloaded
//!   and verified by [`ModelManager`]
//!
//! [`service`] exposes a model as `GET /api/get_analysis` plus a browser form, and
//! [`bot`] relays Telegram messages to that endpoint.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use sentiment_demo::{PipelineBuilder, SentimentModel};
//!
//! let texts = ["great movie", "awful plot", "loved it", "terrible acting"];
//! let labels = [1, 0, 1, 0];
//! let model = PipelineBuilder::new().fit(&texts, &labels)?;
//!
//! let prediction = model.classify("what a great film")?;
//! println!("{} ({:.2})", prediction.label, prediction.confidence);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! Models are immutable once built and can be shared across threads using `Arc`:
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use sentiment_demo::{PipelineBuilder, SentimentModel};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let model: Arc<dyn SentimentModel> =
//!     Arc::new(PipelineBuilder::new().fit(&["good", "bad"], &[1, 0])?);
//!
//! let handles: Vec<_> = (0..3)
//!     .map(|_| {
//!         let model = Arc::clone(&model);
//!         thread::spawn(move || model.classify("good").is_ok())
//!     })
//!     .collect();
//!
//! for handle in handles {
//!     assert!(handle.join().unwrap_or(false));
//! }
//! # Ok(())
//! # }
//! ```

pub mod bot;
pub mod classifier;
pub mod model_manager;
pub mod models;
mod runtime;
pub mod service;
pub mod training;

pub use classifier::{
    localize_label, ClassWeight, ClassifierError, ClassifierInfo, PipelineBuilder, Prediction,
    PretrainedClassifier, SentimentModel, TrainedClassifier,
};
pub use model_manager::{ModelError, ModelManager};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo};
pub use runtime::{create_session_builder, OptimizationLevel, RuntimeConfig};
pub use service::predict_sentiment;

/// Initialises `env_logger`, defaulting to the `info` level when `RUST_LOG` is unset.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
