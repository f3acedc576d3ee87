/// Pretrained sentiment models that can be downloaded and run locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinModel {
    /// DistilBERT fine-tuned on SST-2, exported to ONNX.
    DistilBertSst2,
}

/// Where a model's files live and how to verify them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Directory name inside the model cache
    pub name: String,
    pub model_url: String,
    pub tokenizer_url: String,
    /// Pinned SHA-256 of the ONNX file. When absent the hash recorded at download time
    /// is used for later verification.
    pub model_hash: Option<String>,
    pub tokenizer_hash: Option<String>,
}

/// Static properties of a model that the classifier needs at inference time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCharacteristics {
    pub max_sequence_length: usize,
    /// Output labels in logit order
    pub labels: Vec<String>,
    pub model_size_mb: usize,
}

impl BuiltinModel {
    pub fn get_model_info(&self) -> ModelInfo {
        match self {
            BuiltinModel::DistilBertSst2 => {
                let repo = "https://huggingface.co/Xenova/distilbert-base-uncased-finetuned-sst-2-english/resolve/main";
                ModelInfo {
                    name: "distilbert-sst2".to_string(),
                    model_url: format!("{}/onnx/model.onnx", repo),
                    tokenizer_url: format!("{}/tokenizer.json", repo),
                    model_hash: None,
                    tokenizer_hash: None,
                }
            }
        }
    }

    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            BuiltinModel::DistilBertSst2 => ModelCharacteristics {
                max_sequence_length: 512,
                labels: vec!["NEGATIVE".to_string(), "POSITIVE".to_string()],
                model_size_mb: 268,
            },
        }
    }
}
