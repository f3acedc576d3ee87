#![allow(dead_code)]

use std::net::SocketAddr;

use axum::Router;
use env_logger::{Builder, Env};
use sentiment_demo::{PipelineBuilder, TrainedClassifier};
use tokio::net::TcpListener;

pub fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

const POSITIVE: [&str; 6] = ["great", "excellent", "wonderful", "loved", "amazing", "fantastic"];
const NEGATIVE: [&str; 6] = ["terrible", "awful", "boring", "hated", "bad", "dreadful"];
const SUBJECTS: [&str; 5] = ["movie", "film", "plot", "acting", "story"];

/// Small balanced corpus: 60 positive and 60 negative reviews.
pub fn fixture_corpus() -> (Vec<String>, Vec<u8>) {
    let mut texts = Vec::new();
    let mut labels = Vec::new();
    for (words, label) in [(POSITIVE, 1u8), (NEGATIVE, 0u8)] {
        for word in words {
            for subject in SUBJECTS {
                texts.push(format!("{} {}", word, subject));
                labels.push(label);
                texts.push(format!("the {} was {}", subject, word));
                labels.push(label);
            }
        }
    }
    (texts, labels)
}

/// The fixture corpus as a `train.json` document.
pub fn fixture_json() -> String {
    let (texts, labels) = fixture_corpus();
    let records: Vec<serde_json::Value> = texts
        .iter()
        .zip(&labels)
        .map(|(text, &label)| {
            let sentiment = if label == 1 { "positive" } else { "negative" };
            serde_json::json!({ "text": text, "sentiment": sentiment })
        })
        .collect();
    serde_json::Value::Array(records).to_string()
}

pub fn fixture_model() -> TrainedClassifier {
    let (texts, labels) = fixture_corpus();
    PipelineBuilder::new()
        .fit(&texts, &labels)
        .expect("fixture corpus should fit")
}

/// Serves `app` on an ephemeral local port.
pub async fn spawn_app(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });
    addr
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    listener.local_addr().expect("local addr")
}
