//! HTTP surface: the JSON analysis endpoint and the browser form.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Json, Router,
};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::classifier::{localize_label, SentimentModel};

pub const ANALYSIS_PATH: &str = "/api/get_analysis";
pub const WIDGET_PATH: &str = "/gradio";
const WIDGET_TITLE: &str = "Анализатор настроения";

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn SentimentModel>,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisQuery {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisResponse {
    pub result: String,
}

#[derive(Debug, Deserialize)]
pub struct WidgetQuery {
    pub text: Option<String>,
}

/// Classifies `text` and renders the outcome as a user-facing sentence.
///
/// Never fails: prediction errors are rendered into the returned string.
pub fn predict_sentiment(model: &dyn SentimentModel, text: &str) -> String {
    match model.classify(text) {
        Ok(prediction) => format!(
            "Настроение: {}, Уверенность: {:.2}",
            localize_label(&prediction.label),
            prediction.confidence
        ),
        Err(e) => {
            debug!("Prediction failed for {:?}: {}", text, e);
            format!("Ошибка анализа: {}", e)
        }
    }
}

/// Runs [`predict_sentiment`] off the async workers, since inference is CPU-bound.
async fn analyze(model: Arc<dyn SentimentModel>, text: String) -> String {
    match tokio::task::spawn_blocking(move || predict_sentiment(model.as_ref(), &text)).await {
        Ok(result) => result,
        Err(e) => {
            error!("Prediction task failed: {}", e);
            format!("Ошибка анализа: {}", e)
        }
    }
}

pub async fn get_analysis(
    State(state): State<AppState>,
    Query(query): Query<AnalysisQuery>,
) -> Json<AnalysisResponse> {
    let result = analyze(Arc::clone(&state.model), query.text).await;
    Json(AnalysisResponse { result })
}

pub async fn widget(
    State(state): State<AppState>,
    Query(query): Query<WidgetQuery>,
) -> Html<String> {
    let result = match query.text {
        Some(text) => Some((analyze(Arc::clone(&state.model), text.clone()).await, text)),
        None => None,
    };
    Html(render_widget(result.as_ref().map(|(r, t)| (r.as_str(), t.as_str()))))
}

/// Builds the form page; `outcome` is `(result, submitted text)` after a submission.
fn render_widget(outcome: Option<(&str, &str)>) -> String {
    let (result, text) = outcome.unwrap_or(("", ""));
    format!(
        r#"<!DOCTYPE html>
<html lang="ru">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; max-width: 40rem; margin: 2rem auto; }}
textarea {{ width: 100%; min-height: 6rem; }}
output {{ display: block; margin-top: 1rem; padding: .75rem; background: #f3f3f3; min-height: 1.5rem; }}
</style>
</head>
<body>
<h1>{title}</h1>
<form method="get" action="{action}">
<label for="text">text</label>
<textarea id="text" name="text">{text}</textarea>
<button type="submit">Submit</button>
</form>
<output>{result}</output>
</body>
</html>
"#,
        title = WIDGET_TITLE,
        action = WIDGET_PATH,
        text = escape_html(text),
        result = escape_html(result),
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn router(model: Arc<dyn SentimentModel>) -> Router {
    Router::new()
        .route(ANALYSIS_PATH, get(get_analysis))
        .route(WIDGET_PATH, get(widget))
        .with_state(AppState { model })
}

/// Serves the API and the widget on `listener` until the process is stopped.
pub async fn serve(listener: TcpListener, model: Arc<dyn SentimentModel>) -> std::io::Result<()> {
    let info = model.info();
    info!(
        "Serving {} backend (labels: {:?}) on http://{}",
        info.backend,
        info.class_labels,
        listener.local_addr()?
    );
    axum::serve(listener, router(model)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassifierError, ClassifierInfo, Prediction};

    struct FixedModel(f64);

    impl SentimentModel for FixedModel {
        fn classify(&self, text: &str) -> Result<Prediction, ClassifierError> {
            if text.is_empty() {
                return Err(ClassifierError::ValidationError("Input text cannot be empty".into()));
            }
            Ok(Prediction {
                label: "NEUTRAL".to_string(),
                confidence: self.0,
            })
        }

        fn info(&self) -> ClassifierInfo {
            ClassifierInfo {
                backend: "fixed".to_string(),
                class_labels: vec!["NEUTRAL".to_string()],
                vocabulary_size: None,
            }
        }
    }

    #[test]
    fn test_result_sentence_format() {
        assert_eq!(
            predict_sentiment(&FixedModel(0.5049), "anything"),
            "Настроение: нейтральное, Уверенность: 0.50"
        );
    }

    #[test]
    fn test_confidence_rounds_at_full_precision() {
        // 0.8449999999 becomes 0.84500003 once narrowed to f32
        assert_eq!(
            predict_sentiment(&FixedModel(0.844_999_999_9), "anything"),
            "Настроение: нейтральное, Уверенность: 0.84"
        );
    }

    #[test]
    fn test_errors_become_result_strings() {
        let result = predict_sentiment(&FixedModel(0.5), "");
        assert_eq!(result, "Ошибка анализа: Validation error: Input text cannot be empty");
    }

    #[test]
    fn test_widget_escapes_user_text() {
        let page = render_widget(Some(("ok", "<script>alert('x')</script>")));
        assert!(page.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(!page.contains("<script>"));
        assert!(page.contains(WIDGET_TITLE));
    }
}
