use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use tokio::net::TcpListener;

use sentiment_demo::bot::{self, SentimentApiClient, DEFAULT_API_URL};
use sentiment_demo::training::{self, TrainingConfig};
use sentiment_demo::{
    BuiltinModel, ModelManager, PretrainedClassifier, RuntimeConfig, SentimentModel,
    TrainedClassifier,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train the TF-IDF + logistic regression pipeline from a JSON dataset
    Train {
        /// JSON array of {"text", "sentiment"} records
        #[arg(long, default_value = "train.json")]
        data: PathBuf,
        #[arg(long, default_value = "sentiment_model")]
        model_dir: PathBuf,
        /// Seed of the train/test shuffle
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = sentiment_demo::classifier::builder::DEFAULT_MAX_FEATURES)]
        max_features: usize,
        /// Fraction of the data held out for evaluation
        #[arg(long, default_value_t = 0.2)]
        test_size: f64,
    },
    /// Serve the analysis API and the browser form
    Serve {
        #[arg(long, value_enum, default_value_t = Backend::Trained)]
        backend: Backend,
        /// Directory holding the trained pipeline
        #[arg(long, default_value = "sentiment_model")]
        model_dir: PathBuf,
        #[arg(long, default_value = "localhost")]
        host: String,
        #[arg(long, default_value_t = 7860)]
        port: u16,
        /// Force a fresh download of the pretrained model files
        #[arg(short, long)]
        fresh: bool,
    },
    /// Run the Telegram bot against a running analysis API
    Bot {
        /// Telegram bot token
        #[arg(long, env = "SENTIMENT_BOT_TOKEN", hide_env_values = true)]
        token: String,
        #[arg(long, default_value = DEFAULT_API_URL)]
        api_url: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Pipeline produced by `train`
    Trained,
    /// DistilBERT SST-2 through ONNX Runtime
    Pretrained,
}

fn train(config: TrainingConfig) -> ExitCode {
    println!("Загрузка и проверка данных...");
    let start_time = Instant::now();
    match training::run_training(&config) {
        Ok(report) => {
            println!(
                "Обучение модели на {} примерах (тест: {})",
                report.train_rows, report.test_rows
            );
            println!(
                "Точность модели: train={:.3}, test={:.3}",
                report.train_accuracy, report.test_accuracy
            );
            println!("Модель и метаданные сохранены в {}/", config.model_dir.display());
            info!("Training took {:.2?}", start_time.elapsed());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Ошибка: {}", e);
            eprintln!("Проверьте:");
            eprintln!("1. Структуру JSON-файла (должны быть поля 'text' и 'sentiment')");
            eprintln!("2. Значения в поле 'sentiment' (должны быть 'negative' или 'positive')");
            eprintln!("3. Отсутствие пропущенных значений в данных");
            ExitCode::FAILURE
        }
    }
}

async fn load_backend(
    backend: Backend,
    model_dir: PathBuf,
    fresh: bool,
) -> anyhow::Result<Arc<dyn SentimentModel>> {
    match backend {
        Backend::Trained => {
            let path = training::model_path(&model_dir);
            let model = TrainedClassifier::load(&path)
                .with_context(|| format!("cannot start without a trained model at {:?}", path))?;
            Ok(Arc::new(model))
        }
        Backend::Pretrained => {
            let model = BuiltinModel::DistilBertSst2;
            let model_info = model.get_model_info();
            let manager = ModelManager::new_default()?;

            if fresh {
                info!("Fresh download requested - removing any existing model files...");
                manager.remove_download(&model_info.name)?;
            }
            manager.ensure_model_downloaded(&model_info).await?;

            let start_time = Instant::now();
            let classifier =
                PretrainedClassifier::from_builtin(model, &manager, &RuntimeConfig::default())?;
            info!("Pretrained model loaded in {:.2?}", start_time.elapsed());
            Ok(Arc::new(classifier))
        }
    }
}

async fn serve(
    backend: Backend,
    model_dir: PathBuf,
    host: String,
    port: u16,
    fresh: bool,
) -> anyhow::Result<()> {
    let model = load_backend(backend, model_dir, fresh).await?;
    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("failed to bind {}:{}", host, port))?;
    sentiment_demo::service::serve(listener, model).await?;
    Ok(())
}

async fn run_bot(token: String, api_url: String) -> anyhow::Result<()> {
    anyhow::ensure!(!token.trim().is_empty(), "the bot token must not be empty");
    info!("Forwarding messages to {}", api_url);
    bot::run(teloxide::Bot::new(token), SentimentApiClient::new(api_url)).await;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    sentiment_demo::init_logger();
    let args = Args::parse();

    let result = match args.command {
        Command::Train {
            data,
            model_dir,
            seed,
            max_features,
            test_size,
        } => {
            return train(TrainingConfig {
                data_path: data,
                model_dir,
                seed,
                test_size,
                max_features,
            })
        }
        Command::Serve {
            backend,
            model_dir,
            host,
            port,
            fresh,
        } => serve(backend, model_dir, host, port, fresh).await,
        Command::Bot { token, api_url } => run_bot(token, api_url).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
