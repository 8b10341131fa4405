use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

use docintel::config::load_optional_config;
use docintel::pipeline::{BroadcastProgress, Pipeline, PipelineConfig};
use docintel::processor::ExtractorRegistry;
use docintel::server::{self, AppState};
use docintel::{
    rehydrate_queue, AdmissionQueue, BlobStore, Database, DocintelError, DocumentWorker, Intake,
    OpenAiAnalyzer, StatusBroadcaster,
};

const DEFAULT_LOG_FILTER: &str = "docintel=info,tower_http=info";

#[derive(Parser)]
#[command(name = "docintel")]
#[command(about = "Document intelligence service: upload, extract, analyze, stream status")]
#[command(version)]
struct Args {
    /// JSON configuration file
    #[arg(long, env = "DOCINTEL_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration
    #[arg(long)]
    bind: Option<String>,
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true));

    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;
    Ok(())
}

#[tokio::main]
async fn main() -> docintel::Result<()> {
    let args = Args::parse();

    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let mut config = load_optional_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }

    tracing::info!("Starting docintel v{}", env!("CARGO_PKG_VERSION"));

    let db = Database::open(&config.resolved_database_path())?;
    let blobs = BlobStore::new(&config.upload_dir);
    let queue = Arc::new(AdmissionQueue::new());
    let broadcaster = StatusBroadcaster::new();

    let requeued = rehydrate_queue(&db, &queue)?;
    tracing::info!(requeued, "Rebuilt queue from database");
    tracing::info!("Queue snapshot: {:?}", queue.snapshot());

    let analyzer = OpenAiAnalyzer::from_config(&config.analysis)?;
    tracing::info!(model = analyzer.model(), "Analysis client ready");

    let pipeline = Arc::new(Pipeline::new(
        PipelineConfig::from_config(&config),
        db.clone(),
        blobs.clone(),
        Arc::new(ExtractorRegistry::new()),
        Arc::new(analyzer),
    ));

    let worker = DocumentWorker::new(
        Arc::clone(&queue),
        pipeline,
        Arc::new(BroadcastProgress::new(broadcaster.clone())),
        config.worker.poll_interval(),
    )
    .spawn();

    let intake = Arc::new(Intake::new(
        db,
        blobs,
        Arc::clone(&queue),
        config.max_upload_bytes,
    ));
    let state = AppState::new(intake, queue, broadcaster);

    let served = server::serve(&config.bind_address, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown signal received");
    })
    .await;

    worker.shutdown();
    worker.wait().await?;
    tracing::info!("Worker stopped");

    served.map_err(DocintelError::Server)
}
