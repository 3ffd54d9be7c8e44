use async_openai::{config::OpenAIConfig, Client as OpenAiClient};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use phrase_study_backend::controllers::phrase::PhraseController;
use phrase_study_backend::domain::phrase::PhraseService;
use phrase_study_backend::domain::playback::PlaybackService;
use phrase_study_backend::domain::voice::PlaybackOrder;
use phrase_study_backend::infrastructure::config::{Config, LogFormat};
use phrase_study_backend::infrastructure::db::{check_connection, create_pool, run_migrations};
use phrase_study_backend::infrastructure::http::start_http_server;
use phrase_study_backend::infrastructure::repositories::{
    OpenAiTranslationRepository, PhraseIndexRepository, PhraseLogRepository,
    PollySpeechRepository, SpeechRepository, TrackRepository, TranslationRepository,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting Phrase Study Backend on {}:{}",
        config.host,
        config.port
    );

    // Prepare the data folder
    tokio::fs::create_dir_all(&config.data_folder).await?;
    tracing::info!(data_folder = %config.data_folder.display(), "Data folder ready");

    // Create index connection pool
    let pool = create_pool(&config.database_url).await?;
    tracing::info!("Index connection pool created");

    run_migrations(&pool).await?;
    tracing::info!("Index migrations applied");

    // Verify index connection
    check_connection(&pool).await?;
    tracing::info!("Index connection verified");

    // Create AWS Polly client
    tracing::info!("Initializing AWS Polly client with region: {}", config.aws_region);

    let has_access_key = std::env::var("AWS_ACCESS_KEY_ID").is_ok();
    let has_secret_key = std::env::var("AWS_SECRET_ACCESS_KEY").is_ok();
    if !has_access_key || !has_secret_key {
        tracing::warn!("AWS credentials not found in environment variables. Will attempt to use other credential providers (instance metadata, etc.)");
    }

    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.aws_region.clone()))
        .load()
        .await;
    let polly_client = Arc::new(aws_sdk_polly::Client::new(&aws_config));
    tracing::info!("AWS Polly client initialized successfully");

    // OPENAI_API_KEY is read from the environment by the client
    if std::env::var("OPENAI_API_KEY").is_err() {
        tracing::warn!("OPENAI_API_KEY not set; phrase generation will fail");
    }
    let openai_client = Arc::new(OpenAiClient::<OpenAIConfig>::new());

    let pool = Arc::new(pool);
    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate repositories
    tracing::info!("Instantiating repositories...");
    let index_repo = Arc::new(PhraseIndexRepository::new(pool.clone()));
    let log_repo = Arc::new(PhraseLogRepository::new(
        config.log_path(),
        config.log_cache_enabled,
    ));
    let track_repo = Arc::new(TrackRepository::new(config.tracks_dir()));
    track_repo.ensure_dir().await?;

    let translation_repo: Arc<dyn TranslationRepository> = Arc::new(
        OpenAiTranslationRepository::new(openai_client, config.openai_model.clone()),
    );
    let speech_repo: Arc<dyn SpeechRepository> =
        Arc::new(PollySpeechRepository::new(polly_client));

    // Generations interrupted by a previous shutdown never became visible
    let purged = index_repo.purge_pending().await?;
    if purged > 0 {
        tracing::warn!(purged = purged, "Discarded unfinished generations");
    }

    // 2. Instantiate services
    tracing::info!("Instantiating services...");
    let playback_order = Arc::new(PlaybackOrder::japanese_study());
    let playback_service = Arc::new(PlaybackService::new(
        track_repo.clone(),
        playback_order.clone(),
    ));
    let phrase_service = Arc::new(PhraseService::new(
        index_repo,
        log_repo,
        track_repo,
        translation_repo,
        speech_repo,
        playback_service,
        playback_order,
        config.external_call_timeout(),
    ));

    // 3. Instantiate controllers
    tracing::info!("Instantiating controllers...");
    let phrase_controller = Arc::new(PhraseController::new(phrase_service));

    // Start HTTP server with all routes
    start_http_server(pool, config, phrase_controller).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "phrase_study_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "phrase_study_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
