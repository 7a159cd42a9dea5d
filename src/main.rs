use form_autofill::api;
use form_autofill::autofill::{FixedDelayPacer, FormFiller};
use form_autofill::config::{AnswerMode, AutofillConfig, IndexPolicy, DEFAULT_CORPUS_DIR, DEFAULT_PORT};
use form_autofill::providers::{create_completion_provider, create_embedding_provider};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use clap::builder::BoolishValueParser;
use clap::Parser;
use dotenv::dotenv;
use tokio::net::TcpListener;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Answers form fields from a local document corpus", long_about = None)]
struct Args {
    #[arg(long, env = "AUTOFILL_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "AUTOFILL_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Directory of PDF/text documents to answer from
    #[arg(long, env = "AUTOFILL_CORPUS_DIR", default_value = DEFAULT_CORPUS_DIR)]
    corpus_dir: PathBuf,

    /// Answer strategy: "batched" or "single"
    #[arg(long, env = "AUTOFILL_ANSWER_MODE", default_value = "batched")]
    mode: AnswerMode,

    /// Build the index once and reuse it for every request
    #[arg(long, env = "AUTOFILL_CACHE_INDEX", value_parser = BoolishValueParser::new())]
    cache_index: bool,

    #[arg(long, env = "AUTOFILL_MAX_CONCURRENT_REQUESTS", default_value_t = 4)]
    max_concurrent_requests: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let mut config = AutofillConfig::from_env()?;
    config.corpus_dir = args.corpus_dir;
    config.answer_mode = args.mode;
    if args.cache_index {
        config.index_policy = IndexPolicy::Cached;
    }

    let completion = create_completion_provider(&config)?;
    let embedding = create_embedding_provider(&config)?;
    let pacer = Arc::new(FixedDelayPacer::new(config.batch_delay));
    let filler = Arc::new(FormFiller::from_config(&config, completion, embedding, pacer));

    log::info!(
        "Answering from {} ({:?} mode, {:?} index)",
        config.corpus_dir.display(),
        config.answer_mode,
        config.index_policy
    );

    let app = api::create_api(filler, args.max_concurrent_requests);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(&addr).await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    log::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
