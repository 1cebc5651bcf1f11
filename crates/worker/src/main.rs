use std::sync::Arc;

use animforge_core::config::RenderConfig;
use animforge_core::fallback::placeholder::PlaceholderProducer;
use animforge_core::render::orchestrator::RenderOrchestrator;
use animforge_core::scripting::renderer::ManimRenderer;
use animforge_pipeline::generation::{backend_from_config, GenerationConfig};
use animforge_pipeline::prompt_source::{ActivePromptSource, DbPromptSource, StaticPromptSource};
use animforge_pipeline::{AnimationPipeline, GenerationRequest};
use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: animforge-worker <request-id> <prompt...>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "animforge_worker=debug,animforge_core=info,animforge_pipeline=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let request_id = args.next().context(USAGE)?;
    let prompt = args.collect::<Vec<_>>().join(" ");

    let render_config = RenderConfig::from_env()?;
    let generation_config = GenerationConfig::from_env()?;

    let prompts: Arc<dyn ActivePromptSource> = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = animforge_db::create_pool(&url)
                .await
                .context("failed to connect to the prompt store")?;
            sqlx::migrate!("../../db/migrations").run(&pool).await?;
            tracing::info!("Prompt store connected");
            Arc::new(DbPromptSource::new(pool))
        }
        Err(_) => {
            tracing::info!("DATABASE_URL not set, using the built-in system prompt");
            Arc::new(StaticPromptSource::default())
        }
    };

    let backend = backend_from_config(&generation_config)?;
    let orchestrator = RenderOrchestrator::new(
        render_config.clone(),
        ManimRenderer::from_config(&render_config),
        PlaceholderProducer::from_config(&render_config),
    );
    let pipeline = AnimationPipeline::new(backend, prompts, orchestrator);

    tracing::info!(%request_id, work_dir = %render_config.work_dir.display(), "Worker starting");
    let result = pipeline
        .generate(&GenerationRequest::new(request_id, prompt))
        .await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
