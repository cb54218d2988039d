use anyhow::Context;
use clap::Parser;
use quiverfeed_core::identifier::map_file::MapFileIdentifierResolver;
use quiverfeed_core::identifier::map_files_dir;
use quiverfeed_core::ingest::companies::list_companies;
use quiverfeed_core::ingest::provider::QuiverHttpClient;
use quiverfeed_core::pipeline::{config, Pipeline, PipelineConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "quiverfeed_worker")]
struct Args {
    /// Output directory for per-ticker files; universe files go under `universe/`.
    #[arg(long, default_value = config::DEFAULT_DESTINATION)]
    destination: PathBuf,

    /// Data folder holding `equity/{market}/map_files`.
    #[arg(long, default_value = "/Lean/Data")]
    data_folder: PathBuf,

    #[arg(long, default_value = config::DEFAULT_DATASET)]
    dataset: String,

    #[arg(long, default_value = config::DEFAULT_MARKET)]
    market: String,

    /// Write per-ticker files only.
    #[arg(long)]
    no_universe: bool,

    /// Fetch and log the company list without writing anything.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = quiverfeed_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let client = QuiverHttpClient::from_settings(&settings)?;

    if args.dry_run {
        let companies = list_companies(&client).await?;
        tracing::info!(
            dry_run = true,
            companies_len = companies.len(),
            "listed companies; nothing written"
        );
        return Ok(());
    }

    let resolver = if args.no_universe {
        None
    } else {
        load_resolver(&args.data_folder, &args.market)?
    };

    let mut cfg = PipelineConfig::new(args.destination.clone()).with_env_overrides();
    cfg.dataset = args.dataset;
    cfg.market = args.market;

    let mut pipeline = Pipeline::new(&client, cfg);
    if let Some(resolver) = &resolver {
        pipeline = pipeline.with_resolver(resolver);
    }

    match pipeline.run().await {
        Ok(stats) => {
            tracing::info!(
                companies = stats.companies,
                written = stats.written,
                no_data = stats.no_data,
                abandoned = stats.abandoned,
                "run complete"
            );
            Ok(())
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %format!("{err:#}"), "run failed");
            Err(err)
        }
    }
}

fn load_resolver(
    data_folder: &Path,
    market: &str,
) -> anyhow::Result<Option<MapFileIdentifierResolver>> {
    let dir = map_files_dir(data_folder, market);
    if !dir.is_dir() {
        tracing::warn!(
            dir = %dir.display(),
            "map files directory not found; universe files disabled"
        );
        return Ok(None);
    }

    let resolver = MapFileIdentifierResolver::load_dir(&dir)
        .with_context(|| format!("failed to load map files from {}", dir.display()))?;
    tracing::info!(
        dir = %dir.display(),
        map_files = resolver.index().len(),
        "loaded map files"
    );
    Ok(Some(resolver))
}

fn init_sentry(settings: &quiverfeed_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
