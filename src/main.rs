use anyhow::Context as _;
use clap::Parser;
use fetcher::{plan_run, RunPlan, Runner};
use reddit_client::RedditClient;
use rfetcher_core::{ErrorExt, RedditCredentials, RunConfig, SaveMode};
use std::path::PathBuf;
use store::{generate_filename, normalize_custom, save, CategoryStore, OutputTarget, SaveOutcome};

#[derive(Debug, Parser)]
#[command(author, version, about = "Fetch filtered Reddit posts and comment trees to JSON")]
struct Cli {
    /// Run configuration (TOML).
    #[arg(short, long, default_value = "rfetcher.toml")]
    config: PathBuf,

    /// Output file; bare names are placed in the data directory.
    #[arg(short, long)]
    output: Option<String>,

    /// Merge into an existing output file instead of replacing it.
    #[arg(long)]
    append: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| {
            tracing_subscriber::EnvFilter::try_new(
                "rfetcher=info,fetcher=info,reddit_client=info,store=info",
            )
        })
        .context("build log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let mut config = RunConfig::load(&cli.config)
        .with_context(|| format!("load run configuration {}", cli.config.display()))?;
    if cli.append {
        config.mode = SaveMode::Append;
    }

    tracing::info!("Starting RFetcher for r/{}", config.subreddit);

    let categories = CategoryStore::load(&config.categories_file)
        .with_context(|| format!("load categories {}", config.categories_file.display()))?;
    let plan = plan_run(&config, categories.categories()).map_err(|e| {
        e.log_error();
        anyhow::anyhow!(e.user_friendly_message())
    })?;

    let credentials = RedditCredentials::from_env().context("read Reddit credentials")?;
    let client = RedditClient::new(credentials).context("create Reddit client")?;
    match client.get_user_info().await {
        Ok(user) => tracing::info!("Authenticated as u/{}", user.name),
        Err(e) => {
            e.log_error();
            anyhow::bail!("authentication failed: {}", e.user_friendly_message());
        }
    }

    let runner = Runner::new(&client);
    let document = runner.run(&config, &plan).await;
    tracing::info!("Collected {} posts", document.post_count());

    let path = match cli.output.as_deref() {
        Some(name) => normalize_custom(&config.data_dir, name),
        None => match &config.output {
            Some(output) => normalize_custom(&config.data_dir, &output.to_string_lossy()),
            None => {
                let target = match &plan {
                    RunPlan::Unfiltered { .. } => OutputTarget::NoCategory,
                    RunPlan::Single { category, .. } => OutputTarget::Category(category),
                    RunPlan::Multi { .. } => OutputTarget::AllCategories,
                };
                generate_filename(
                    &config.data_dir,
                    &config.subreddit,
                    target,
                    chrono::Local::now().naive_local(),
                )
            }
        },
    };

    let value = document.to_value().context("serialize results")?;
    match save(&value, &path, config.mode) {
        Ok(SaveOutcome::ShapeMismatchOverwritten) => {
            tracing::warn!("Existing file had a different shape and was overwritten")
        }
        Ok(_) => {}
        Err(e) => {
            e.log_error();
            return Err(e).with_context(|| format!("save results to {}", path.display()));
        }
    }

    Ok(())
}
