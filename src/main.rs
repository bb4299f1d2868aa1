use clap::{Parser, Subcommand};
use quillpost::comments::{CommentForm, HttpCommentSink};
use quillpost::config::{self, SiteConfig};
use quillpost::render::{RenderContext, render_post_page};
use quillpost::repository::{ContentRepository, FixtureRepository, HttpRepository};
use quillpost::server::{self, AppState};
use quillpost::{generate, loader, output, paths};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quillpost")]
#[command(about = "Blog article pages from a headless content repository")]
#[command(long_about = "\
Blog article pages from a headless content repository

Articles, authors and comments live in a hosted document store. Each article
is rendered at /post/<slug> with its author byline, rich-text body, approved
comments and a comment form. New comments are relayed to a submission
endpoint and appear once a moderator approves them.

Repository identifiers come from config.toml or the environment:

  SANITY_PROJECT_ID   project identifier
  SANITY_DATASET      dataset name
  SANITY_API_TOKEN    token for private datasets (optional)

A .env file in the working directory is read first.

Run 'quillpost gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    /// Read documents from an NDJSON dataset export instead of the hosted API
    #[arg(long, global = true)]
    dataset_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every article route
    Paths,
    /// Render one article page to stdout
    Render {
        /// Article slug
        slug: String,
    },
    /// Render every article to static HTML
    Build {
        /// Output directory
        #[arg(long, default_value = "dist")]
        output: PathBuf,
    },
    /// Serve article pages with periodic regeneration
    Serve {
        /// Listen port
        #[arg(long, default_value_t = 3000)]
        port: u16,
        /// Render every known article before accepting requests
        #[arg(long)]
        prerender: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,quillpost=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let site_config = load_site_config(&cli.config_dir, cli.dataset_file.as_deref())?;
    let repo = open_repository(&site_config, cli.dataset_file.as_deref())?;

    match cli.command {
        Command::Paths => {
            let static_paths = paths::enumerate_paths(repo.as_ref()).await?;
            output::print_paths_output(&static_paths, &site_config.pages);
        }
        Command::Render { slug } => {
            let result =
                loader::load_article(repo.as_ref(), &slug, site_config.pages.revalidate()).await?;
            let ctx = RenderContext::from_config(&site_config);
            let Some(article) = result.article() else {
                return Err(format!("no article with slug '{}'", slug).into());
            };
            println!(
                "{}",
                render_post_page(article, &CommentForm::new(), &ctx).into_string()
            );
        }
        Command::Build { output: out_dir } => {
            println!("==> Building article pages \u{2192} {}", out_dir.display());
            let report = generate::generate(repo.as_ref(), &site_config, &out_dir).await?;
            output::print_generate_output(&report);
            println!("==> Build complete: {}", out_dir.display());
        }
        Command::Serve { port, prerender } => {
            let sink = HttpCommentSink::new(site_config.submission.endpoint.clone())?;
            let state = AppState::new(
                repo,
                Arc::new(sink),
                RenderContext::from_config(&site_config),
                site_config.pages.revalidate(),
            );
            server::serve(state, port, prerender).await?;
        }
        // Printed before config loading
        Command::GenConfig => {}
    }

    Ok(())
}

/// Load config. An offline dataset needs no repository credentials, so
/// missing identifiers are filled with placeholders before validation.
fn load_site_config(
    config_dir: &Path,
    dataset_file: Option<&Path>,
) -> Result<SiteConfig, config::ConfigError> {
    if dataset_file.is_none() {
        return config::load_config(config_dir);
    }
    let _ = dotenvy::dotenv();
    let mut site_config = config::load_raw_config(config_dir)?.unwrap_or_default();
    site_config.apply_env(|key| std::env::var(key).ok());
    if site_config.repository.project_id.is_empty() {
        site_config.repository.project_id = "offline".into();
    }
    if site_config.repository.dataset.is_empty() {
        site_config.repository.dataset = "production".into();
    }
    site_config.validate()?;
    Ok(site_config)
}

fn open_repository(
    site_config: &SiteConfig,
    dataset_file: Option<&Path>,
) -> Result<Arc<dyn ContentRepository>, Box<dyn std::error::Error>> {
    let repo: Arc<dyn ContentRepository> = match dataset_file {
        Some(path) => {
            tracing::info!(path = %path.display(), "using dataset export");
            Arc::new(FixtureRepository::load(path)?)
        }
        None => Arc::new(HttpRepository::new(&site_config.repository)?),
    };
    Ok(repo)
}
