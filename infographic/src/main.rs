use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};

use infographic_core::collab::{LocalStore, ObjectStore};
use infographic_core::{LayoutConfig, render_product_grid};

#[derive(Parser, Debug)]
#[command(version, about = "Compose product grid infographics")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample product images and render the grid to a PNG
    Render(RenderArgs),
    /// Print the cell rectangles of the configured grid as JSON
    Grid {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Render, then copy the PNG into a local store and print its URL
    Publish {
        #[command(flatten)]
        render: RenderArgs,
        #[arg(long)]
        store: PathBuf,
        #[arg(long)]
        base_url: String,
        /// Object key; defaults to the output file name
        #[arg(long)]
        key: Option<String>,
    },
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[arg(short, long)]
    config: PathBuf,
    /// Root directory holding one subdirectory per category
    #[arg(short, long)]
    products: PathBuf,
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Seed for reproducible sampling
    #[arg(long)]
    seed: Option<u64>,
}

fn load_config(path: &Path) -> Result<LayoutConfig> {
    LayoutConfig::from_path(path)?
        .with_overrides(std::env::vars())
        .context("applying INFOGRAPHIC_* overrides")
}

fn render(args: &RenderArgs) -> Result<PathBuf> {
    let mut config = load_config(&args.config)?;
    if let Some(output) = &args.output {
        config.output = output.clone();
    }
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    render_product_grid(&config, &args.products, &mut rng)
        .with_context(|| format!("rendering products from {}", args.products.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    log::debug!("{cli:?}");

    match cli.command {
        Command::Render(args) => {
            let path = render(&args)?;
            println!("{}", path.display());
        }
        Command::Grid { config } => {
            let config = load_config(&config)?;
            let cells = config.grid_spec().cells();
            println!("{}", serde_json::to_string_pretty(&cells)?);
        }
        Command::Publish {
            render: args,
            store,
            base_url,
            key,
        } => {
            let path = render(&args)?;
            let key = match key {
                Some(k) => k,
                None => path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .context("output path has no file name")?,
            };
            let store = LocalStore::new(store, base_url);
            let url = store
                .upload(&path, &key)
                .with_context(|| format!("uploading {}", path.display()))?;
            println!("{url}");
        }
    }
    Ok(())
}
