//! Clipmark - browse a folder of videos and annotate them in the browser

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clipmark_core::colored_logger::{init_component_logger, Component};
use clipmark_core::config::{Config, Overrides};
use clipmark_store::{video_name, AnnotationStore, VideoLibrary};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "clipmark")]
#[command(about = "Local web tool for annotating a folder of videos")]
#[command(version)]
struct Cli {
    /// Defaults to `serve`
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory containing the videos
    #[arg(long, global = true)]
    video_dir: Option<PathBuf>,

    /// Directory containing the annotation document
    #[arg(long, global = true)]
    results_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the annotation web server
    Serve {
        /// Web server port (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List videos and whether each one has saved annotations
    List,

    /// Print the saved annotation for a video
    Show {
        /// Video name (file name without extension)
        name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Serve { port: None });

    let component = match command {
        Commands::Serve { .. } => Component::Serve,
        Commands::List | Commands::Show { .. } => Component::Cli,
    };
    init_component_logger(component, cli.verbose)?;

    let overrides = Overrides {
        video_dir: cli.video_dir,
        results_dir: cli.results_dir,
        port: match command {
            Commands::Serve { port } => port,
            _ => None,
        },
    };
    let config = Config::load(cli.config.as_deref(), &overrides)?;

    match command {
        Commands::Serve { .. } => cmd_serve(config)?,
        Commands::List => cmd_list(&config)?,
        Commands::Show { name } => cmd_show(&config, &name)?,
    }

    Ok(())
}

fn open_stores(config: &Config) -> Result<(VideoLibrary, AnnotationStore)> {
    let library = VideoLibrary::open(&config.video_dir)
        .with_context(|| format!("failed to open video directory {:?}", config.video_dir))?;
    let annotations = AnnotationStore::open_file(&config.results_dir, &config.results_file)
        .with_context(|| format!("failed to open results directory {:?}", config.results_dir))?;
    Ok((library, annotations))
}

#[tokio::main]
async fn cmd_serve(config: Config) -> Result<()> {
    let (library, annotations) = open_stores(&config)?;

    info!("video directory: {:?}", config.video_dir);
    info!("annotations: {:?}", config.results_path());

    let video_count = library.list_videos()?.len();
    info!("found {} video(s)", video_count);

    let state = clipmark_web::AppState::new(library, annotations);
    clipmark_web::serve(state, config.socket_addr()).await?;

    Ok(())
}

fn cmd_list(config: &Config) -> Result<()> {
    let (library, annotations) = open_stores(config)?;
    let videos = library.list_videos()?;

    if videos.is_empty() {
        println!("no videos found in {:?}", config.video_dir);
        return Ok(());
    }

    let saved = annotations.load().into_document();

    println!("found {} video(s) in {:?}:\n", videos.len(), config.video_dir);
    for (i, file) in videos.iter().enumerate() {
        let marker = if saved.contains_key(video_name(file)) {
            "annotated"
        } else {
            ""
        };
        println!("  [{}] {} {}", i, file, marker);
    }

    Ok(())
}

fn cmd_show(config: &Config, name: &str) -> Result<()> {
    let (_, annotations) = open_stores(config)?;

    match annotations.get(name) {
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => println!("no annotation saved for '{}'", name),
    }

    Ok(())
}
