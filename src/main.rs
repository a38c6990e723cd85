use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use feedgen::cli::{Cli, Commands};
use feedgen::config::{read_site_config, Config};
use feedgen::domain::FeedExtractionPlan;
use feedgen::errors::FeederResult;
use feedgen::services::{output_file_name, resolve, GenerateService};
use feedgen::sources::HttpDocumentProvider;
use feedgen::storage::DirectoryFeedWriter;

fn main() {
    init_logging();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run() -> FeederResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            config_file,
            output_dir,
            stdout,
        } => cmd_generate(&config_file, output_dir, stdout),
        Commands::Validate { config_file } => cmd_validate(&config_file),
    }
}

fn load_plan(config_file: &Path) -> FeederResult<FeedExtractionPlan> {
    let raw = read_site_config(config_file)?;
    Ok(resolve(&raw)?)
}

fn cmd_generate(config_file: &Path, output_dir: Option<PathBuf>, stdout: bool) -> FeederResult<()> {
    // Validate before touching the network
    let plan = load_plan(config_file)?;
    let config = Config::from_env()?;

    let output_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
    let provider = HttpDocumentProvider::new(&config);
    let writer = DirectoryFeedWriter::new(output_dir);
    let mut service = GenerateService::new(provider, writer);

    if stdout {
        let feed = service.render(&plan)?;
        io::stdout().write_all(&feed.rss)?;
        return Ok(());
    }

    println!("Scraping {}...", plan.website_url);

    let (feed, path) = service.generate(&plan)?;

    println!(
        "RSS feed generated and saved as \"{}\" ({} items).",
        path.display(),
        feed.item_count
    );

    Ok(())
}

fn cmd_validate(config_file: &Path) -> FeederResult<()> {
    let plan = load_plan(config_file)?;

    println!("Configuration is valid.");
    println!("  Website: {}", plan.website_url);
    println!("  Title: {}", plan.website_title);
    println!("  Posts: {}", plan.posts_list_selector);
    println!("  Title selector: {}", plan.title_selector);
    println!("  Link selector: {}", plan.link_selector);
    if let Some(selector) = &plan.description_selector {
        println!(
            "  Description: {} ({})",
            selector,
            plan.description_type.as_str()
        );
    }
    if let Some(selector) = &plan.image_selector {
        println!("  Image: {}", selector);
    }
    if let Some(date) = &plan.date {
        println!("  Date: {} ({})", date.selector, date.format);
    }
    if let Some(ttl) = plan.ttl_minutes {
        println!("  TTL: {} minutes", ttl);
    }
    println!("  Output file: {}", output_file_name(&plan));

    Ok(())
}
