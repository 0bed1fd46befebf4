//! deals-crawler - Deal listing scraper with affiliate share-link capture.

use anyhow::Result;
use clap::{Parser, Subcommand};
use deals_crawler::commands::ScrapeCommand;
use deals_crawler::config::{Config, HeaderLocale};
use deals_crawler::sites::Site;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "deals-crawler",
    version,
    about = "Deal listing scraper with affiliate share-link capture",
    long_about = "Collects deal listings from Mercado Livre and Amazon Brasil through a \
                  real Chrome session, resolves per-product affiliate share links, and \
                  exports everything as a spreadsheet."
)]
struct Cli {
    /// Site to scrape
    #[arg(short, long, default_value = "mercado-livre", global = true, env = "DEALS_SITE")]
    site: Site,

    /// WebDriver endpoint
    #[arg(long, global = true, env = "DEALS_WEBDRIVER_URL")]
    webdriver_url: Option<String>,

    /// Run the browser without a visible window
    #[arg(long, global = true, env = "DEALS_HEADLESS")]
    headless: bool,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape deal listings and export a spreadsheet
    #[command(alias = "run")]
    Scrape {
        /// Listing URLs to collect; defaults to the site's deals page
        urls: Vec<String>,

        /// Chrome user-data directory with a logged-in affiliate profile
        #[arg(long)]
        profile_dir: Option<PathBuf>,

        /// Profile name inside the user-data directory
        #[arg(long)]
        profile_name: Option<String>,

        /// Output directory for spreadsheets and failure screenshots
        #[arg(short, long = "output-dir")]
        output_dir: Option<PathBuf>,

        /// Spreadsheet header language (pt, en)
        #[arg(long)]
        locale: Option<HeaderLocale>,

        /// Stop after the listing pass (no product visits)
        #[arg(long)]
        skip_details: bool,

        /// Base delay between product visits in milliseconds
        #[arg(long, env = "DEALS_DELAY")]
        delay: Option<u64>,
    },

    /// List supported sites
    Sites,

    /// Replay a recorded macro script
    #[cfg(feature = "input")]
    Replay {
        /// TOML script to replay
        script: PathBuf,

        /// Override the script's repetition count
        #[arg(short, long)]
        repetitions: Option<u32>,
    },

    /// Report the pointer position after a countdown, for calibrating
    /// macro coordinates
    #[cfg(feature = "input")]
    Probe {
        /// Countdown in seconds
        #[arg(short, long, default_value = "3")]
        countdown: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    config.site = cli.site;
    if let Some(url) = cli.webdriver_url {
        config.webdriver_url = url;
    }
    if cli.headless {
        config.headless = true;
    }

    match cli.command {
        Commands::Scrape {
            urls,
            profile_dir,
            profile_name,
            output_dir,
            locale,
            skip_details,
            delay,
        } => {
            if let Some(dir) = profile_dir {
                config.profile_dir = Some(dir);
            }
            if let Some(name) = profile_name {
                config.profile_name = Some(name);
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if let Some(locale) = locale {
                config.header_locale = locale;
            }
            if skip_details {
                config.skip_details = true;
            }
            if let Some(delay) = delay {
                config.delay_ms = delay;
            }

            let cmd = ScrapeCommand::new(config);
            let path = cmd.execute(&urls).await?;
            println!("{}", path.display());
        }

        Commands::Sites => {
            println!("Supported sites:\n");
            println!("{:<16} {:<24} {}", "Name", "Domain", "Deals page");
            println!("{:-<16} {:-<24} {:-<40}", "", "", "");

            for site in Site::all() {
                println!("{:<16} {:<24} {}", site.to_string(), site.domain(), site.deals_url());
            }
        }

        #[cfg(feature = "input")]
        Commands::Replay { script, repetitions } => {
            use deals_crawler::commands::ReplayCommand;
            let completed = ReplayCommand::execute(&script, repetitions).await?;
            println!("{} iterations completed", completed);
        }

        #[cfg(feature = "input")]
        Commands::Probe { countdown } => {
            use deals_crawler::commands::ProbeCommand;
            let (x, y) = ProbeCommand::execute(countdown).await?;
            println!("({}, {})", x, y);
        }
    }

    Ok(())
}
