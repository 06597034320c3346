use clap::{Parser, Subcommand};
use schema_crawler::client::{ClientBuilder, HttpFetcher};
use schema_crawler::config::Config;
use schema_crawler::error::Result;
use schema_crawler::extract::{Extractor, SelectorPolicy};
use schema_crawler::logging::{init_logging, parse_log_level, LoggerConfig};
use schema_crawler::service::{CrawlRequest, CrawlService};
use schema_crawler::{log_error, log_info, server, utils};
use std::path::PathBuf;
use std::sync::Arc;

/// Fetch a page and pull structured fields out of it with CSS selectors
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Fail the whole request when a selector does not parse
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (POST /crawl, GET /health)
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Crawl a single URL and print the result as JSON
    Crawl {
        #[arg(short, long)]
        url: String,

        /// JSON file with `{ "list"?: ..., "fields": {...} }`
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config)?;
    if cli.strict {
        config.extraction.selector_policy = SelectorPolicy::Strict;
    }
    if let Command::Serve { host, port } = &cli.command {
        if let Some(host) = host {
            config.server.host = host.clone();
        }
        if let Some(port) = port {
            config.server.port = *port;
        }
    }
    config.validate()?;

    let logger_config = LoggerConfig {
        directory: config.logging.directory.clone(),
        file_name: config.logging.filename.clone(),
        level: parse_log_level(&config.logging.level)?,
        ..LoggerConfig::default()
    };
    init_logging(logger_config)?;

    log_info!(
        "[main] Starting with selector policy {:?}",
        config.extraction.selector_policy
    );

    let client = ClientBuilder::from_config(&config.fetch)?.build()?;
    let service = CrawlService::new(
        Arc::new(HttpFetcher::new(client)),
        Extractor::new(config.extraction.selector_policy),
    );

    match cli.command {
        Command::Serve { .. } => {
            let addr = format!("{}:{}", config.server.host, config.server.port);
            server::serve(service, &addr).await
        }
        Command::Crawl {
            url,
            schema,
            output,
        } => {
            let schema = schema.map(|path| utils::read_schema(&path)).transpose()?;

            let response = match service.crawl(CrawlRequest { url, schema }).await {
                Ok(response) => response,
                Err(e) => {
                    log_error!(e => "[main] Crawl failed");
                    return Err(e);
                }
            };

            match output {
                Some(path) => utils::save_json(&response, &path)?,
                None => println!("{}", serde_json::to_string_pretty(&response)?),
            }

            log_info!("[main] Done");
            Ok(())
        }
    }
}
