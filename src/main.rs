use clap::Parser;
use tracing_subscriber::EnvFilter;

use ringdex::{Catalog, Category, Config};

#[derive(Debug, Parser)]
#[command(
    name = "ringdex",
    version,
    about = "Scrape one page of an Elden Ring wiki catalog category"
)]
struct Cli {
    /// Catalog category to fetch.
    #[arg(value_enum)]
    category: Category,

    /// 0-based page number.
    #[arg(long, value_name = "N", default_value_t = 0)]
    page: usize,

    /// Records per page.
    #[arg(long, value_name = "N", default_value_t = 20)]
    page_size: usize,

    /// Emit records as JSON instead of text lines.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Wiki origin to scrape.
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// chromedriver binary to spawn.
    #[arg(long, value_name = "PATH")]
    chromedriver: Option<String>,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url.trim_end_matches('/').to_string();
    }
    if let Some(chromedriver) = cli.chromedriver {
        config.chromedriver = chromedriver;
    }

    let catalog = Catalog::new(config);
    let records = catalog
        .fetch_page(cli.category, cli.page_size, cli.page)
        .await;

    if cli.json {
        match serde_json::to_string_pretty(&records) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("failed to encode records: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if records.is_empty() {
        eprintln!(
            "no items for {} page {} (scrape failed or page out of range)",
            cli.category, cli.page
        );
        std::process::exit(1);
    }
    for record in &records {
        println!("{}\t{}", record.display_name, record.image_url);
    }
    eprintln!(
        "fetched {} record(s): {} page {}",
        records.len(),
        cli.category,
        cli.page
    );
}
