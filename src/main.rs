use clap::{Parser, Subcommand};
use anyhow::Result;
use dotenvy::dotenv;

mod output;
mod scrape;
mod inspect;
mod telemetry;

#[derive(Parser)]
#[command(name = "shopscrape", about = "Storefront product catalog scraper")]
struct Cli {
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Scrape(scrape::ScrapeCmd),
    Inspect(inspect::InspectCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // initialize logging/tracing (stderr). Respect RUST_LOG and SHOP_LOG_FORMAT
    telemetry::config::init_tracing();

    match cli.command {
        Commands::Scrape(args) => scrape::run(args).await?,
        Commands::Inspect(args) => inspect::run(args).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_json_flag_parses_after_subcommand() {
        let cli = Cli::try_parse_from(["shopscrape", "scrape", "shop.test", "--json", "--apply"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Scrape(args) => assert!(args.apply),
            Commands::Inspect(_) => panic!("expected scrape"),
        }
    }

    #[test]
    fn inspect_requires_a_url() {
        assert!(Cli::try_parse_from(["shopscrape", "inspect"]).is_err());
    }
}
