//! insights-loader: chart summaries and 52-week range recommendations from IEX data.
//!
//! Usage:
//!   cargo run -p insights-loader -- --symbols
//!   cargo run -p insights-loader -- --chart AAPL
//!   cargo run -p insights-loader -- --recommend cs
//!   cargo run -p insights-loader -- --recommend cs --concurrency 8 --threshold 0.9

use equity_insights::{chart_for_symbol, recommend_from_store, RangeRecommender, RecommendConfig};
use equity_core::SymbolStore;
use iex_client::{CachedSource, IexClient, SymbolCatalog};
use std::time::Duration;

const DEFAULT_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Symbols,
    Chart(Option<String>),
    Recommend(String),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "insights_loader=info,equity_insights=info,iex_client=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = parse_command(&args) else {
        print_usage();
        std::process::exit(1);
    };

    let mut config = RecommendConfig::from_env();
    apply_overrides(&mut config, &args)?;
    config.validate()?;

    let cache_ttl = std::env::var("IEX_CACHE_TTL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_CACHE_TTL_SECS);

    let client = IexClient::from_env();
    let source = CachedSource::new(client.clone(), Duration::from_secs(cache_ttl));

    // Reference symbols are loaded once into the catalog; re-populating skips known symbols
    let catalog = SymbolCatalog::new();
    let added = catalog.populate(client.list_companies().await?);
    tracing::info!("Loaded {} companies into the symbol catalog", added);

    let output = match command {
        Command::Symbols => serde_json::to_string_pretty(&catalog.list_companies().await?)?,
        Command::Chart(symbol) => {
            let summary = chart_for_symbol(&source, &catalog, symbol.as_deref()).await?;
            serde_json::to_string_pretty(&summary)?
        }
        Command::Recommend(stock_type) => {
            tracing::info!(
                "Recommending type '{}': scan_cap={}, threshold={}, concurrency={}",
                stock_type,
                config.scan_cap,
                config.range_rate_threshold,
                config.concurrency
            );
            let recommender = RangeRecommender::new(source, config);
            let result = recommend_from_store(&recommender, &catalog, &stock_type).await?;
            serde_json::to_string_pretty(&serde_json::json!({
                "symbols": result.joined_symbols(),
                "price_range_rates": result.joined_scores(),
                "recommendation": result,
            }))?
        }
    };

    println!("{}", output);
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
        .filter(|v| !v.starts_with("--"))
}

fn parse_command(args: &[String]) -> Option<Command> {
    if args.iter().any(|a| a == "--symbols") {
        return Some(Command::Symbols);
    }
    if args.iter().any(|a| a == "--chart") {
        return Some(Command::Chart(flag_value(args, "--chart").map(str::to_string)));
    }
    flag_value(args, "--recommend").map(|t| Command::Recommend(t.to_string()))
}

fn apply_overrides(config: &mut RecommendConfig, args: &[String]) -> anyhow::Result<()> {
    if let Some(v) = flag_value(args, "--concurrency") {
        config.concurrency = v.parse().map_err(|e| anyhow::anyhow!("--concurrency {}: {}", v, e))?;
    }
    if let Some(v) = flag_value(args, "--scan-cap") {
        config.scan_cap = v.parse().map_err(|e| anyhow::anyhow!("--scan-cap {}: {}", v, e))?;
    }
    if let Some(v) = flag_value(args, "--threshold") {
        config.range_rate_threshold = v.parse().map_err(|e| anyhow::anyhow!("--threshold {}: {}", v, e))?;
    }
    Ok(())
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  insights-loader --symbols              List known companies");
    eprintln!("  insights-loader --chart SYMBOL         1-year chart summary for a symbol");
    eprintln!("  insights-loader --recommend TYPE       52-week range recommendations for a company type");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --concurrency N    Parallel symbol fetches (default: 1)");
    eprintln!("  --scan-cap N       Companies examined from the front of the list (default: 50)");
    eprintln!("  --threshold X      Minimum range rate to recommend (default: 0.82)");
}
