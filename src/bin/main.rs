use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rust_decimal::Decimal;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crypto_dash::coin::{format_market_cap, format_percentage, format_price};
use crypto_dash::favorites::Favorites;
use crypto_dash::fetch::{fetch_coin, Fetcher};
use crypto_dash::market::coingecko::CoinGecko;
use crypto_dash::portfolio::{valuate, Portfolio};
use crypto_dash::store::Store;
use crypto_dash::tui::app::App;

#[derive(Parser, Debug)]
struct Args {
    /// Directory holding the persisted favorites and portfolio
    #[arg(long, env = "CRYPTO_DASH_DATA_DIR", default_value = ".crypto-dash")]
    data_dir: PathBuf,

    /// Skip the network and serve the built-in fallback table
    #[arg(long)]
    offline: bool,

    /// Optional CoinGecko demo API key for higher rate limits
    #[arg(long, env = "COINGECKO_API_KEY")]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Interactive dashboard (the default)
    Tui {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Print the market table and exit
    Markets {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Print one coin and exit
    Coin { id: String },
    /// Print the valuated portfolio and exit
    Portfolio {
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crypto_dash=warn,reqwest=warn".into()),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let store = Store::new(&args.data_dir);
    let client = CoinGecko::new(args.api_key.clone());
    let use_remote = !args.offline;

    match args.command {
        None => run_tui(store, client, 20, use_remote).await,
        Some(Commands::Tui { limit }) => run_tui(store, client, limit, use_remote).await,
        Some(Commands::Markets { limit }) => run_markets(store, client, limit, use_remote).await,
        Some(Commands::Coin { id }) => run_coin(client, &id, use_remote).await,
        Some(Commands::Portfolio { limit }) => {
            run_portfolio(store, client, limit, use_remote).await
        }
    }
}

async fn run_tui(store: Store, client: CoinGecko, limit: usize, use_remote: bool) -> Result<()> {
    let favorites = Favorites::load(store.clone());
    let portfolio = Portfolio::load(store);

    let fetcher = Arc::new(Fetcher::new(client, limit, use_remote));
    let rx_state = fetcher.subscribe();
    let (tx_refetch, mut rx_refetch) = tokio::sync::mpsc::channel::<()>(8);

    tokio::task::spawn({
        let fetcher = fetcher.clone();
        async move {
            fetcher.refetch().await;
            while rx_refetch.recv().await.is_some() {
                fetcher.refetch().await;
            }
        }
    });

    let mut app = App::new(rx_state, tx_refetch, favorites, portfolio);
    let result = app.run().await;

    ratatui::restore();

    result
}

async fn run_markets(store: Store, client: CoinGecko, limit: usize, use_remote: bool) -> Result<()> {
    let favorites = Favorites::load(store);
    let fetcher = Fetcher::new(client, limit, use_remote);
    fetcher.refetch().await;
    let state = fetcher.state();

    if let Some(message) = state.error() {
        eprintln!("{} {}", "⚠".red(), message.red());
        eprintln!("{}", "Showing fallback data.".yellow());
    }

    println!(
        "{:<3} {:<12} {:<8} {:>14} {:>10} {:>12} {:>2}",
        "", "Name".bold(), "Symbol".bold(), "Price".bold(), "24h".bold(), "Mkt Cap".bold(), ""
    );
    for coin in &state.coins {
        let change = format_percentage(coin.price_change_percentage_24h);
        let change = if coin.price_change_percentage_24h >= Decimal::ZERO {
            change.green()
        } else {
            change.red()
        };
        let star = if favorites.is_favorite(&coin.id) {
            "★".yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "{:<3} {:<12} {:<8} {:>14} {:>10} {:>12} {}",
            coin.image,
            coin.name,
            coin.symbol.to_uppercase(),
            format_price(coin.current_price),
            change,
            format_market_cap(coin.market_cap),
            star
        );
    }

    Ok(())
}

async fn run_coin(client: CoinGecko, id: &str, use_remote: bool) -> Result<()> {
    let fetched = fetch_coin(&client, id, use_remote).await;

    if let Some(message) = &fetched.error {
        eprintln!("{} {}", "⚠".red(), message.red());
    }
    let Some(coin) = fetched.coin else {
        anyhow::bail!("No data available for \"{}\"", id);
    };

    info!("Resolved coin {}", coin.id);
    println!(
        "{} {} ({})",
        coin.image,
        coin.name.bold(),
        coin.symbol.to_uppercase()
    );
    println!("Price      {}", format_price(coin.current_price));
    println!(
        "24h change {}",
        format_percentage(coin.price_change_percentage_24h)
    );
    println!("Market cap {}", format_market_cap(coin.market_cap));

    Ok(())
}

async fn run_portfolio(
    store: Store,
    client: CoinGecko,
    limit: usize,
    use_remote: bool,
) -> Result<()> {
    let portfolio = Portfolio::load(store);
    let fetcher = Fetcher::new(client, limit, use_remote);
    fetcher.refetch().await;
    let state = fetcher.state();

    if let Some(message) = state.error() {
        eprintln!("{} {}", "⚠".red(), message.red());
        eprintln!("{}", "Valuating against fallback prices.".yellow());
    }

    let view = valuate(portfolio.holdings(), &state.coins);
    println!(
        "{:<12} {:>12} {:>14} {:>14} {:>14} {:>22}",
        "Asset".bold(), "Holdings".bold(), "Avg Buy".bold(), "Price".bold(), "Value".bold(), "Gain/Loss".bold()
    );
    for position in &view.positions {
        let percent = position
            .gain_loss_percent
            .map(format_percentage)
            .unwrap_or_else(|| "—".to_string());
        let gain = format!("{} ({})", format_price(position.gain_loss), percent);
        let gain = if position.gain_loss >= Decimal::ZERO {
            gain.green()
        } else {
            gain.red()
        };
        println!(
            "{:<12} {:>12} {:>14} {:>14} {:>14} {:>22}",
            position.coin.name,
            position.holding.amount.to_string(),
            format_price(position.holding.purchase_price),
            format_price(position.coin.current_price),
            format_price(position.current_value),
            gain
        );
    }
    println!(
        "\nTotal {}   Gain/Loss {}   Overall {}",
        format_price(view.total_value).bold(),
        format_price(view.total_gain_loss),
        format_percentage(view.overall_gain_loss_percent)
    );

    Ok(())
}
