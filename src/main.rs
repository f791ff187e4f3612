//! MarketCalc forecasting service
//!
//! HTTP API plus one-shot terminal commands over the same service.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use marketcalc::{
    api,
    calculator::GrowthRequest,
    config::Config,
    data::{DataSource, YahooClient},
    models::MODEL_TABLE,
    service::{EvaluationRequest, ForecastService, ProjectionRequest},
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "marketcalc")]
#[command(about = "Price projection, regression evaluation and growth calculators")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Project a ticker's close price
    Project {
        ticker: String,
        /// Periods ahead
        #[arg(long, default_value = "30")]
        horizon: i64,
        /// linear, ridge, lasso, elastic or rf
        #[arg(short, long)]
        model: Option<String>,
        /// Also score the return model
        #[arg(long)]
        evaluate: bool,
    },
    /// Train and score a next-day return model
    Evaluate {
        #[arg(default_value = "AAPL")]
        ticker: String,
        #[arg(short, long, default_value = "ridge")]
        model: String,
        /// Comma separated: returns, momentum, volatility, volume
        #[arg(short, long)]
        features: Option<String>,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Print close history
    History {
        ticker: String,
        #[arg(long, default_value = "1y")]
        period: String,
    },
    /// Compound growth with periodic contributions
    Growth {
        #[arg(long)]
        years: u32,
        /// Annual rate in percent
        #[arg(long)]
        rate: Decimal,
        #[arg(long, default_value = "0")]
        principal: Decimal,
        #[arg(long, default_value = "0")]
        contribution: Decimal,
        #[arg(long, default_value = "monthly")]
        frequency: String,
    },
    /// List available models
    Models,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    // Initialize logging, RUST_LOG wins over the config file
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Serve { host, port } => serve(config, host, port).await,
        Commands::Project {
            ticker,
            horizon,
            model,
            evaluate,
        } => {
            let service = build_service(&config)?;
            let response = service
                .project(ProjectionRequest {
                    symbol: ticker,
                    horizon,
                    model,
                    evaluate,
                    features: None,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Commands::Evaluate {
            ticker,
            model,
            features,
            start,
            end,
        } => {
            let service = build_service(&config)?;
            let features = features.map(|list| {
                list.split(',')
                    .map(|f| f.trim().to_string())
                    .collect::<Vec<_>>()
            });
            let response = service
                .evaluate(EvaluationRequest {
                    symbol: ticker,
                    model: Some(model),
                    features,
                    start,
                    end,
                })
                .await?;

            println!("\n=== Results ===");
            println!("Ticker: {}", response.ticker);
            println!("Model: {}", response.model);
            println!("Features: {}", response.features);
            println!("Rows: {} train / {} test", response.evaluation.train_rows, response.evaluation.test_rows);
            println!("MSE: {:.6}", response.evaluation.mean_squared_error);
            println!("MAE: {:.6}", response.evaluation.mean_absolute_error);
            println!("R²: {:.4}", response.evaluation.r_squared);
            println!("Next-day return prediction: {:.5}", response.evaluation.last_prediction);
            if let Some(coefficients) = &response.coefficients {
                println!("\nCoefficients:");
                for (name, value) in coefficients {
                    println!("  {:<14} {:>12.6}", name, value);
                }
            }
            Ok(())
        }
        Commands::History { ticker, period } => {
            let service = build_service(&config)?;
            let history = service.historical(&ticker, &period).await?;
            for (date, price) in history.dates.iter().zip(&history.prices) {
                println!("{}  {:>10.2}", date, price);
            }
            Ok(())
        }
        Commands::Growth {
            years,
            rate,
            principal,
            contribution,
            frequency,
        } => {
            let service = build_service(&config)?;
            let result = service.compound_growth(&GrowthRequest {
                years,
                rate,
                principal,
                contribution,
                frequency,
            })?;

            for point in &result.growth_series {
                println!("Year {:>3}  ${}", point.year, point.value);
            }
            println!("\nFinal value:    ${}", result.final_value);
            println!("Total invested: ${}", result.total_invested);
            println!("Total gain:     ${}", result.total_gain);
            Ok(())
        }
        Commands::Models => {
            for spec in MODEL_TABLE.iter() {
                println!("{:<8} {}", spec.id, spec.label);
            }
            Ok(())
        }
    }
}

fn build_service(config: &Config) -> anyhow::Result<ForecastService<YahooClient>> {
    let source = YahooClient::new(&config.data)?;
    tracing::debug!(source = source.name(), base_url = %config.data.base_url, "Data source ready");
    Ok(ForecastService::new(source, config.forecast.clone()))
}

async fn serve(mut config: Config, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting MarketCalc API");
    let service = Arc::new(build_service(&config)?);
    api::serve(service, &config.bind_addr()).await
}
