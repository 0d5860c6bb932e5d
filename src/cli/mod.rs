use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;

use crate::clients::amadeus::AmadeusClient;
use crate::domain::{parse_date, SearchRequest, TravelClass};
use crate::infra::config::Config;
use crate::infra::runtime::limits::retry_async;
use crate::tools::flight_offers::FlightOffersTool;

#[derive(Parser)]
#[command(name = "flight-mcp-gateway")]
#[command(about = "Flight MCP Gateway - server and admin CLI")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the gateway (default)
    Serve,
    /// Health check the service
    Health {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Validate configuration
    Config {
        /// Validate config without starting service
        #[arg(long)]
        validate: bool,
    },
    /// Show service status
    Status {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Run one flight search against the provider and print the result
    Search {
        /// Origin IATA code
        origin: String,
        /// Destination IATA code
        destination: String,
        /// Departure date, YYYY-MM-DD
        departure: String,
        /// Return date, YYYY-MM-DD
        #[arg(value_name = "RETURN")]
        return_date: String,
        #[arg(long)]
        adults: Option<u32>,
        #[arg(long)]
        children: Option<u32>,
        #[arg(long)]
        infants: Option<u32>,
        #[arg(long)]
        travel_class: Option<TravelClass>,
        #[arg(long)]
        max_price: Option<f64>,
        #[arg(long)]
        max_duration: Option<f64>,
        #[arg(long)]
        currency: Option<String>,
        /// Extra attempts on transient provider failures
        #[arg(long, default_value_t = 2)]
        retries: u32,
    },
}

pub async fn run_commands(command: Commands) -> ExitCode {
    match command {
        Commands::Serve => match Config::from_env() {
            Ok(cfg) => match crate::infra::boot::run_server(cfg).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("❌ Server failed: {:#}", e);
                    ExitCode::FAILURE
                }
            },
            Err(e) => {
                eprintln!("❌ Configuration invalid: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Health { url } => match health_check(&url).await {
            Ok(_) => {
                println!("✅ Service is healthy");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Health check failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Config { validate: _ } => match validate_config() {
            Ok(_) => {
                println!("✅ Configuration is valid");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration validation failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Status { url } => match show_status(&url).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("❌ Status check failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Search {
            origin,
            destination,
            departure,
            return_date,
            adults,
            children,
            infants,
            travel_class,
            max_price,
            max_duration,
            currency,
            retries,
        } => {
            let req = match build_search(
                origin,
                destination,
                &departure,
                &return_date,
                |req| {
                    req.adults = adults;
                    req.children = children;
                    req.infants = infants;
                    req.travel_class = travel_class;
                    req.max_price = max_price;
                    req.max_duration = max_duration;
                    req.currency = currency;
                },
            ) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("❌ {}", e);
                    return ExitCode::FAILURE;
                }
            };
            match search(req, retries).await {
                Ok(out) => {
                    println!("{}", out);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("❌ Search failed: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

async fn health_check(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/healthz", url))
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("HTTP {}", response.status()).into())
    }
}

fn validate_config() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::from_env()?;
    println!("  Mode: {}", cfg.mode);
    println!("  Port: {}", cfg.port);
    println!("  Provider: {}", cfg.provider.base_url);
    println!("  Client id: {}", cfg.credentials.client_id());
    Ok(())
}

async fn show_status(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();

    let health_response = client
        .get(format!("{}/healthz", url))
        .timeout(std::time::Duration::from_secs(5))
        .send()
        .await?;

    println!(
        "🏥 Health Status: {}",
        if health_response.status().is_success() {
            "✅ Healthy"
        } else {
            "❌ Unhealthy"
        }
    );

    let tools_response = client
        .post(format!("{}/v1/rpc", url))
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/list",
            "params": {}
        }))
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await;

    match tools_response {
        Ok(resp) if resp.status().is_success() => {
            let body: serde_json::Value = resp.json().await.unwrap_or_default();
            let names: Vec<&str> = body["result"]["tools"]
                .as_array()
                .map(|tools| tools.iter().filter_map(|t| t["name"].as_str()).collect())
                .unwrap_or_default();
            println!("🔧 Tools: ✅ {}", names.join(", "));
        }
        Ok(resp) => {
            println!("🔧 Tools: ❌ HTTP {}", resp.status());
        }
        Err(_) => {
            println!("🔧 Tools: ❌ Unavailable");
        }
    }

    println!("\n📋 Configuration:");
    println!(
        "  Mode: {}",
        std::env::var("MODE").unwrap_or_else(|_| "server".into())
    );
    println!(
        "  Port: {}",
        std::env::var("PORT").unwrap_or_else(|_| "8080".into())
    );
    println!(
        "  Log Level: {}",
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())
    );
    match std::env::var("AMADEUS_BASE_URL") {
        Ok(base) => println!("  Provider: {}", base),
        Err(_) => println!("  Provider: default"),
    }

    Ok(())
}

fn build_search(
    origin: String,
    destination: String,
    departure: &str,
    return_date: &str,
    fill: impl FnOnce(&mut SearchRequest),
) -> Result<SearchRequest, Box<dyn std::error::Error>> {
    let departure = parse_date("departure", departure)?;
    let mut req = SearchRequest::new(origin, destination, departure);
    req.return_date = Some(parse_date("return", return_date)?);
    fill(&mut req);
    req.validate()?;
    Ok(req)
}

async fn search(req: SearchRequest, retries: u32) -> Result<String, Box<dyn std::error::Error>> {
    let cfg = Config::from_env()?;
    let client = AmadeusClient::new(&cfg.provider, cfg.credentials)?;
    let tool = FlightOffersTool::new(Arc::new(client));
    let out = retry_async(
        retries,
        |e: &crate::core::error::GatewayError| {
            matches!(e, crate::core::error::GatewayError::Provider(p) if p.is_transient())
        },
        |_| tool.search(&req),
    )
    .await?;
    Ok(serde_json::to_string_pretty(&out)?)
}
