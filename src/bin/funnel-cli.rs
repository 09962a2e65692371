use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};
use std::path::PathBuf;

use funnel_dispatch::config::load_config;
use funnel_dispatch::observability::logging;
use funnel_dispatch::{Dispatcher, Endpoint, FormPayload, LoginType};

#[derive(Parser)]
#[command(name = "funnel-cli")]
#[command(about = "Management CLI for the funnel dispatcher", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Admin API key (required for admin commands)
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check dispatcher status
    Status,
    /// List pool members with their circuit state
    Nodes,
    /// Add a node to a pool
    Add {
        address: String,
        #[arg(short, long, value_parser = parse_login_type, default_value = "zf")]
        login_type: LoginType,
    },
    /// Remove a node from a pool
    Remove {
        address: String,
        #[arg(short, long, value_parser = parse_login_type, default_value = "zf")]
        login_type: LoginType,
    },
    /// Send one request through a locally built dispatcher
    Dispatch {
        /// Config file providing pools and client settings
        #[arg(short, long, default_value = "funnel.toml")]
        config: PathBuf,
        /// Endpoint path, e.g. /student/zf/score
        #[arg(short, long)]
        endpoint: String,
        /// Preferred node address
        #[arg(short, long)]
        node: Option<String>,
        /// Form fields as key=value
        #[arg(short, long = "form", value_parser = parse_form_field)]
        form: Vec<(String, String)>,
    },
}

fn parse_login_type(raw: &str) -> Result<LoginType, String> {
    match LoginType::parse(raw) {
        LoginType::Unknown => Err(format!("unknown login type '{}', expected oauth or zf", raw)),
        login_type => Ok(login_type),
    }
}

fn parse_form_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Dispatch { config, endpoint, node, form } => {
            run_dispatch(config, endpoint, node, form).await
        }
        command => {
            let key = cli.key.ok_or("--key is required for admin commands")?;
            admin_request(&cli.url, &key, command).await
        }
    }
}

async fn run_dispatch(
    config: PathBuf,
    endpoint: String,
    node: Option<String>,
    form: Vec<(String, String)>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&config)?;
    logging::init_logging(&config.observability.log_level);
    let dispatcher = Dispatcher::from_config(&config)?;
    let form: FormPayload = form.into_iter().collect();

    let data = dispatcher
        .dispatch(&form, node.as_deref(), &Endpoint::new(endpoint))
        .await?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

async fn admin_request(
    url: &str,
    key: &str,
    command: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", key))?,
    );
    let nodes_url = format!("{}/admin/nodes", url);

    let request = match command {
        Commands::Status => client.get(format!("{}/admin/status", url)),
        Commands::Nodes => client.get(nodes_url),
        Commands::Add { address, login_type } => client
            .post(nodes_url)
            .json(&json!({ "address": address, "login_type": login_type })),
        Commands::Remove { address, login_type } => client
            .delete(nodes_url)
            .json(&json!({ "address": address, "login_type": login_type })),
        Commands::Dispatch { .. } => return Err("dispatch does not use the admin API".into()),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        return Err(format!("admin API returned status {}: {}", status, text).into());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
