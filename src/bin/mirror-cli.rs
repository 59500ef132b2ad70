use std::path::PathBuf;
use std::process::ExitCode;

use axum::http::{header, HeaderValue};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use routemirror::client::{CallOptions, Client, ClientError};
use routemirror::config::{load_config, ServerConfig};
use routemirror::security::encode_basic;
use routemirror::Method;

#[derive(Parser)]
#[command(name = "mirror-cli")]
#[command(about = "Call a routemirror API over the network", long_about = None)]
struct Cli {
    /// Base URL; overrides `client.base_url` from the config file.
    #[arg(short, long)]
    url: Option<String>,

    /// TOML configuration file (`[client]` section).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Send `Authorization: Bearer <token>`.
    #[arg(long, conflicts_with = "basic")]
    token: Option<String>,

    /// Send HTTP Basic credentials, `user:password`.
    #[arg(long)]
    basic: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Get(CallArgs),
    Post(CallArgs),
    Put(CallArgs),
    Patch(CallArgs),
    Delete(CallArgs),
}

#[derive(Args)]
struct CallArgs {
    /// Route path, e.g. `users/$id`.
    path: String,

    /// Dynamic segment value, `name=value`. Repeatable.
    #[arg(short = 'p', long = "param", value_parser = parse_pair)]
    params: Vec<(String, String)>,

    /// Query value, `name=value`. Repeat a name to send an array.
    #[arg(short = 'q', long = "query", value_parser = parse_pair)]
    query: Vec<(String, String)>,

    /// JSON request body.
    #[arg(short, long)]
    body: Option<String>,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got `{raw}`"))
}

impl Commands {
    fn split(self) -> (Method, CallArgs) {
        match self {
            Commands::Get(args) => (Method::Get, args),
            Commands::Post(args) => (Method::Post, args),
            Commands::Put(args) => (Method::Put, args),
            Commands::Patch(args) => (Method::Patch, args),
            Commands::Delete(args) => (Method::Delete, args),
        }
    }
}

fn call_options(args: &CallArgs) -> Result<CallOptions, serde_json::Error> {
    let mut opts = CallOptions::new();
    for (name, value) in &args.params {
        opts = opts.path(name.clone(), value);
    }
    for (name, value) in &args.query {
        let next = match opts.query.remove(name) {
            None => Value::String(value.clone()),
            Some(Value::Array(mut items)) => {
                items.push(Value::String(value.clone()));
                Value::Array(items)
            }
            Some(previous) => Value::Array(vec![previous, Value::String(value.clone())]),
        };
        opts.query.insert(name.clone(), next);
    }
    if let Some(body) = &args.body {
        opts = opts.body(serde_json::from_str(body)?);
    }
    Ok(opts)
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => load_config(path)?.client,
        None => ServerConfig::default().client,
    };
    if let Some(url) = cli.url {
        settings.base_url = url;
    }

    let authorization = match (&cli.token, &cli.basic) {
        (Some(token), _) => Some(format!("Bearer {token}")),
        (None, Some(basic)) => {
            let (user, password) = basic.split_once(':').unwrap_or((basic.as_str(), ""));
            Some(encode_basic(user, password))
        }
        (None, None) => None,
    };

    let mut client = Client::from_config(&settings)?;
    if let Some(value) = authorization {
        let value = HeaderValue::from_str(&value)?;
        client = client.reconfigure(|config| config.header(header::AUTHORIZATION, value));
    }

    let (method, args) = cli.command.split();
    let opts = call_options(&args)?;

    match client.at(&args.path).send(method, opts).await {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(ClientError::Status { status, message }) => {
            eprintln!("Error: server returned status {status}");
            eprintln!("{message}");
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err.into()),
    }
}
