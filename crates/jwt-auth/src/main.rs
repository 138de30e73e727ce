use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use jwt_auth::config;
use jwt_auth::observability::init_observability;
use jwt_auth::{JsonWebToken, JwtAuthenticationProvider, RequestParts};
use serde_json::{Value, json};

#[derive(Parser, Debug)]
#[command(name = "jwt-auth")]
#[command(about = "Authenticate a request carrying a JSON Web Token", long_about = None)]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Request header as NAME=VALUE (repeatable)
    #[arg(long = "header", value_name = "NAME=VALUE", value_parser = parse_pair)]
    headers: Vec<(String, String)>,

    /// Request cookie as NAME=VALUE (repeatable)
    #[arg(long = "cookie", value_name = "NAME=VALUE", value_parser = parse_pair)]
    cookies: Vec<(String, String)>,

    /// Query argument as NAME=VALUE (repeatable)
    #[arg(long = "query", value_name = "NAME=VALUE", value_parser = parse_pair)]
    arguments: Vec<(String, String)>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable JSON logging output
    #[arg(long)]
    json_logs: bool,

    /// Write Prometheus metrics to stderr before exiting
    #[cfg(feature = "metrics")]
    #[arg(long)]
    print_metrics: bool,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))
}

type Pairs = Vec<(String, String)>;

fn build_request(headers: Pairs, cookies: Pairs, arguments: Pairs) -> RequestParts {
    let request = headers
        .into_iter()
        .fold(RequestParts::new(), |req, (n, v)| req.with_header(&n, v));
    let request = cookies
        .into_iter()
        .fold(request, |req, (n, v)| req.with_cookie(n, v));
    arguments
        .into_iter()
        .fold(request, |req, (n, v)| req.with_argument(n, v))
}

/// Exit status and printed outcome for one attempt.
///
/// 0 authenticated, 1 missing or rejected credentials, 2 the attempt could
/// not complete (key or role unavailable).
fn report(result: &jwt_auth::auth::Result<JsonWebToken>) -> (u8, Value) {
    match result {
        Ok(token) => {
            let code = u8::from(!token.is_authenticated());
            let outcome = json!({ "status": token.status().as_str(), "identity": token.identity() });
            (code, outcome)
        }
        Err(_) => (2, json!({ "status": "wrong_credentials", "identity": null })),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Precedence: env > file > CLI > defaults
    let mut builder = if let Some(ref path) = args.config {
        config::load_config_from_path(path)?
    } else {
        config::load_config()?
    };

    if args.verbose {
        builder = builder.log_level("debug".to_string());
    }
    if args.json_logs {
        builder = builder.json_logs(true);
    }

    let config = builder.build()?;

    init_observability(&config.telemetry)?;

    let provider = JwtAuthenticationProvider::from_config(&config)?;
    tracing::debug!(
        provider = provider.name(),
        sources = provider.locator().sources().len(),
        "Authentication provider ready"
    );

    let request = build_request(args.headers, args.cookies, args.arguments);
    let result = provider.authenticate_request(&request).await;

    #[cfg(feature = "metrics")]
    if args.print_metrics {
        eprint!("{}", jwt_auth::observability::render_metrics());
    }

    if let Err(e) = &result {
        tracing::error!(error = %e, "Authentication could not complete");
    }

    let (code, outcome) = report(&result);
    println!("{outcome}");
    Ok(ExitCode::from(code))
}
