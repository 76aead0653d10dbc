use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::redirect::Policy;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "Exercise a running onboarding gate", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the onboarding page
    Onboarding {
        /// Session token; omit to load the page anonymously
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Ask for upload authorization
    Authorize {
        #[arg(short, long)]
        token: Option<String>,

        #[arg(short, long, default_value = "media")]
        slug: String,

        /// File as name:size:mime, repeatable
        #[arg(short, long = "file", value_parser = parse_file)]
        files: Vec<Value>,
    },
    /// Check liveness
    Health,
}

fn parse_file(raw: &str) -> Result<Value, String> {
    let mut parts = raw.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(size), Some(mime)) if !name.is_empty() => {
            let size: u64 = size.parse().map_err(|_| format!("invalid size in {raw}"))?;
            Ok(json!({ "name": name, "size": size, "type": mime }))
        }
        _ => Err(format!("expected name:size:mime, got {raw}")),
    }
}

fn auth_headers(token: Option<&str>) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    if let Some(token) = token {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token))?);
    }
    Ok(headers)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    // Redirects are an answer here, not something to follow.
    let client = reqwest::Client::builder().redirect(Policy::none()).build()?;

    match cli.command {
        Commands::Onboarding { token } => {
            let res = client
                .get(format!("{}/onboarding", cli.url))
                .headers(auth_headers(token.as_deref())?)
                .send()
                .await?;
            if res.status().is_redirection() {
                let location = res
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("?");
                println!("Redirect ({}) to {}", res.status(), location);
                return Ok(());
            }
            print_response(res).await?;
        }
        Commands::Authorize { token, slug, files } => {
            let res = client
                .post(format!("{}/api/uploads/{}", cli.url, slug))
                .headers(auth_headers(token.as_deref())?)
                .json(&json!({ "files": files }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            println!("{} {}", res.status(), res.text().await?);
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: gate returned status {}", status);
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
