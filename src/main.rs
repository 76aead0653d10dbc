//! Onboarding gate service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Browser / upload client
//!         │
//!         ▼
//!     ┌──────────────────────────────────────────────────────────┐
//!     │  http (axum router, request id, trace, outer timeout)    │
//!     │     │                          │                         │
//!     │     ▼                          ▼                         │
//!     │  onboarding page          upload authorizer              │
//!     │     │      │                   │                         │
//!     │     ▼      ▼                   ▼                         │
//!     │  ┌──────────────── resilience: DeadlineGate ───────────┐ │
//!     │  │ race each call against its deadline → Outcome        │ │
//!     │  └──────────────────────────────────────────────────────┘ │
//!     │     │                │                                    │
//!     └─────┼────────────────┼────────────────────────────────────┘
//!           ▼                ▼
//!     identity provider   profile store
//! ```

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "onboarding-gate")]
#[command(about = "Onboarding page and upload authorization with bounded dependency calls", long_about = None)]
struct Args {
    /// Path to a TOML config file. Watched for changes when given.
    #[arg(short, long, env = "ONBOARDING_GATE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    onboarding_gate::lifecycle::start(args.config.as_deref()).await?;
    Ok(())
}
