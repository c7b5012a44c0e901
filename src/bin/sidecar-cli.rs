use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sidecar-cli")]
#[command(about = "Management CLI for the envoy drain sidecar", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:9001")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show envoy's active downstream connection count
    Stats,
    /// Drain envoy and wait for the outcome
    Shutdown(Timing),
    /// Wait for a running drain to report its outcome
    Wait(Timing),
}

/// Overrides for the sidecar's default timing, in seconds.
#[derive(Args)]
struct Timing {
    #[arg(long)]
    delay: Option<u64>,

    #[arg(long)]
    period: Option<u64>,

    #[arg(long)]
    deadline: Option<u64>,
}

impl Timing {
    fn query(&self) -> Vec<(&'static str, u64)> {
        [("delay", self.delay), ("period", self.period), ("deadline", self.deadline)]
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect()
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    // Drains can take minutes; no request timeout here.
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match &cli.command {
        Commands::Stats => client.get(format!("{}/check/stats", base)).send().await?,
        Commands::Shutdown(timing) => {
            client
                .post(format!("{}/shutdown", base))
                .query(&timing.query())
                .send()
                .await?
        }
        Commands::Wait(timing) => {
            client
                .get(format!("{}/waitforshutdown", base))
                .query(&timing.query())
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let status = res.status();
    let body = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: sidecar returned status {}", status);
        if !body.is_empty() {
            eprintln!("Response: {}", body.trim_end());
        }
        return Ok(ExitCode::FAILURE);
    }

    println!("{}", body.trim_end());
    Ok(ExitCode::SUCCESS)
}
