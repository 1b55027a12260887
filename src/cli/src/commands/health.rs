//! Server health check command.

use anyhow::Result;
use clap::Args;

use crate::client::ApiClient;
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct HealthArgs {
    /// Exit non-zero unless the server reports healthy
    #[arg(long)]
    pub strict: bool,
}

pub async fn execute(args: HealthArgs, client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.get_raw("/health").await?;

    let status = health
        .get("status")
        .and_then(|s| s.as_str())
        .unwrap_or("unknown");
    let healthy = status == "healthy";

    match format {
        OutputFormat::Table => {
            if healthy {
                output::print_success(&format!("Server at {} is healthy", client.base_url()));
            } else {
                output::print_error(&format!(
                    "Server at {} reports status '{}'",
                    client.base_url(),
                    status
                ));
            }
            if let Some(version) = health.get("version").and_then(|v| v.as_str()) {
                output::print_detail("version", version);
            }
        }
        _ => output::print_item(&health, format),
    }

    if args.strict && !healthy {
        anyhow::bail!("Server is not healthy");
    }
    Ok(())
}
