//! Client roster commands: list, detail, disassociate, reassign, remove.

use anyhow::Result;
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum ClientCommands {
    /// List the partner's client roster with their applications
    List,

    /// Show a single client and their applications
    Detail {
        /// Client user id
        id: String,
    },

    /// Remove a client from the roster (keeps the user and applications)
    Disassociate {
        /// Client user id
        id: String,
    },

    /// Move a client to another partner's roster (admin)
    Reassign {
        /// Client user id
        id: String,
        /// Target partner user id
        new_partner_id: String,
    },

    /// Permanently delete a client and cascade over their applications (admin)
    Remove {
        /// Client user id
        id: String,
        /// Reassign the client's applications to this partner instead of deleting them
        #[arg(long)]
        reassign_to: Option<String>,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

// ── API types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize)]
struct RosterInfo {
    entries: Vec<EntryInfo>,
    #[serde(default)]
    failed_categories: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct EntryInfo {
    client: ClientInfo,
    applications: Vec<ApplicationSummary>,
}

#[derive(Debug, Deserialize, Serialize)]
struct ClientInfo {
    id: String,
    full_name: String,
    email: String,
    #[serde(default)]
    partner_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct ApplicationSummary {
    id: String,
    service_category: String,
    application_type: String,
    status: String,
    created_at: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct RemovalOutcome {
    client_id: String,
    applications_reassigned: usize,
    applications_deleted: usize,
    #[serde(default)]
    reconciliation_required: Vec<String>,
}

#[derive(Tabled, Serialize)]
struct RosterRow {
    #[tabled(rename = "Client ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Applications")]
    applications: usize,
}

#[derive(Tabled, Serialize)]
struct ApplicationRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Type")]
    application_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created")]
    created_at: String,
}

impl From<&ApplicationSummary> for ApplicationRow {
    fn from(app: &ApplicationSummary) -> Self {
        Self {
            id: app.id.clone(),
            category: app.service_category.clone(),
            application_type: app.application_type.clone(),
            status: app.status.clone(),
            created_at: app.created_at.clone(),
        }
    }
}

// ── Execution ───────────────────────────────────────────────────────────────

pub async fn execute(cmd: ClientCommands, client: &ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        ClientCommands::List => {
            let roster: RosterInfo = client.get("/api/v1/clients").await?;
            if !roster.failed_categories.is_empty() {
                output::print_warning(&format!(
                    "Partial results: {} unavailable",
                    roster.failed_categories.join(", ")
                ));
            }
            match format {
                OutputFormat::Table => {
                    let rows: Vec<RosterRow> = roster
                        .entries
                        .iter()
                        .map(|entry| RosterRow {
                            id: entry.client.id.clone(),
                            name: entry.client.full_name.clone(),
                            email: entry.client.email.clone(),
                            applications: entry.applications.len(),
                        })
                        .collect();
                    output::print_list(&rows, format);
                }
                _ => output::print_item(&roster, format),
            }
        }

        ClientCommands::Detail { id } => {
            let entry: EntryInfo = client.get(&format!("/api/v1/clients/{}", id)).await?;
            match format {
                OutputFormat::Table => {
                    output::print_header(&format!(
                        "{} <{}>",
                        entry.client.full_name, entry.client.email
                    ));
                    let rows: Vec<ApplicationRow> =
                        entry.applications.iter().map(Into::into).collect();
                    output::print_list(&rows, format);
                }
                _ => output::print_item(&entry, format),
            }
        }

        ClientCommands::Disassociate { id } => {
            let updated: ClientInfo = client
                .post(
                    &format!("/api/v1/clients/{}/disassociate", id),
                    &serde_json::json!({}),
                )
                .await?;
            match format {
                OutputFormat::Table => {
                    output::print_success(&format!(
                        "Client {} removed from roster",
                        updated.id
                    ));
                }
                _ => output::print_item(&updated, format),
            }
        }

        ClientCommands::Reassign { id, new_partner_id } => {
            let updated: ClientInfo = client
                .post(
                    &format!("/api/v1/clients/{}/reassign", id),
                    &serde_json::json!({ "new_partner_id": new_partner_id }),
                )
                .await?;
            match format {
                OutputFormat::Table => {
                    output::print_success(&format!(
                        "Client {} reassigned to {}",
                        updated.id,
                        updated.partner_id.as_deref().unwrap_or("-")
                    ));
                }
                _ => output::print_item(&updated, format),
            }
        }

        ClientCommands::Remove {
            id,
            reassign_to,
            force,
        } => {
            if !force {
                output::print_info(
                    "This permanently deletes the client and cascades over their applications. Use --force to confirm.",
                );
                return Ok(());
            }

            let body = serde_json::json!({ "reassign_to": reassign_to });
            let outcome: RemovalOutcome = client
                .delete(&format!("/api/v1/clients/{}", id), Some(&body))
                .await?;
            match format {
                OutputFormat::Table => {
                    output::print_success(&format!(
                        "Client {} removed ({} reassigned, {} deleted)",
                        outcome.client_id,
                        outcome.applications_reassigned,
                        outcome.applications_deleted
                    ));
                    if !outcome.reconciliation_required.is_empty() {
                        output::print_warning(&format!(
                            "Reconciliation required for: {}",
                            outcome.reconciliation_required.join(", ")
                        ));
                    }
                }
                _ => output::print_item(&outcome, format),
            }
        }
    }

    Ok(())
}
