//! Application commands: submit, view, and status updates.

use anyhow::{Context, Result};
use base64::Engine;
use clap::Subcommand;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{self, OutputFormat};

#[derive(Subcommand)]
pub enum ApplicationCommands {
    /// Submit a new application
    Submit {
        /// Service category (loan, ca_service, government_scheme)
        #[arg(short, long)]
        category: String,

        /// Application type (e.g. home_loan, tax_filing)
        #[arg(short = 't', long = "type")]
        application_type: String,

        /// Form data as inline JSON, or @path to a JSON file
        #[arg(short, long, default_value = "{}")]
        form: String,

        /// Applicant user id (partners and admins submitting on behalf)
        #[arg(long)]
        applicant: Option<String>,

        /// Attach a file as field=path (repeatable)
        #[arg(long = "attach", value_name = "FIELD=PATH")]
        attachments: Vec<String>,
    },

    /// View a single application
    View {
        /// Service category
        category: String,
        /// Application id
        id: String,
    },

    /// Update an application's status (admin)
    SetStatus {
        /// Service category
        category: String,
        /// Application id
        id: String,
        /// New status (Submitted, "In Review", Approved, Rejected, Archived)
        status: String,
        /// Message included in the notification to the applicant
        #[arg(short, long)]
        message: Option<String>,
    },
}

// ── API types ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct SubmitRequest {
    service_category: String,
    application_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    applicant_user_id: Option<String>,
    form_data: serde_json::Value,
    attachments: Vec<AttachmentReq>,
}

#[derive(Serialize)]
struct AttachmentReq {
    field: String,
    filename: String,
    data_uri: String,
}

#[derive(Serialize)]
struct SetStatusRequest {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct ApplicationInfo {
    id: String,
    service_category: String,
    application_type: String,
    status: String,
    applicant_details: ApplicantInfo,
    created_at: String,
    #[serde(default)]
    form_data: serde_json::Value,
}

#[derive(Debug, Deserialize, Serialize)]
struct ApplicantInfo {
    full_name: String,
    email: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct StatusChangeInfo {
    application_id: String,
    from: String,
    to: String,
    changed_at: String,
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
    #[tabled(rename = "Applicant")]
    applicant: String,
    #[tabled(rename = "Created")]
    created_at: String,
}

impl From<&ApplicationInfo> for ApplicationRow {
    fn from(info: &ApplicationInfo) -> Self {
        Self {
            id: info.id.clone(),
            category: info.service_category.clone(),
            application_type: info.application_type.clone(),
            status: info.status.clone(),
            applicant: format!("{} <{}>", info.applicant_details.full_name, info.applicant_details.email),
            created_at: info.created_at.clone(),
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn load_form(form: &str) -> Result<serde_json::Value> {
    let raw = match form.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read form file {}", path))?,
        None => form.to_string(),
    };
    serde_json::from_str(&raw).context("Form data is not valid JSON")
}

fn guess_content_type(filename: &str) -> &'static str {
    match filename.rsplit_once('.').map(|(_, ext)| ext) {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

fn load_attachment(spec: &str) -> Result<AttachmentReq> {
    let (field, path) = spec
        .split_once('=')
        .context("Attachment must be given as FIELD=PATH")?;
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read attachment {}", path))?;
    let filename = path.rsplit('/').next().unwrap_or(path).to_string();
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(AttachmentReq {
        field: field.to_string(),
        data_uri: format!("data:{};base64,{}", guess_content_type(&filename), encoded),
        filename,
    })
}

// ── Execution ───────────────────────────────────────────────────────────────

pub async fn execute(
    cmd: ApplicationCommands,
    client: &ApiClient,
    format: OutputFormat,
) -> Result<()> {
    match cmd {
        ApplicationCommands::Submit {
            category,
            application_type,
            form,
            applicant,
            attachments,
        } => {
            let attachments = attachments
                .iter()
                .map(|spec| load_attachment(spec))
                .collect::<Result<Vec<_>>>()?;

            let request = SubmitRequest {
                service_category: category,
                application_type,
                applicant_user_id: applicant,
                form_data: load_form(&form)?,
                attachments,
            };

            let info: ApplicationInfo = client.post("/api/v1/applications", &request).await?;
            match format {
                OutputFormat::Table => {
                    output::print_success(&format!("Application {} submitted", info.id));
                    output::print_list(&[ApplicationRow::from(&info)], format);
                }
                _ => output::print_item(&info, format),
            }
        }

        ApplicationCommands::View { category, id } => {
            let info: ApplicationInfo = client
                .get(&format!("/api/v1/applications/{}/{}", category, id))
                .await?;
            match format {
                OutputFormat::Table => {
                    output::print_list(&[ApplicationRow::from(&info)], format);
                }
                _ => output::print_item(&info, format),
            }
        }

        ApplicationCommands::SetStatus {
            category,
            id,
            status,
            message,
        } => {
            let request = SetStatusRequest { status, message };
            let change: StatusChangeInfo = client
                .put(
                    &format!("/api/v1/applications/{}/{}/status", category, id),
                    &request,
                )
                .await?;
            match format {
                OutputFormat::Table => {
                    output::print_success(&format!(
                        "Application {}: {} -> {}",
                        change.application_id, change.from, change.to
                    ));
                }
                _ => output::print_item(&change, format),
            }
        }
    }

    Ok(())
}
