use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use appointment_core::{upcoming, DashboardSummary};
use chrono::Local;
use clap::{Parser, Subcommand};
use client_core::{AppointmentBackend, AppointmentsController, ClinicClient, ReportFile};
use shared::{
    domain::{AppointmentId, AppointmentStatus, StatusSelector, TimeWindow},
    protocol::AppointmentUpdate,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(name = "clinic-dashboard", about = "Clinic appointment dashboard")]
struct Cli {
    /// TOML settings file; `dashboard.toml` is read when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the configured clinic API base URL.
    #[arg(long)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Headline counts, upcoming visits, then every appointment.
    Summary,
    /// Appointments for one status tab, narrowed to a time window.
    List {
        #[arg(long, default_value = "all")]
        status: StatusSelector,
        #[arg(long, default_value = "all")]
        window: TimeWindow,
    },
    /// Edits an appointment; unspecified fields keep their current values.
    Update {
        id: i64,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        status: Option<AppointmentStatus>,
        #[arg(long)]
        medical_requirement: Option<String>,
        #[arg(long)]
        remarks: Option<String>,
        #[arg(long)]
        report_url: Option<String>,
        /// Uploads this report first and saves its URL with the edit.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Uploads a clinic report (image or PDF) for an appointment.
    UploadReport {
        id: i64,
        path: PathBuf,
        /// Also save the appointment so it references the uploaded report.
        #[arg(long)]
        save: bool,
    },
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        settings.api_base_url = base_url;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let client = ClinicClient::new(&settings.api_base_url, settings.session_cookie.as_deref())
        .with_context(|| format!("cannot use clinic api at '{}'", settings.api_base_url))?;
    info!(base_url = %client.base_url(), "clinic dashboard starting");

    let now = Local::now();
    match cli.command {
        Command::Summary => {
            let all = client.fetch_appointments(StatusSelector::All).await?;
            let next = upcoming(&all, &now);
            let totals = DashboardSummary::from_appointments(&all, &now);
            print!("{}", render::summary(totals, &next, &all, &Local));
        }
        Command::List { status, window } => {
            let mut controller = AppointmentsController::new(client, window);
            controller.select_status(status).await?;
            let visible = controller.visible(&now);
            print!("{}", render::list(status, &visible, &Local));
        }
        Command::Update {
            id,
            date,
            status,
            medical_requirement,
            remarks,
            report_url,
            report,
        } => {
            let id = AppointmentId(id);
            let mut controller = AppointmentsController::new(client, TimeWindow::AllTime);
            controller.select_status(StatusSelector::All).await?;
            let mut draft = controller
                .edit(id)
                .ok_or_else(|| anyhow!("appointment {id} not found"))?;
            apply_edits(
                &mut draft,
                Edits {
                    date,
                    status,
                    medical_requirement,
                    remarks,
                    report_url,
                },
            );
            if let Some(path) = report {
                let file = ReportFile::from_path(&path).await?;
                let uploaded = controller.attach_report(id, file, &mut draft).await?;
                println!("Report uploaded: {uploaded}");
            }
            let saved = controller.save(id, &draft).await?;
            println!("{}", render::card(&saved, &Local));
        }
        Command::UploadReport { id, path, save } => {
            let id = AppointmentId(id);
            let file = ReportFile::from_path(&path).await?;
            if save {
                let mut controller = AppointmentsController::new(client, TimeWindow::AllTime);
                controller.select_status(StatusSelector::All).await?;
                let mut draft = controller
                    .edit(id)
                    .ok_or_else(|| anyhow!("appointment {id} not found"))?;
                let uploaded = controller.attach_report(id, file, &mut draft).await?;
                println!("Report uploaded: {uploaded}");
                let saved = controller.save(id, &draft).await?;
                println!("{}", render::card(&saved, &Local));
            } else {
                let uploaded = client.upload_report_file(id, file).await?;
                println!("Report uploaded: {uploaded}");
            }
        }
        Command::Logout => {
            // The local session ends whether or not the server acknowledged it.
            if let Err(error) = client.logout().await {
                warn!(%error, "logout request failed");
            }
            println!("Logged out");
        }
    }

    Ok(())
}

#[derive(Debug, Default)]
struct Edits {
    date: Option<String>,
    status: Option<AppointmentStatus>,
    medical_requirement: Option<String>,
    remarks: Option<String>,
    report_url: Option<String>,
}

fn apply_edits(draft: &mut AppointmentUpdate, edits: Edits) {
    if let Some(date) = edits.date {
        draft.appointment_date = date;
    }
    if let Some(status) = edits.status {
        draft.status = status;
    }
    if let Some(requirement) = edits.medical_requirement {
        draft.medical_requirement = requirement;
    }
    if let Some(remarks) = edits.remarks {
        draft.remarks = remarks;
    }
    if let Some(url) = edits.report_url {
        draft.clinic_report_url = url;
    }
}
