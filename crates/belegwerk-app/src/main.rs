// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Belegwerk — receipt, invoice and billing-sheet capture
//
// Entry point. Initialises logging and services, then runs one command.

mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use belegwerk_bridge::traits::NativeCamera;
use belegwerk_bridge::{MockCamera, platform_bridge};
use belegwerk_capture::{
    BatchController, CaptureStateMachine, ConfirmationEditor, DraftField, ExtractionNote,
    SessionSnapshot,
};
use belegwerk_core::error::{BelegwerkError, Result};
use belegwerk_core::human_errors::humanize_error;
use belegwerk_core::{DocumentDomain, ExtractionResult, RecordStatus, TargetPeriod};
use belegwerk_document::SelectedFile;
use belegwerk_extract::RecognitionService;
use belegwerk_store::{RecordStore, StoredRecord};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};

use services::app_services::AppServices;

#[derive(Debug, Parser)]
#[command(name = "belegwerk", version, about = "Capture receipts, invoices and billing sheets as records")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run files through preprocessing, recognition and save.
    Scan {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Keep going past documents that cannot be saved and report a count.
        #[arg(long)]
        batch: bool,
        #[arg(long, value_enum)]
        domain: Option<DomainArg>,
        /// Book the records against this month (YYYY-MM).
        #[arg(long)]
        period: Option<String>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },
    /// Capture one document with the camera.
    Camera {
        /// Use the synthetic in-memory camera.
        #[arg(long)]
        mock: bool,
    },
    /// List stored records, newest first.
    Records {
        #[arg(long)]
        period: Option<String>,
    },
    /// Show or write the configuration file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum ConfigAction {
    Show,
    Init,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DomainArg {
    Financial,
    Billing,
}

impl From<DomainArg> for DocumentDomain {
    fn from(arg: DomainArg) -> Self {
        match arg {
            DomainArg::Financial => DocumentDomain::Financial,
            DomainArg::Billing => DocumentDomain::Billing,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StatusArg {
    Completed,
    Pending,
}

impl From<StatusArg> for RecordStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Completed => RecordStatus::Completed,
            StatusArg::Pending => RecordStatus::Pending,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, kind = ?err.kind(), "command failed");
            let human = humanize_error(&err);
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<()> {
    let mut services = AppServices::init()?;

    match command {
        Command::Scan {
            files,
            batch,
            domain,
            period,
            status,
        } => {
            if let Some(domain) = domain {
                services.config_mut().domain = domain.into();
            }
            if let Some(status) = status {
                services.config_mut().default_status = status.into();
            }
            let period = period.as_deref().map(parse_period).transpose()?;
            let machine = services.capture_machine(platform_bridge())?;
            scan(BatchController::new(machine), files, batch, period).await
        }
        Command::Camera { mock } => {
            if mock {
                capture_once(services.capture_machine(MockCamera::default())?).await
            } else {
                capture_once(services.capture_machine(platform_bridge())?).await
            }
        }
        Command::Records { period } => {
            let store = services.open_store()?;
            let records = match period.as_deref().map(parse_period).transpose()? {
                Some(period) => store.records().records_for_period(period)?,
                None => store.records().all_records()?,
            };
            for record in &records {
                println!("{}", describe(record));
            }
            println!("{} record(s)", records.len());
            Ok(())
        }
        Command::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", serde_json::to_string_pretty(services.config())?);
                Ok(())
            }
            ConfigAction::Init => {
                services.save_config()?;
                println!("wrote {}", services.config_path().display());
                Ok(())
            }
        },
    }
}

async fn scan<C, R, S>(
    mut controller: BatchController<C, R, S>,
    files: Vec<PathBuf>,
    batch: bool,
    period: Option<TargetPeriod>,
) -> Result<()>
where
    C: NativeCamera,
    R: RecognitionService,
    S: RecordStore,
{
    if batch {
        controller.start();
    }

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let file = match std::fs::read(&path) {
            Ok(bytes) => SelectedFile::new(name.clone(), bytes),
            Err(e) if batch => {
                warn!(file = %path.display(), error = %e, "unreadable file skipped");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        println!("{name}");
        if let Err(err) = controller.machine().select_file(file).await {
            if batch {
                println!("  skipped: {}", humanize_error(&err).message);
                continue;
            }
            return Err(err);
        }
        if let Some(period) = period {
            controller.machine().set_period(period)?;
        }
        let snapshot = controller.machine().snapshot();
        print_draft(&snapshot);

        if batch && !snapshot.can_commit {
            println!("  skipped: nothing to save without the required field");
            controller.skip().await?;
            continue;
        }
        match controller.confirm().await {
            Ok(id) => println!("  saved {id}"),
            Err(err @ BelegwerkError::MissingRequiredField(_)) => {
                println!("  not saved: {err}");
                controller.machine().cancel();
            }
            Err(err) => return Err(err),
        }
    }

    if batch {
        let summary = controller.finish();
        println!("{} document(s) processed", summary.processed_count);
    }
    Ok(())
}

async fn capture_once<C, R, S>(machine: CaptureStateMachine<C, R, S>) -> Result<()>
where
    C: NativeCamera,
    R: RecognitionService,
    S: RecordStore,
{
    machine.start_camera().await?;
    info!("camera live, capturing");
    machine.capture().await?;
    print_draft(&machine.snapshot());

    match machine.confirm().await {
        Ok(id) => {
            println!("  saved {id}");
            Ok(())
        }
        Err(err @ BelegwerkError::MissingRequiredField(_)) => {
            println!("  not saved: {err}");
            machine.cancel();
            Ok(())
        }
        Err(err) => Err(err),
    }
}

fn print_draft(snapshot: &SessionSnapshot) {
    let Some(draft) = &snapshot.draft else {
        return;
    };
    match &snapshot.extraction {
        ExtractionNote::NotAttempted => println!("  manual entry"),
        ExtractionNote::Complete => println!("  recognised"),
        ExtractionNote::Partial => println!("  partly recognised"),
        ExtractionNote::Failed(reason) => println!("  not recognised: {reason}"),
    }

    let editor = ConfirmationEditor::new(draft.fields.clone(), draft.period, draft.status);
    for field in DraftField::for_domain(editor.domain()) {
        if *field == DraftField::RawText {
            continue;
        }
        let value = editor.display(*field);
        if !value.is_empty() {
            println!("  {:<16} {value}", field.name());
        }
    }
    println!("  {:<16} {}", "period", draft.period);
    println!("  {:<16} {}", "status", draft.status.as_str());
}

fn parse_period(value: &str) -> Result<TargetPeriod> {
    TargetPeriod::parse(value).ok_or_else(|| {
        BelegwerkError::Validation(format!("period must be YYYY-MM, got {value:?}"))
    })
}

fn describe(record: &StoredRecord) -> String {
    let summary = match &record.fields {
        ExtractionResult::Financial(f) => format!(
            "{} {}",
            f.transaction_type.map(|t| t.as_str()).unwrap_or("-"),
            f.amount.map(|a| format!("{a:.2}")).unwrap_or_else(|| "-".into()),
        ),
        ExtractionResult::Billing(b) => format!(
            "{} {}",
            b.patient_name.as_deref().unwrap_or("-"),
            b.service_value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".into()),
        ),
    };
    format!(
        "{}  {}  {:<9} {:<9} {}",
        record.created_at.format("%Y-%m-%d %H:%M"),
        record.period,
        record.domain.as_str(),
        record.status.as_str(),
        summary,
    )
}
