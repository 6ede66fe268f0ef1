//! Runs one upload from the command line.

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use driveup_protocol::ShareTarget;
use driveup_relay::{RelayClient, RelayConfig};
use driveup_session::{BlockReason, ProgressSimulator, SessionError, UploadController};
use driveup_transfer::{SelectedFile, accept_attribute, category_of, format_bytes};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Args;

const EXIT_BLOCKED: u8 = 2;
const EXIT_CANCELLED: u8 = 130;

/// Validates, renames and uploads `args.file`. Returns the process exit code.
pub async fn run(args: Args, config: RelayConfig) -> anyhow::Result<ExitCode> {
    let file = SelectedFile::from_path(&args.file, args.mime.as_deref())
        .await
        .with_context(|| format!("cannot open {}", args.file.display()))?;
    info!(
        file = %file.name(),
        size = %format_bytes(file.size_bytes() as f64),
        category = %category_of(file.name()),
        mime = %file.mime_type(),
        "file selected"
    );

    let client = RelayClient::new(config)?;
    let mut controller = UploadController::new(client, ProgressSimulator::from_entropy());

    let validation = controller.select_file(file);
    controller.set_new_name(args.name);

    if let Some(reason) = controller.disable_reason() {
        match reason {
            BlockReason::Invalid(_) => {
                for error in validation.errors() {
                    eprintln!("error: {error}");
                }
                eprintln!("accepted: {}", accept_attribute());
            }
            other => eprintln!("error: {other}"),
        }
        return Ok(ExitCode::from(EXIT_BLOCKED));
    }

    info!(final_name = %controller.preview_final_name(), "ready to upload");

    let cancel = controller.cancel_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling upload");
            cancel.cancel();
        }
    });

    let reporter_done = CancellationToken::new();
    let reporter = tokio::spawn(report_progress(
        controller.subscribe_progress(),
        reporter_done.clone(),
        std::io::stderr(),
    ));

    let result = controller.upload().await;
    interrupt.abort();
    reporter_done.cancel();
    let _ = reporter.await;
    eprintln!();

    match result {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            match outcome.share_target() {
                Some(ShareTarget::OpenUrl(url)) => eprintln!("open: {url}"),
                Some(ShareTarget::CopyFileId(id)) => eprintln!("file id: {id}"),
                None => {}
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_cancelled() => {
            eprintln!("{e}");
            Ok(ExitCode::from(EXIT_CANCELLED))
        }
        Err(SessionError::Blocked(reason)) => {
            eprintln!("error: {reason}");
            Ok(ExitCode::from(EXIT_BLOCKED))
        }
        Err(SessionError::Upload(e)) => {
            eprintln!("upload failed: {e}");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Writes progress updates to `out` until `done` fires, then writes the
/// latest value if it has not been shown yet.
async fn report_progress<W: Write>(
    mut progress: watch::Receiver<u8>,
    done: CancellationToken,
    mut out: W,
) -> W {
    let mut shown = None;
    loop {
        tokio::select! {
            biased;
            _ = done.cancelled() => break,
            changed = progress.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
        let value = *progress.borrow_and_update();
        write_progress(&mut out, value, &mut shown);
    }

    let value = *progress.borrow_and_update();
    write_progress(&mut out, value, &mut shown);
    out
}

fn write_progress<W: Write>(out: &mut W, value: u8, shown: &mut Option<u8>) {
    if *shown == Some(value) {
        return;
    }
    let _ = write!(out, "\rprogress {value:>3}%");
    let _ = out.flush();
    *shown = Some(value);
}
