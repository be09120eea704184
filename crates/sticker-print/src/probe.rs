// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer status and media probe.
//
// Queries a printer's status report and folds the `Phase:` and `Media size:`
// lines into its `PrinterInfo`.  Probing never fails: any problem leaves the
// printer with an unknown status and unresolved media.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use sticker_core::catalog::LabelType;
use sticker_core::error::{Result, StickerError};
use sticker_core::types::{PrinterInfo, PrinterStatus};

use crate::transport::Transport;

/// Fields of interest from a free-text status report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    /// Trimmed value of the `Phase:` line.
    pub phase: Option<String>,
    /// Trimmed value of the `Media size:` line.
    pub media_size: Option<String>,
    /// Leading millimetre width parsed from `media_size`.
    pub media_width_mm: Option<u32>,
}

/// Parse a status report.  Later lines win if a key repeats.
pub fn parse_status_report(text: &str) -> StatusReport {
    let mut report = StatusReport::default();
    for line in text.lines() {
        if let Some((_, phase)) = line.split_once("Phase:") {
            report.phase = Some(phase.trim().to_string());
        }
        if let Some((_, size)) = line.split_once("Media size:") {
            let size = size.trim();
            report.media_size = Some(size.to_string());
            report.media_width_mm = parse_media_width(size);
        }
    }
    report
}

/// Leading integer before the `x` in e.g. `62x100` or `62 x 0 mm`.
fn parse_media_width(size: &str) -> Option<u32> {
    let head = size.split(['x', 'X']).next()?.trim();
    let digits: String = head.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Apply a parsed report to a printer.
pub fn apply_status_report(printer: &mut PrinterInfo, report: &StatusReport) {
    if let Some(phase) = &report.phase {
        printer.status = PrinterStatus::from_phase(phase);
    }
    if let Some(size) = &report.media_size {
        printer.label_size = size.clone();
        match report.media_width_mm.and_then(LabelType::from_width_mm) {
            Some(label_type) => printer.set_label_type(label_type),
            None => {
                debug!(size = %size, "media width not in label table");
                printer.label_type = LabelType::Unknown;
                printer.label_width = 0;
                printer.label_height = None;
            }
        }
    }
}

/// Runs status queries against printers.
#[derive(Clone)]
pub struct Prober {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl Prober {
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Refresh `printer`'s status and media fields in place.
    pub async fn probe(&self, printer: &mut PrinterInfo) {
        match self.query(printer).await {
            Ok(text) => {
                let report = parse_status_report(&text);
                apply_status_report(printer, &report);
                info!(
                    identifier = %printer.identifier,
                    status = %printer.status,
                    label_type = %printer.label_type,
                    "printer probed"
                );
            }
            Err(e) => {
                warn!(identifier = %printer.identifier, error = %e, "status probe failed");
                printer.status = PrinterStatus::Unknown;
                printer.clear_media();
            }
        }
    }

    async fn query(&self, printer: &PrinterInfo) -> Result<String> {
        let model = printer.model.as_deref().ok_or_else(|| {
            StickerError::ProbeFailure(format!("no model known for {}", printer.identifier))
        })?;
        tokio::time::timeout(
            self.timeout,
            self.transport
                .query_status(model, &printer.identifier, printer.backend),
        )
        .await
        .map_err(|_| {
            StickerError::ProbeFailure(format!(
                "status query timed out after {:.1}s",
                self.timeout.as_secs_f32()
            ))
        })?
    }
}
