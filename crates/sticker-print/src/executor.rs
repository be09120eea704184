// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print executor: rasterize a bitmap and transmit it to one printer.
//
// The QL firmware often leaves the USB write hanging after the label has
// already been printed, so a transport timeout is reported as a success with
// an advisory instead of a failure.

use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat};
use tracing::{error, info, instrument, warn};

use sticker_core::catalog::LabelType;
use sticker_core::error::{Result, StickerError};
use sticker_core::types::{PrinterInfo, Rotation};

use crate::transport::{RasterConverter, RasterOptions, Transport, is_timeout_signature};

/// Message recorded when a print ended in a benign USB timeout.
pub const TIMEOUT_ADVISORY: &str = "Print completed (timeout is normal)";

/// Message recorded when the transport returned without confirmation.
const UNCONFIRMED: &str = "Failed to print using the transport";

/// Result of one print attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintOutcome {
    Success,
    /// The transport timed out after sending; the label almost certainly
    /// printed.  Carries an advisory for the user.
    SuccessAfterTimeout(String),
    Failure(String),
}

impl PrintOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failure(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::SuccessAfterTimeout(msg) | Self::Failure(msg) => Some(msg),
        }
    }

    /// `(success, message)`.
    pub fn into_parts(self) -> (bool, Option<String>) {
        match self {
            Self::Success => (true, None),
            Self::SuccessAfterTimeout(msg) => (true, Some(msg)),
            Self::Failure(msg) => (false, Some(msg)),
        }
    }
}

/// Map a transport result onto a print outcome.
pub fn classify_transport_result(result: Result<bool>) -> PrintOutcome {
    match result {
        Ok(true) => PrintOutcome::Success,
        Ok(false) => PrintOutcome::Failure(UNCONFIRMED.into()),
        Err(StickerError::TransportTimeout(detail)) => {
            warn!(detail = %detail, "transport timed out after sending, treating as printed");
            PrintOutcome::SuccessAfterTimeout(TIMEOUT_ADVISORY.into())
        }
        Err(e) if is_timeout_signature(&e.to_string()) => {
            warn!(error = %e, "timeout signature in transport error, treating as printed");
            PrintOutcome::SuccessAfterTimeout(TIMEOUT_ADVISORY.into())
        }
        Err(e) => PrintOutcome::Failure(e.to_string()),
    }
}

/// Drives the converter and transport for single print jobs.
#[derive(Clone)]
pub struct PrintExecutor {
    converter: Arc<dyn RasterConverter>,
    transport: Arc<dyn Transport>,
}

impl PrintExecutor {
    pub fn new(converter: Arc<dyn RasterConverter>, transport: Arc<dyn Transport>) -> Self {
        Self {
            converter,
            transport,
        }
    }

    /// Print the bitmap at `image_path` on `printer`.  Never fails; errors
    /// become `PrintOutcome::Failure`.
    #[instrument(skip(self, printer), fields(printer = %printer.identifier))]
    pub async fn execute(
        &self,
        image_path: &Path,
        printer: &PrinterInfo,
        rotate: Rotation,
        dither: bool,
        label_type: LabelType,
    ) -> PrintOutcome {
        let Some(model) = printer.model.as_deref() else {
            error!("printer has no known model");
            return PrintOutcome::Failure(format!(
                "printer {} has no known model",
                printer.identifier
            ));
        };
        if !label_type.is_known() {
            error!("label type is unknown");
            return PrintOutcome::Failure("label type is unknown".into());
        }

        let options = RasterOptions::for_job(model, label_type, rotate, dither);
        let instructions = match self.converter.convert(image_path, &options).await {
            Ok(instructions) => instructions,
            Err(e) => {
                error!(error = %e, "raster conversion failed");
                return PrintOutcome::Failure(e.to_string());
            }
        };
        info!(bytes = instructions.len(), "raster instructions ready");

        let result = self
            .transport
            .transmit(&instructions, &printer.identifier, printer.backend)
            .await;
        let outcome = classify_transport_result(result);
        match &outcome {
            PrintOutcome::Failure(msg) => error!(error = %msg, "print failed"),
            _ => info!("print sent"),
        }
        outcome
    }

    /// Write `image` to a temporary PNG and print it.  The file is removed
    /// when the job finishes.
    pub async fn print_image(
        &self,
        image: Arc<DynamicImage>,
        printer: &PrinterInfo,
        rotate: Rotation,
        dither: bool,
        label_type: LabelType,
    ) -> PrintOutcome {
        let file = match write_temp_png(image).await {
            Ok(file) => file,
            Err(e) => {
                error!(error = %e, "could not stage image for printing");
                return PrintOutcome::Failure(e.to_string());
            }
        };
        self.execute(file.path(), printer, rotate, dither, label_type)
            .await
    }
}

async fn write_temp_png(image: Arc<DynamicImage>) -> Result<tempfile::NamedTempFile> {
    tokio::task::spawn_blocking(move || -> Result<tempfile::NamedTempFile> {
        let file = tempfile::Builder::new()
            .prefix("sticker-")
            .suffix(".png")
            .tempfile()?;
        image
            .save_with_format(file.path(), ImageFormat::Png)
            .map_err(|e| StickerError::Image(format!("encode PNG: {e}")))?;
        Ok(file)
    })
    .await
    .map_err(|e| StickerError::Image(format!("image task failed: {e}")))?
}
