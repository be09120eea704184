// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the people standing at the sticker
// printer.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The severity drives how the front end presents it.

use crate::error::StickerError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Worth trying again as-is.
    Transient,
    /// User must do something (plug in the printer, load labels).
    ActionRequired,
    /// Retrying will not help.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    pub severity: Severity,
}

impl HumanError {
    fn new(message: &str, suggestion: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            severity,
        }
    }
}

/// Convert a `StickerError` into a `HumanError`.
pub fn humanize_error(err: &StickerError) -> HumanError {
    match err {
        StickerError::NoPrinterFound => HumanError::new(
            "No Brother QL printer found.",
            "Please check the USB cable and that the printer is switched on, then try again.",
            Severity::ActionRequired,
        ),

        StickerError::NoPrintablePrinter => HumanError::new(
            "The printer was found but its labels could not be read.",
            "Check that a label roll is loaded and the cover is closed, or set label_type in config.toml.",
            Severity::ActionRequired,
        ),

        StickerError::DiscoveryBackend { .. }
        | StickerError::MalformedDeviceAddress(_)
        | StickerError::ProbeFailure(_) => HumanError::new(
            "We had trouble talking to the printer.",
            "Unplug the printer, plug it back in, and try again.",
            Severity::Transient,
        ),

        StickerError::TransportTimeout(_) => HumanError::new(
            "The printer stopped answering.",
            "The sticker has most likely printed. If not, try again.",
            Severity::Transient,
        ),

        StickerError::Transmission(detail) => humanize_transmission(detail),

        StickerError::Conversion(_) | StickerError::Image(_) => HumanError::new(
            "This image couldn't be turned into a label.",
            "Try a different image, or save it as PNG first.",
            Severity::Permanent,
        ),

        StickerError::JobNotFound(_) => HumanError::new(
            "That print job is no longer known.",
            "Print the sticker again.",
            Severity::Permanent,
        ),

        StickerError::WaitTimeout(_) => HumanError::new(
            "The print is taking longer than expected.",
            "Check the printer; the job is still running in the background.",
            Severity::Transient,
        ),

        StickerError::Config(detail) => HumanError::new(
            "The configuration file has a mistake.",
            format!("Fix config.toml and restart. ({detail})"),
            Severity::ActionRequired,
        ),

        StickerError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError::new(
                "A file or program couldn't be found.",
                "Make sure the brother_ql tools are installed and the image path is correct.",
                Severity::ActionRequired,
            ),
            std::io::ErrorKind::PermissionDenied => HumanError::new(
                "Permission denied.",
                "Your user may need access to the USB printer (e.g. the lp group).",
                Severity::ActionRequired,
            ),
            _ => HumanError::new(
                "There was a problem reading or writing a file.",
                "Try again. If this keeps happening, the disk may be full.",
                Severity::Transient,
            ),
        },
    }
}

/// Parse transmission details into human-readable messages.
fn humanize_transmission(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("access denied") || lower.contains("permission") {
        HumanError::new(
            "The computer isn't allowed to use the printer.",
            "Add your user to the lp group or install the udev rule for the printer.",
            Severity::ActionRequired,
        )
    } else if lower.contains("no such device") || lower.contains("not found") {
        HumanError::new(
            "The printer disappeared.",
            "Check the USB cable and that the printer is switched on.",
            Severity::ActionRequired,
        )
    } else if lower.contains("busy") {
        HumanError::new(
            "The printer is busy.",
            "Wait for the current sticker to finish, then try again.",
            Severity::Transient,
        )
    } else {
        HumanError::new(
            "The printer had a problem.",
            format!("Try again. If this keeps happening, switch the printer off and on. (Detail: {detail})"),
            Severity::Transient,
        )
    }
}
