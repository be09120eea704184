// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Sticker Factory print pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::LabelType;

/// Placeholder written into `label_size` while media is undetected.
pub const UNKNOWN_LABEL_SIZE: &str = "unknown";

/// Unique identifier for a print job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle states of a print job.
///
/// `Pending → Processing → {Completed | Failed}`; terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Queued, waiting for the device to become free.
    Pending,
    /// Raster data is being built or transmitted.
    Processing,
    /// Printed (possibly after a benign transport timeout).
    Completed,
    /// Printing failed; see the job error field.
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rotation applied by the raster converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
}

impl Rotation {
    pub fn degrees(&self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
        }
    }

    pub fn from_degrees(degrees: u16) -> Option<Self> {
        match degrees {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            _ => None,
        }
    }
}

/// USB transport backend, named the way the brother_ql tools expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Backend {
    /// Generic libusb access.
    #[serde(rename = "pyusb")]
    Pyusb,
    /// The kernel's `usblp` character device.
    #[serde(rename = "linux_kernel")]
    LinuxKernel,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pyusb => "pyusb",
            Self::LinuxKernel => "linux_kernel",
        }
    }

    /// Default enumeration order.
    pub fn default_order() -> Vec<Backend> {
        vec![Self::Pyusb, Self::LinuxKernel]
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operational state reported by a printer's status query.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PrinterStatus {
    #[default]
    Unknown,
    /// "Waiting to receive".
    Ready,
    /// Printing or receiving data.
    Busy,
    /// The device reported an error phase.
    Error(String),
    /// Any other phase string, kept verbatim.
    Phase(String),
}

impl PrinterStatus {
    /// Classify a raw `Phase:` value.
    pub fn from_phase(phase: &str) -> Self {
        let phase = phase.trim();
        let lower = phase.to_ascii_lowercase();
        if phase.is_empty() {
            Self::Unknown
        } else if lower == "waiting to receive" {
            Self::Ready
        } else if lower.contains("printing") || lower.contains("receiving") {
            Self::Busy
        } else if lower.contains("error") {
            Self::Error(phase.to_string())
        } else {
            Self::Phase(phase.to_string())
        }
    }
}

impl std::fmt::Display for PrinterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => f.write_str("unknown"),
            Self::Ready => f.write_str("ready"),
            Self::Busy => f.write_str("busy"),
            Self::Error(detail) => write!(f, "error: {detail}"),
            Self::Phase(phase) => f.write_str(phase),
        }
    }
}

/// A label printer found on one of the USB backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterInfo {
    /// Transport-qualified address, e.g. `usb://0x04f9:0x2028/000H2G258173`.
    pub identifier: String,
    pub backend: Backend,
    pub protocol: String,
    pub vendor_id: String,
    pub product_id: String,
    pub serial_number: String,
    /// Catalog model; `None` when the product id is not recognised.
    pub model: Option<String>,
    pub name: String,
    pub status: PrinterStatus,
    pub label_type: LabelType,
    /// Raw media description from the status query (e.g. "62x100").
    pub label_size: String,
    /// Printable width in pixels, 0 while unresolved.
    pub label_width: u32,
    /// `None` for continuous stock.
    pub label_height: Option<u32>,
}

impl PrinterInfo {
    /// Whether a job may be sent to this printer.
    pub fn is_printable(&self) -> bool {
        self.model.is_some() && self.label_type.is_known() && self.label_width > 0
    }

    /// Reset all media fields to their unresolved values.
    pub fn clear_media(&mut self) {
        self.label_type = LabelType::Unknown;
        self.label_size = UNKNOWN_LABEL_SIZE.to_string();
        self.label_width = 0;
        self.label_height = None;
    }

    /// Set the detected label stock, keeping width in step with the type.
    pub fn set_label_type(&mut self, label_type: LabelType) {
        self.label_type = label_type;
        self.label_width = label_type.printable_width();
        self.label_height = None;
    }

    /// Display name: `"<model> - H<serial suffix> - <label size>"`.
    pub fn display_name(&self) -> String {
        let model = self.model.as_deref().unwrap_or("Unknown model");
        let suffix = self
            .serial_number
            .rsplit('H')
            .next()
            .unwrap_or(&self.serial_number);
        format!("{model} - H{suffix} - {}", self.label_size)
    }
}

/// Read-only view of a print job returned to pollers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: JobId,
    pub status: JobStatus,
    /// Set only on `Failed`.
    pub error: Option<String>,
    /// Advisory text, e.g. after a benign transport timeout.
    pub message: Option<String>,
    /// Printer as it was when the job was submitted.
    pub printer: PrinterInfo,
    pub label_type: LabelType,
    pub rotate: Rotation,
    pub dither: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printer() -> PrinterInfo {
        PrinterInfo {
            identifier: "usb://0x04f9:0x2028/000H2G258173".into(),
            backend: Backend::Pyusb,
            protocol: "usb".into(),
            vendor_id: "0x04f9".into(),
            product_id: "0x2028".into(),
            serial_number: "000H2G258173".into(),
            model: Some("QL-570".into()),
            name: String::new(),
            status: PrinterStatus::Unknown,
            label_type: LabelType::Unknown,
            label_size: UNKNOWN_LABEL_SIZE.into(),
            label_width: 0,
            label_height: None,
        }
    }

    #[test]
    fn status_transitions_are_forward_only() {
        use JobStatus::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Processing.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Processing));
    }

    #[test]
    fn phase_classification() {
        assert_eq!(PrinterStatus::from_phase(" Waiting to receive "), PrinterStatus::Ready);
        assert_eq!(PrinterStatus::from_phase("Printing state"), PrinterStatus::Busy);
        assert_eq!(
            PrinterStatus::from_phase("Turned off"),
            PrinterStatus::Phase("Turned off".into())
        );
        assert_eq!(PrinterStatus::from_phase(""), PrinterStatus::Unknown);
    }

    #[test]
    fn unknown_label_is_never_printable() {
        let mut p = printer();
        assert!(!p.is_printable());
        p.set_label_type(LabelType::Mm62);
        assert!(p.is_printable());
        assert_eq!(p.label_width, 696);
        p.clear_media();
        assert!(!p.is_printable());
        assert_eq!(p.label_width, 0);
    }

    #[test]
    fn printer_without_model_is_not_printable() {
        let mut p = printer();
        p.set_label_type(LabelType::Mm29);
        p.model = None;
        assert!(!p.is_printable());
    }

    #[test]
    fn display_name_uses_serial_suffix() {
        let mut p = printer();
        p.label_size = "62x100".into();
        assert_eq!(p.display_name(), "QL-570 - H2G258173 - 62x100");
    }

    #[test]
    fn rotation_only_accepts_supported_angles() {
        assert_eq!(Rotation::from_degrees(90), Some(Rotation::Deg90));
        assert_eq!(Rotation::from_degrees(180), None);
    }
}
