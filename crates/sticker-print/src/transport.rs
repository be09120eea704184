// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Seams to the printer driver.
//
// Raster conversion and USB transmission are not implemented here: they are
// reached through the `RasterConverter` and `Transport` traits so the job
// lifecycle can be driven by the brother_ql tools in production and by
// scripted fakes in tests.

use std::path::Path;

use async_trait::async_trait;

use sticker_core::catalog::LabelType;
use sticker_core::error::Result;
use sticker_core::types::{Backend, Rotation};

/// Fixed black/white threshold (percent) used for every print.
pub const PRINT_THRESHOLD: u8 = 70;

/// One device reported by a backend's enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Address such as `usb://0x04f9:0x2028/000H2G258173`.
    pub identifier: String,
}

impl DeviceDescriptor {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }
}

/// Device-specific raster command stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterInstructions(pub Vec<u8>);

impl RasterInstructions {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parameters handed to the raster converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterOptions {
    pub model: String,
    pub label_type: LabelType,
    pub rotate: Rotation,
    pub threshold: u8,
    pub dither: bool,
    pub compress: bool,
    /// Two-colour (black/red) printing.
    pub red: bool,
    pub dpi_600: bool,
    /// High-quality rasterization; `false` selects the faster low-quality
    /// mode.
    pub hq: bool,
    pub cut: bool,
}

impl RasterOptions {
    /// Options for a sticker job: monochrome, standard resolution, low
    /// quality, compressed, cut after printing, fixed threshold.
    pub fn for_job(model: &str, label_type: LabelType, rotate: Rotation, dither: bool) -> Self {
        Self {
            model: model.to_string(),
            label_type,
            rotate,
            threshold: PRINT_THRESHOLD,
            dither,
            compress: true,
            red: false,
            dpi_600: false,
            hq: false,
            cut: true,
        }
    }
}

/// Converts a bitmap file into raster instructions.
#[async_trait]
pub trait RasterConverter: Send + Sync {
    async fn convert(&self, image_path: &Path, options: &RasterOptions) -> Result<RasterInstructions>;
}

/// USB transport to the printer.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Enumerate devices visible to `backend`.
    async fn list_devices(&self, backend: Backend) -> Result<Vec<DeviceDescriptor>>;

    /// Run a status query and return the device's free-text report.
    async fn query_status(&self, model: &str, identifier: &str, backend: Backend) -> Result<String>;

    /// Send instructions to the device. `Ok(false)` means the device did not
    /// confirm the job.
    async fn transmit(
        &self,
        instructions: &RasterInstructions,
        identifier: &str,
        backend: Backend,
    ) -> Result<bool>;
}

/// Whether a transport error message carries the USB timeout signature
/// (libusb `ETIMEDOUT`, errno 110).
pub fn is_timeout_signature(detail: &str) -> bool {
    let lower = detail.to_ascii_lowercase();
    lower.contains("timed out")
        || lower.contains("errno 110")
        || lower.contains("etimedout")
}
