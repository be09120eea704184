// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Sticker Factory.

use thiserror::Error;

use crate::types::JobId;

/// Top-level error type for all Sticker Factory operations.
#[derive(Debug, Error)]
pub enum StickerError {
    // -- Discovery --
    #[error("backend {backend} failed to list devices: {detail}")]
    DiscoveryBackend { backend: String, detail: String },

    #[error("malformed device address: {0}")]
    MalformedDeviceAddress(String),

    #[error("status probe failed: {0}")]
    ProbeFailure(String),

    #[error("no Brother QL printer found")]
    NoPrinterFound,

    #[error("no printer with a known model and label type")]
    NoPrintablePrinter,

    // -- Printing --
    #[error("USB transport timed out: {0}")]
    TransportTimeout(String),

    #[error("transmission failed: {0}")]
    Transmission(String),

    #[error("raster conversion failed: {0}")]
    Conversion(String),

    #[error("image processing failed: {0}")]
    Image(String),

    // -- Job queue --
    #[error("job {0} not found")]
    JobNotFound(JobId),

    #[error("timed out waiting for job {0}")]
    WaitTimeout(JobId),

    // -- Configuration / I/O --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, StickerError>;
