// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Transport and raster conversion backed by the brother_ql command-line
// tools.
//
// `brother_ql` handles enumeration (`discover`), the status query (`status`)
// and USB transmission (`send`); `brother_ql_create` turns a bitmap into the
// QL raster command stream on stdout.  Every invocation runs under a
// timeout and the child is killed if the timeout fires.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use sticker_core::config::PrinterSection;
use sticker_core::error::{Result, StickerError};
use sticker_core::types::Backend;

use crate::transport::{
    DeviceDescriptor, RasterConverter, RasterInstructions, RasterOptions, Transport,
    is_timeout_signature,
};

/// Timeout for raster conversion; it is CPU-bound and local.
const CONVERT_TIMEOUT: Duration = Duration::from_secs(60);

/// Run `program args…`, capturing output.  `Ok(None)` means the timeout
/// elapsed and the child was killed.
async fn run_tool(program: &str, args: &[String], timeout: Duration) -> std::io::Result<Option<Output>> {
    debug!(program, ?args, "running brother_ql tool");
    let child = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output();
    match tokio::time::timeout(timeout, child).await {
        Ok(output) => output.map(Some),
        Err(_) => Ok(None),
    }
}

/// Combined stderr/stdout text of a failed invocation, for error messages.
fn failure_detail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    match stdout.trim() {
        "" => format!("exited with {}", output.status),
        text => text.to_string(),
    }
}

/// Extract device identifiers from `brother_ql discover` output.
///
/// The tool prints one device per line, sometimes behind a label such as
/// `Found:`; the identifier is the last whitespace-separated token.
pub fn parse_discover_output(text: &str) -> Vec<DeviceDescriptor> {
    let mut devices: Vec<DeviceDescriptor> = Vec::new();
    for line in text.lines() {
        let Some(token) = line.split_whitespace().last() else {
            continue;
        };
        if !token.contains('/') {
            continue;
        }
        if devices.iter().any(|d| d.identifier == token) {
            continue;
        }
        devices.push(DeviceDescriptor::new(token));
    }
    devices
}

/// `Transport` implementation driving the `brother_ql` CLI.
#[derive(Debug, Clone)]
pub struct BrotherQlCli {
    program: String,
    discovery_timeout: Duration,
    status_timeout: Duration,
    print_timeout: Duration,
}

impl BrotherQlCli {
    pub fn new(config: &PrinterSection) -> Self {
        Self {
            program: config.brother_ql.clone(),
            discovery_timeout: config.discovery_timeout(),
            status_timeout: config.status_timeout(),
            print_timeout: config.print_timeout(),
        }
    }

    fn base_args(backend: Backend) -> Vec<String> {
        vec!["--backend".into(), backend.as_str().into()]
    }
}

#[async_trait]
impl Transport for BrotherQlCli {
    async fn list_devices(&self, backend: Backend) -> Result<Vec<DeviceDescriptor>> {
        let mut args = Self::base_args(backend);
        args.push("discover".into());

        let backend_error = |detail: String| StickerError::DiscoveryBackend {
            backend: backend.to_string(),
            detail,
        };

        let output = run_tool(&self.program, &args, self.discovery_timeout)
            .await
            .map_err(|e| backend_error(format!("run {}: {e}", self.program)))?
            .ok_or_else(|| {
                backend_error(format!(
                    "discover timed out after {}s",
                    self.discovery_timeout.as_secs()
                ))
            })?;

        if !output.status.success() {
            return Err(backend_error(failure_detail(&output)));
        }

        // brother_ql logs found devices on stderr in some versions.
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push('\n');
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(parse_discover_output(&text))
    }

    async fn query_status(&self, model: &str, identifier: &str, backend: Backend) -> Result<String> {
        let mut args = Self::base_args(backend);
        args.extend([
            "--model".into(),
            model.into(),
            "--printer".into(),
            identifier.into(),
            "status".into(),
        ]);

        let output = run_tool(&self.program, &args, self.status_timeout)
            .await
            .map_err(|e| StickerError::ProbeFailure(format!("run {}: {e}", self.program)))?
            .ok_or_else(|| {
                StickerError::ProbeFailure(format!(
                    "status query timed out after {}s",
                    self.status_timeout.as_secs()
                ))
            })?;

        if !output.status.success() {
            return Err(StickerError::ProbeFailure(failure_detail(&output)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn transmit(
        &self,
        instructions: &RasterInstructions,
        identifier: &str,
        backend: Backend,
    ) -> Result<bool> {
        let file = tempfile::Builder::new()
            .prefix("sticker-")
            .suffix(".bin")
            .tempfile()?;
        tokio::fs::write(file.path(), instructions.as_bytes()).await?;

        let mut args = Self::base_args(backend);
        args.extend([
            "--printer".into(),
            identifier.into(),
            "send".into(),
            file.path().display().to_string(),
        ]);

        info!(identifier, bytes = instructions.len(), "sending raster data");
        let output = run_tool(&self.program, &args, self.print_timeout)
            .await
            .map_err(|e| StickerError::Transmission(format!("run {}: {e}", self.program)))?
            .ok_or_else(|| {
                StickerError::Transmission(format!(
                    "no answer from brother_ql after {}s",
                    self.print_timeout.as_secs()
                ))
            })?;

        if output.status.success() {
            return Ok(true);
        }

        let detail = failure_detail(&output);
        if is_timeout_signature(&detail) {
            warn!(identifier, detail = %detail, "USB timeout during send");
            Err(StickerError::TransportTimeout(detail))
        } else {
            Err(StickerError::Transmission(detail))
        }
    }
}

/// `RasterConverter` implementation running `brother_ql_create`.
#[derive(Debug, Clone)]
pub struct BrotherQlConverter {
    program: String,
}

impl BrotherQlConverter {
    pub fn new(config: &PrinterSection) -> Self {
        Self {
            program: config.brother_ql_create.clone(),
        }
    }
}

/// Command-line arguments for `brother_ql_create`.
pub fn create_args(image_path: &Path, options: &RasterOptions) -> Vec<String> {
    let mut args = vec![
        "--model".to_string(),
        options.model.clone(),
        "--label-size".into(),
        options.label_type.code().into(),
        "--rotate".into(),
        options.rotate.degrees().to_string(),
        "--threshold".into(),
        options.threshold.to_string(),
    ];
    if options.dither {
        args.push("--dither".into());
    }
    if options.compress {
        args.push("--compress".into());
    }
    if options.red {
        args.push("--red".into());
    }
    if options.dpi_600 {
        args.push("--600dpi".into());
    }
    if !options.hq {
        args.push("--lq".into());
    }
    if !options.cut {
        args.push("--no-cut".into());
    }
    args.push(image_path.display().to_string());
    args
}

#[async_trait]
impl RasterConverter for BrotherQlConverter {
    async fn convert(&self, image_path: &Path, options: &RasterOptions) -> Result<RasterInstructions> {
        let args = create_args(image_path, options);
        let output = run_tool(&self.program, &args, CONVERT_TIMEOUT)
            .await
            .map_err(|e| StickerError::Conversion(format!("run {}: {e}", self.program)))?
            .ok_or_else(|| {
                StickerError::Conversion(format!(
                    "conversion timed out after {}s",
                    CONVERT_TIMEOUT.as_secs()
                ))
            })?;

        if !output.status.success() {
            return Err(StickerError::Conversion(failure_detail(&output)));
        }
        if output.stdout.is_empty() {
            return Err(StickerError::Conversion("converter produced no data".into()));
        }
        Ok(RasterInstructions(output.stdout))
    }
}
