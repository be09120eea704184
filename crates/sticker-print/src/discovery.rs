// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// USB discovery of Brother QL label printers.
//
// Each configured backend is asked for its device list in turn.  Device
// addresses are parsed into vendor/product/serial, the product id is matched
// against the model catalog, and every device is probed for status and
// media.  A failing backend or a malformed address is logged and skipped;
// discovery itself never fails.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use sticker_core::catalog::{LabelType, model_by_product_id};
use sticker_core::config::PrinterSection;
use sticker_core::error::{Result, StickerError};
use sticker_core::types::{Backend, PrinterInfo, PrinterStatus, UNKNOWN_LABEL_SIZE};

use crate::probe::Prober;
use crate::transport::{DeviceDescriptor, Transport};

/// Minimum number of `/`-separated segments in a device address.
const MIN_ADDRESS_SEGMENTS: usize = 4;

/// Parsed form of a device address such as
/// `usb://0x04f9:0x2028/000H2G258173` or `usb/0x04f9/04f9:2028/000H2G258173`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAddress {
    pub protocol: String,
    /// Vendor id as written in the address.
    pub vendor_id: String,
    /// Product id as written in the address.
    pub product_id: String,
    pub product_id_value: u16,
    pub serial_number: String,
}

impl DeviceAddress {
    /// Parse an address.  Segment 0 is the protocol, segment 2 the
    /// `vendor:product` hex pair, segment 3 the serial number.
    pub fn parse(identifier: &str) -> Result<Self> {
        let parts: Vec<&str> = identifier.split('/').collect();
        if parts.len() < MIN_ADDRESS_SEGMENTS {
            return Err(StickerError::MalformedDeviceAddress(format!(
                "{identifier}: expected at least {MIN_ADDRESS_SEGMENTS} segments, got {}",
                parts.len()
            )));
        }

        let protocol = parts[0].trim_end_matches(':').to_string();
        let (vendor_id, product_id) = parts[2].split_once(':').ok_or_else(|| {
            StickerError::MalformedDeviceAddress(format!(
                "{identifier}: device segment {:?} is not vendor:product",
                parts[2]
            ))
        })?;
        let product_id_value = parse_hex_u16(product_id).ok_or_else(|| {
            StickerError::MalformedDeviceAddress(format!(
                "{identifier}: invalid product id {product_id:?}"
            ))
        })?;

        Ok(Self {
            protocol,
            vendor_id: vendor_id.to_string(),
            product_id: product_id.to_string(),
            product_id_value,
            serial_number: parts[3].to_string(),
        })
    }
}

/// Parse `2028` or `0x2028`.
fn parse_hex_u16(text: &str) -> Option<u16> {
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u16::from_str_radix(digits, 16).ok()
}

/// Build an unprobed `PrinterInfo` from an enumerated device.
pub fn printer_from_descriptor(descriptor: &DeviceDescriptor, backend: Backend) -> Result<PrinterInfo> {
    let address = DeviceAddress::parse(&descriptor.identifier)?;
    let model = model_by_product_id(address.product_id_value).map(|m| m.identifier.to_string());
    if model.is_none() {
        warn!(
            identifier = %descriptor.identifier,
            product_id = %address.product_id,
            "product id not in model catalog"
        );
    }

    Ok(PrinterInfo {
        identifier: descriptor.identifier.clone(),
        backend,
        protocol: address.protocol,
        vendor_id: address.vendor_id,
        product_id: address.product_id,
        serial_number: address.serial_number,
        model,
        name: String::new(),
        status: PrinterStatus::Unknown,
        label_type: LabelType::Unknown,
        label_size: UNKNOWN_LABEL_SIZE.to_string(),
        label_width: 0,
        label_height: None,
    })
}

/// Choose the printer a job should go to: the first printable one.
pub fn select_printer(printers: &[PrinterInfo]) -> Result<&PrinterInfo> {
    if printers.is_empty() {
        return Err(StickerError::NoPrinterFound);
    }
    printers
        .iter()
        .find(|p| p.is_printable())
        .ok_or(StickerError::NoPrintablePrinter)
}

/// Printer discovery engine over the configured USB backends.
#[derive(Clone)]
pub struct Discovery {
    transport: Arc<dyn Transport>,
    prober: Prober,
    backends: Vec<Backend>,
    timeout: Duration,
}

impl Discovery {
    pub fn new(transport: Arc<dyn Transport>, config: &PrinterSection) -> Self {
        Self {
            prober: Prober::new(Arc::clone(&transport), config.status_timeout()),
            transport,
            backends: config.backends.clone(),
            timeout: config.discovery_timeout(),
        }
    }

    /// Take a fresh snapshot of all attached printers.
    ///
    /// Printers appear in backend order, then in each backend's own
    /// enumeration order.  Nothing is cached between calls.
    #[instrument(skip(self), fields(backends = ?self.backends))]
    pub async fn discover(&self) -> Vec<PrinterInfo> {
        info!("searching for Brother QL printers");
        let mut found = Vec::new();

        for &backend in &self.backends {
            let devices = match self.list_backend(backend).await {
                Ok(devices) => devices,
                Err(e) => {
                    warn!(%backend, error = %e, "backend skipped");
                    continue;
                }
            };
            debug!(%backend, count = devices.len(), "devices listed");

            for descriptor in &devices {
                let mut printer = match printer_from_descriptor(descriptor, backend) {
                    Ok(printer) => printer,
                    Err(e) => {
                        warn!(%backend, error = %e, "skipping device");
                        continue;
                    }
                };
                self.prober.probe(&mut printer).await;
                printer.name = printer.display_name();
                info!(
                    name = %printer.name,
                    identifier = %printer.identifier,
                    "printer added"
                );
                found.push(printer);
            }
        }

        info!(count = found.len(), "printer discovery finished");
        found
    }

    async fn list_backend(&self, backend: Backend) -> Result<Vec<DeviceDescriptor>> {
        tokio::time::timeout(self.timeout, self.transport.list_devices(backend))
            .await
            .map_err(|_| StickerError::DiscoveryBackend {
                backend: backend.to_string(),
                detail: format!("no answer within {}s", self.timeout.as_secs_f32()),
            })?
    }
}
