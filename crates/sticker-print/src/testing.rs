// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted transport and converter doubles for unit tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use sticker_core::catalog::LabelType;
use sticker_core::error::{Result, StickerError};
use sticker_core::types::{Backend, PrinterInfo, PrinterStatus, UNKNOWN_LABEL_SIZE};

use crate::transport::{DeviceDescriptor, RasterConverter, RasterInstructions, RasterOptions, Transport};

/// A QL-570 on pyusb with no media detected yet.
pub(crate) fn sample_printer() -> PrinterInfo {
    PrinterInfo {
        identifier: "usb://0x04f9:0x2028/000H2G258173".into(),
        backend: Backend::Pyusb,
        protocol: "usb".into(),
        vendor_id: "0x04f9".into(),
        product_id: "0x2028".into(),
        serial_number: "000H2G258173".into(),
        model: Some("QL-570".into()),
        name: "QL-570".into(),
        status: PrinterStatus::Unknown,
        label_type: LabelType::Unknown,
        label_size: UNKNOWN_LABEL_SIZE.into(),
        label_width: 0,
        label_height: None,
    }
}

/// What `transmit` does.
#[derive(Debug, Clone)]
pub(crate) enum TransmitScript {
    Confirmed,
    Unconfirmed,
    Timeout(String),
    Error(String),
}

/// In-memory `Transport`.
pub(crate) struct FakeTransport {
    devices: Mutex<HashMap<Backend, std::result::Result<Vec<String>, String>>>,
    hanging_backends: Mutex<Vec<Backend>>,
    hanging_status: Mutex<Vec<String>>,
    status_reports: Mutex<HashMap<String, String>>,
    transmit: Mutex<TransmitScript>,
    transmit_delay: Mutex<Duration>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    status_queries: AtomicUsize,
    transmissions: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self {
            devices: Mutex::new(HashMap::new()),
            hanging_backends: Mutex::new(Vec::new()),
            hanging_status: Mutex::new(Vec::new()),
            status_reports: Mutex::new(HashMap::new()),
            transmit: Mutex::new(TransmitScript::Confirmed),
            transmit_delay: Mutex::new(Duration::ZERO),
            gate: Mutex::new(None),
            status_queries: AtomicUsize::new(0),
            transmissions: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_devices(&self, backend: Backend, identifiers: &[&str]) {
        self.devices.lock().unwrap().insert(
            backend,
            Ok(identifiers.iter().map(|s| s.to_string()).collect()),
        );
    }

    pub(crate) fn fail_backend(&self, backend: Backend, detail: &str) {
        self.devices
            .lock()
            .unwrap()
            .insert(backend, Err(detail.to_string()));
    }

    pub(crate) fn hang_backend(&self, backend: Backend) {
        self.hanging_backends.lock().unwrap().push(backend);
    }

    /// Make status queries for `identifier` never answer.
    pub(crate) fn hang_status(&self, identifier: &str) {
        self.hanging_status.lock().unwrap().push(identifier.to_string());
    }

    pub(crate) fn set_status_report(&self, identifier: &str, report: &str) {
        self.status_reports
            .lock()
            .unwrap()
            .insert(identifier.to_string(), report.to_string());
    }

    pub(crate) fn set_transmit(&self, script: TransmitScript) {
        *self.transmit.lock().unwrap() = script;
    }

    pub(crate) fn set_transmit_delay(&self, delay: Duration) {
        *self.transmit_delay.lock().unwrap() = delay;
    }

    /// Make every `transmit` wait for a permit on the returned semaphore.
    pub(crate) fn hold_transmissions(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn status_queries(&self) -> usize {
        self.status_queries.load(Ordering::SeqCst)
    }

    pub(crate) fn transmissions(&self) -> usize {
        self.transmissions.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn list_devices(&self, backend: Backend) -> Result<Vec<DeviceDescriptor>> {
        if self.hanging_backends.lock().unwrap().contains(&backend) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        let scripted = self.devices.lock().unwrap().get(&backend).cloned();
        match scripted {
            Some(Ok(ids)) => Ok(ids.into_iter().map(DeviceDescriptor::new).collect()),
            Some(Err(detail)) => Err(StickerError::DiscoveryBackend {
                backend: backend.to_string(),
                detail,
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn query_status(&self, _model: &str, identifier: &str, _backend: Backend) -> Result<String> {
        self.status_queries.fetch_add(1, Ordering::SeqCst);
        if self.hanging_status.lock().unwrap().iter().any(|id| id == identifier) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.status_reports
            .lock()
            .unwrap()
            .get(identifier)
            .cloned()
            .ok_or_else(|| StickerError::ProbeFailure(format!("[Errno 19] No such device: {identifier}")))
    }

    async fn transmit(
        &self,
        _instructions: &RasterInstructions,
        _identifier: &str,
        _backend: Backend,
    ) -> Result<bool> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let permit = gate.acquire().await.unwrap();
            permit.forget();
        }
        let delay = *self.transmit_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.transmissions.fetch_add(1, Ordering::SeqCst);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let script = self.transmit.lock().unwrap().clone();
        match script {
            TransmitScript::Confirmed => Ok(true),
            TransmitScript::Unconfirmed => Ok(false),
            TransmitScript::Timeout(detail) => Err(StickerError::TransportTimeout(detail)),
            TransmitScript::Error(detail) => Err(StickerError::Transmission(detail)),
        }
    }
}

/// In-memory `RasterConverter` recording the options it was given.
pub(crate) struct FakeConverter {
    failure: Option<String>,
    calls: Mutex<Vec<RasterOptions>>,
}

impl FakeConverter {
    pub(crate) fn new() -> Self {
        Self {
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(detail: &str) -> Self {
        Self {
            failure: Some(detail.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<RasterOptions> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RasterConverter for FakeConverter {
    async fn convert(&self, _image_path: &Path, options: &RasterOptions) -> Result<RasterInstructions> {
        self.calls.lock().unwrap().push(options.clone());
        match &self.failure {
            Some(detail) => Err(StickerError::Conversion(detail.clone())),
            None => Ok(RasterInstructions(vec![0x1b, 0x40])),
        }
    }
}
