// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer: owns the discovery engine, the label resolver, and
// the job queue, and exposes the operations the command-line front end runs.
//
// Every field is Arc-backed, so the struct is cheap to clone into tasks.

use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use tokio::runtime::Handle;
use tracing::info;

use sticker_core::AppConfig;
use sticker_core::error::Result;
use sticker_core::types::{JobSnapshot, PrinterInfo, Rotation};
use sticker_print::discovery::{Discovery, select_printer};
use sticker_print::executor::PrintExecutor;
use sticker_print::queue::{JobQueue, JobRequest};
use sticker_print::resolver::{LabelResolver, Resolution};
use sticker_print::transport::{RasterConverter, Transport};
use sticker_print::{BrotherQlCli, BrotherQlConverter};

/// Shared application services.
#[derive(Clone)]
pub struct StickerServices {
    config: Arc<AppConfig>,
    discovery: Discovery,
    resolver: Arc<LabelResolver>,
    queue: JobQueue,
}

impl StickerServices {
    /// Build the services on the brother_ql tools.  Must be called from
    /// within a tokio runtime.
    pub fn init(config: AppConfig) -> Self {
        let transport: Arc<dyn Transport> = Arc::new(BrotherQlCli::new(&config.printer));
        let converter: Arc<dyn RasterConverter> =
            Arc::new(BrotherQlConverter::new(&config.printer));
        Self::with_backends(config, converter, transport, Handle::current())
    }

    pub fn with_backends(
        config: AppConfig,
        converter: Arc<dyn RasterConverter>,
        transport: Arc<dyn Transport>,
        runtime: Handle,
    ) -> Self {
        let discovery = Discovery::new(Arc::clone(&transport), &config.printer);
        let resolver = LabelResolver::new(config.app.label_type);
        let queue = JobQueue::new(PrintExecutor::new(converter, transport), runtime);
        info!(title = %config.app.title, backends = ?config.printer.backends, "services initialised");
        Self {
            config: Arc::new(config),
            discovery,
            resolver: Arc::new(resolver),
            queue,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // -- Discovery -----------------------------------------------------------

    pub async fn discover(&self) -> Vec<PrinterInfo> {
        self.discovery.discover().await
    }

    // -- Label geometry ------------------------------------------------------

    /// Label geometry the renderer should lay out for.  `refresh` rescans
    /// the printers and drops the cached answer.
    pub async fn label_info(&self, refresh: bool) -> Resolution {
        if !refresh {
            if let Some(resolution) = self.resolver.cached() {
                return resolution;
            }
        }
        let printers = self.discover().await;
        let printer = select_printer(&printers).ok().or(printers.first());
        if refresh {
            self.resolver.refresh(printer)
        } else {
            self.resolver.resolve(printer)
        }
    }

    // -- Printing ------------------------------------------------------------

    /// Print `image` on the first printable printer and wait up to `wait`
    /// for the job to finish.
    ///
    /// The label type is resolved for the printer just selected and is not
    /// written to the session cache, so `label_info(false)` keeps returning
    /// the answer the front end laid the sticker out for.
    pub async fn print_image(
        &self,
        image: DynamicImage,
        rotate: Rotation,
        dither: bool,
        wait: Duration,
    ) -> Result<JobSnapshot> {
        let printers = self.discover().await;
        let printer = select_printer(&printers)?.clone();
        let resolution = self.resolver.resolve_uncached(Some(&printer));
        info!(
            printer = %printer.name,
            label_type = %resolution.label_type,
            source = %resolution.source,
            "printing sticker"
        );

        let id = self.queue.add_job(JobRequest {
            image: Arc::new(image),
            rotate,
            dither,
            printer,
            label_type: resolution.label_type,
        });
        self.queue.wait_for_completion(id, wait).await
    }
}
