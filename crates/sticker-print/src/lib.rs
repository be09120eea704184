// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sticker Factory Print: USB discovery of Brother QL printers, status/media
// probing, label geometry resolution, and the print job queue.  The actual
// raster conversion and USB transmission sit behind the `RasterConverter`
// and `Transport` traits; `brother_ql` provides the default implementations.

pub mod brother_ql;
pub mod discovery;
pub mod executor;
pub mod probe;
pub mod queue;
pub mod resolver;
pub mod transport;

#[cfg(test)]
mod testing;

pub use brother_ql::{BrotherQlCli, BrotherQlConverter};
pub use discovery::{Discovery, select_printer};
pub use executor::{PrintExecutor, PrintOutcome};
pub use probe::Prober;
pub use queue::{JobQueue, JobRequest};
pub use resolver::{LabelResolver, Resolution, ResolutionSource};
pub use transport::{RasterConverter, Transport};
