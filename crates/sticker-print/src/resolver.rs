// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Label geometry resolution.
//
// Picks the label type the renderer should lay out for.  Sources, highest
// priority first: the media detected on the selected printer, the model's
// default stock, the configured label type, and finally 62 mm.  The result is
// cached until `invalidate` or `refresh` is called.

use std::fmt;
use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, info, warn};

use sticker_core::catalog::{DEFAULT_LABEL_TYPE, LabelType, model_by_identifier};
use sticker_core::types::PrinterInfo;

/// Where a resolved label type came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    Detected,
    ModelDefault,
    Configured,
    GlobalDefault,
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Detected => "detected",
            Self::ModelDefault => "model default",
            Self::Configured => "configured",
            Self::GlobalDefault => "global default",
        };
        f.write_str(name)
    }
}

/// Outcome of label resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub label_type: LabelType,
    /// Printable width in dots.
    pub label_width: u32,
    pub source: ResolutionSource,
    /// Human-readable note for the front end.
    pub message: String,
}

impl Resolution {
    fn new(label_type: LabelType, source: ResolutionSource, message: String) -> Self {
        Self {
            label_type,
            label_width: label_width_for(label_type),
            source,
            message,
        }
    }

    /// Nothing about the hardware was known.
    pub fn needs_warning(&self) -> bool {
        self.source == ResolutionSource::GlobalDefault
    }
}

/// Printable width in dots for `label_type`, 0 if it is not in the table.
pub fn label_width_for(label_type: LabelType) -> u32 {
    label_type.printable_width()
}

/// Resolves and caches the active label geometry.
#[derive(Debug, Default)]
pub struct LabelResolver {
    configured: Option<LabelType>,
    cached: Mutex<Option<Resolution>>,
}

impl LabelResolver {
    /// `configured` is `[app] label_type`; an unknown value counts as unset.
    pub fn new(configured: Option<LabelType>) -> Self {
        Self {
            configured: configured.filter(LabelType::is_known),
            cached: Mutex::new(None),
        }
    }

    /// Cached resolution, computing it from `printer` if nothing is cached.
    pub fn resolve(&self, printer: Option<&PrinterInfo>) -> Resolution {
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(resolution) = cached.as_ref() {
            debug!(label_type = %resolution.label_type, "label resolution cache hit");
            return resolution.clone();
        }
        let resolution = self.resolve_uncached(printer);
        *cached = Some(resolution.clone());
        resolution
    }

    /// Resolve without touching the cache.
    pub fn resolve_uncached(&self, printer: Option<&PrinterInfo>) -> Resolution {
        if let Some(printer) = printer {
            if printer.label_type.is_known() {
                let spec_width = printer
                    .label_type
                    .spec()
                    .map(|s| s.width_mm)
                    .unwrap_or_default();
                let resolution = Resolution::new(
                    printer.label_type,
                    ResolutionSource::Detected,
                    format!("Detected {} ({spec_width}mm)", printer.label_type),
                );
                info!(label_type = %resolution.label_type, "using detected label");
                return resolution;
            }

            if let Some(spec) = printer.model.as_deref().and_then(model_by_identifier) {
                let resolution = Resolution::new(
                    spec.default_label,
                    ResolutionSource::ModelDefault,
                    format!("Using default for {}", spec.identifier),
                );
                info!(
                    model = spec.identifier,
                    label_type = %resolution.label_type,
                    "no media detected, using model default"
                );
                return resolution;
            }
        }

        if let Some(label_type) = self.configured {
            info!(%label_type, "using configured label type");
            return Resolution::new(
                label_type,
                ResolutionSource::Configured,
                "Using configured label_type from config.toml".into(),
            );
        }

        warn!(
            label_type = %DEFAULT_LABEL_TYPE,
            "no printer information or configuration, falling back to default label"
        );
        Resolution::new(
            DEFAULT_LABEL_TYPE,
            ResolutionSource::GlobalDefault,
            format!("Using default label type {DEFAULT_LABEL_TYPE}"),
        )
    }

    /// Drop the cached resolution.
    pub fn invalidate(&self) {
        *self.cached.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Recompute and store the resolution.
    pub fn refresh(&self, printer: Option<&PrinterInfo>) -> Resolution {
        let resolution = self.resolve_uncached(printer);
        *self.cached.lock().unwrap_or_else(|e| e.into_inner()) = Some(resolution.clone());
        resolution
    }

    pub fn cached(&self) -> Option<Resolution> {
        self.cached.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_printer;

    #[test]
    fn detected_media_wins() {
        let resolver = LabelResolver::new(Some(LabelType::Mm102));
        let mut printer = sample_printer();
        printer.set_label_type(LabelType::Mm29);

        let resolution = resolver.resolve(Some(&printer));
        assert_eq!(resolution.label_type, LabelType::Mm29);
        assert_eq!(resolution.label_width, 306);
        assert_eq!(resolution.source, ResolutionSource::Detected);
        assert_eq!(resolution.message, "Detected 29 (29mm)");
        assert!(!resolution.needs_warning());
    }

    #[test]
    fn model_default_when_media_unknown() {
        let resolver = LabelResolver::new(Some(LabelType::Mm29));
        let mut printer = sample_printer();
        printer.model = Some("QL-1060N".into());

        let resolution = resolver.resolve_uncached(Some(&printer));
        assert_eq!(resolution.label_type, LabelType::Mm102);
        assert_eq!(resolution.label_width, 1164);
        assert_eq!(resolution.source, ResolutionSource::ModelDefault);
        assert_eq!(resolution.message, "Using default for QL-1060N");
    }

    #[test]
    fn configured_when_no_printer() {
        let resolver = LabelResolver::new(Some(LabelType::Mm38));
        let resolution = resolver.resolve_uncached(None);
        assert_eq!(resolution.label_type, LabelType::Mm38);
        assert_eq!(resolution.source, ResolutionSource::Configured);
    }

    #[test]
    fn configured_when_model_not_in_catalog() {
        let resolver = LabelResolver::new(Some(LabelType::Mm50));
        let mut printer = sample_printer();
        printer.model = Some("QL-9999".into());
        let resolution = resolver.resolve_uncached(Some(&printer));
        assert_eq!(resolution.source, ResolutionSource::Configured);
        assert_eq!(resolution.label_width, 554);
    }

    #[test]
    fn global_default_warns() {
        let resolver = LabelResolver::new(Some(LabelType::Unknown));
        let resolution = resolver.resolve_uncached(None);
        assert_eq!(resolution.label_type, LabelType::Mm62);
        assert_eq!(resolution.label_width, 696);
        assert_eq!(resolution.message, "Using default label type 62");
        assert!(resolution.needs_warning());
    }

    #[test]
    fn widths_come_from_label_table() {
        assert_eq!(label_width_for(LabelType::Mm12), 106);
        assert_eq!(label_width_for(LabelType::Mm103), 1200);
        assert_eq!(label_width_for(LabelType::Unknown), 0);
    }

    #[test]
    fn cache_holds_until_refresh() {
        let resolver = LabelResolver::new(None);
        let mut printer = sample_printer();
        printer.set_label_type(LabelType::Mm62);
        assert!(resolver.cached().is_none());
        assert_eq!(resolver.resolve(Some(&printer)).label_type, LabelType::Mm62);

        printer.set_label_type(LabelType::Mm29);
        assert_eq!(resolver.resolve(Some(&printer)).label_type, LabelType::Mm62);
        assert_eq!(resolver.refresh(Some(&printer)).label_type, LabelType::Mm29);
        assert_eq!(resolver.resolve(None).label_type, LabelType::Mm29);

        resolver.invalidate();
        assert!(resolver.cached().is_none());
        assert_eq!(resolver.resolve(None).source, ResolutionSource::GlobalDefault);
    }
}
