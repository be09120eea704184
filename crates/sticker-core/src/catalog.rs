// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Static device-capability catalog for Brother QL printers.
//
// Two read-only tables: the label geometry table (physical media width →
// label type → printable dots at 300 dpi) and the model table (USB product
// id → model identifier → default label stock).  Both mirror the catalog
// shipped with the brother_ql raster library, so a label type resolved here
// is always one the raster converter accepts.

use serde::{Deserialize, Serialize};

/// USB vendor id for Brother Industries.
pub const BROTHER_VENDOR_ID: u16 = 0x04f9;

/// Label type used when nothing else can be resolved.
pub const DEFAULT_LABEL_TYPE: LabelType = LabelType::Mm62;

/// Supported label stock, identified by its width in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabelType {
    #[serde(rename = "12")]
    Mm12,
    #[serde(rename = "29")]
    Mm29,
    #[serde(rename = "38")]
    Mm38,
    #[serde(rename = "50")]
    Mm50,
    #[serde(rename = "54")]
    Mm54,
    #[serde(rename = "62")]
    Mm62,
    #[serde(rename = "102")]
    Mm102,
    #[serde(rename = "103")]
    Mm103,
    #[serde(rename = "104")]
    Mm104,
    /// Media could not be detected.
    #[serde(rename = "unknown")]
    Unknown,
}

impl LabelType {
    /// Label identifier as understood by the raster converter (e.g. "62").
    pub fn code(&self) -> &'static str {
        match self {
            Self::Mm12 => "12",
            Self::Mm29 => "29",
            Self::Mm38 => "38",
            Self::Mm50 => "50",
            Self::Mm54 => "54",
            Self::Mm62 => "62",
            Self::Mm102 => "102",
            Self::Mm103 => "103",
            Self::Mm104 => "104",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a label identifier. Returns `None` for anything not in the table.
    pub fn from_code(code: &str) -> Option<Self> {
        LABELS
            .iter()
            .find(|spec| spec.label_type.code() == code.trim())
            .map(|spec| spec.label_type)
    }

    /// Map a detected media width to a label type.
    pub fn from_width_mm(width_mm: u32) -> Option<Self> {
        LABELS
            .iter()
            .find(|spec| spec.width_mm == width_mm)
            .map(|spec| spec.label_type)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Geometry entry for this label type, if any.
    pub fn spec(&self) -> Option<&'static LabelSpec> {
        LABELS.iter().find(|spec| spec.label_type == *self)
    }

    /// Printable width in pixels (dots); 0 when unresolved.
    pub fn printable_width(&self) -> u32 {
        self.spec().map(|s| s.printable_dots).unwrap_or(0)
    }
}

impl std::fmt::Display for LabelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// One row of the label geometry table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelSpec {
    pub label_type: LabelType,
    /// Physical tape width.
    pub width_mm: u32,
    /// Printable width in dots.
    pub printable_dots: u32,
    /// Endless (continuous) stock has no fixed label height.
    pub continuous: bool,
}

/// Label geometry table.
pub const LABELS: &[LabelSpec] = &[
    LabelSpec { label_type: LabelType::Mm12, width_mm: 12, printable_dots: 106, continuous: true },
    LabelSpec { label_type: LabelType::Mm29, width_mm: 29, printable_dots: 306, continuous: true },
    LabelSpec { label_type: LabelType::Mm38, width_mm: 38, printable_dots: 413, continuous: true },
    LabelSpec { label_type: LabelType::Mm50, width_mm: 50, printable_dots: 554, continuous: true },
    LabelSpec { label_type: LabelType::Mm54, width_mm: 54, printable_dots: 590, continuous: true },
    LabelSpec { label_type: LabelType::Mm62, width_mm: 62, printable_dots: 696, continuous: true },
    LabelSpec { label_type: LabelType::Mm102, width_mm: 102, printable_dots: 1164, continuous: true },
    LabelSpec { label_type: LabelType::Mm103, width_mm: 103, printable_dots: 1200, continuous: true },
    LabelSpec { label_type: LabelType::Mm104, width_mm: 104, printable_dots: 1200, continuous: true },
];

/// One row of the model table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    /// Model identifier passed to the raster converter (e.g. "QL-570").
    pub identifier: &'static str,
    pub product_id: u16,
    /// Stock the model most commonly ships with.
    pub default_label: LabelType,
}

/// Known Brother QL models.
pub const MODELS: &[ModelSpec] = &[
    ModelSpec { identifier: "QL-500", product_id: 0x2015, default_label: LabelType::Mm62 },
    ModelSpec { identifier: "QL-550", product_id: 0x2016, default_label: LabelType::Mm62 },
    ModelSpec { identifier: "QL-560", product_id: 0x2027, default_label: LabelType::Mm62 },
    ModelSpec { identifier: "QL-570", product_id: 0x2028, default_label: LabelType::Mm62 },
    ModelSpec { identifier: "QL-580N", product_id: 0x2029, default_label: LabelType::Mm62 },
    ModelSpec { identifier: "QL-650TD", product_id: 0x201b, default_label: LabelType::Mm62 },
    ModelSpec { identifier: "QL-700", product_id: 0x2042, default_label: LabelType::Mm62 },
    ModelSpec { identifier: "QL-710W", product_id: 0x2043, default_label: LabelType::Mm62 },
    ModelSpec { identifier: "QL-720NW", product_id: 0x2044, default_label: LabelType::Mm62 },
    ModelSpec { identifier: "QL-800", product_id: 0x209b, default_label: LabelType::Mm62 },
    ModelSpec { identifier: "QL-810W", product_id: 0x209c, default_label: LabelType::Mm62 },
    ModelSpec { identifier: "QL-820NWB", product_id: 0x209d, default_label: LabelType::Mm62 },
    ModelSpec { identifier: "QL-1050", product_id: 0x2020, default_label: LabelType::Mm102 },
    ModelSpec { identifier: "QL-1060N", product_id: 0x202a, default_label: LabelType::Mm102 },
];

/// Look up a model by USB product id.
pub fn model_by_product_id(product_id: u16) -> Option<&'static ModelSpec> {
    MODELS.iter().find(|m| m.product_id == product_id)
}

/// Look up a model by identifier (case-insensitive).
pub fn model_by_identifier(identifier: &str) -> Option<&'static ModelSpec> {
    MODELS
        .iter()
        .find(|m| m.identifier.eq_ignore_ascii_case(identifier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_label_code_round_trips() {
        for spec in LABELS {
            assert_eq!(LabelType::from_code(spec.label_type.code()), Some(spec.label_type));
        }
        assert_eq!(LabelType::from_code("unknown"), None);
        assert_eq!(LabelType::from_code("63"), None);
    }

    #[test]
    fn width_lookup_matches_table() {
        assert_eq!(LabelType::from_width_mm(62), Some(LabelType::Mm62));
        assert_eq!(LabelType::from_width_mm(102), Some(LabelType::Mm102));
        assert_eq!(LabelType::from_width_mm(17), None);
    }

    #[test]
    fn unknown_label_has_no_width() {
        assert_eq!(LabelType::Unknown.printable_width(), 0);
        assert_eq!(LabelType::Mm62.printable_width(), 696);
        assert!(!LabelType::Unknown.is_known());
    }

    #[test]
    fn ql570_resolves_from_product_id() {
        let model = model_by_product_id(0x2028).expect("QL-570 in catalog");
        assert_eq!(model.identifier, "QL-570");
        assert_eq!(model.default_label, LabelType::Mm62);
        assert!(model_by_product_id(0xffff).is_none());
    }

    #[test]
    fn wide_format_models_default_to_102() {
        assert_eq!(
            model_by_identifier("ql-1060n").map(|m| m.default_label),
            Some(LabelType::Mm102)
        );
    }
}
