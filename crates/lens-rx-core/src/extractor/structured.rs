//! Structured-section extractor.
//!
//! Recognizes the banner layout:
//!
//! ```text
//! PATIENT PRESCRIPTION
//! Name: John Doe
//! RIGHT EYE (OD)
//! SPH1: -2.25    CYL1 / AXIS1 / ADD1 / PD: 32mm
//! LEFT EYE (OS)
//! SPH2: -2.00    CYL2 / AXIS2 / ADD2 / PD: 32mm
//! PUPILLARY DISTANCE: 64mm (Dual)
//! ```

use std::sync::LazyLock;

use regex::Regex;

use super::labeled::apply_patient_field;
use super::normalizer::{parse_decimal, round_tenth, LabelNormalizer};
use super::{apply_eye_line, ExtractContext, ExtractionTier, PrescriptionExtractor};
use crate::models::{DraftField, Eye, PdType, PrescriptionDraft};

/// Placeholder used when a structured document carries no patient name.
pub const DEFAULT_PLACEHOLDER_NAME: &str = "Patient from Prescription";

const TITLE_MARKER: &str = "PATIENT PRESCRIPTION";
const AGGREGATE_PD_MARKER: &str = "PUPILLARY DISTANCE";

static EYE_PD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)PD:\s*([\d.]+)mm").unwrap());

static AGGREGATE_PD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)PUPILLARY DISTANCE:\s*([\d.]+)mm").unwrap());

/// Line indices of the layout markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionMarkers {
    pub title: usize,
    pub right_eye: usize,
    pub left_eye: usize,
    /// Optional aggregate PD line; bounds the left-eye section
    pub pupillary_distance: Option<usize>,
}

impl SectionMarkers {
    /// Locate the markers in trimmed lines. All three of title, right eye and
    /// left eye must be present; each is the first line that contains it
    /// (case-insensitive).
    pub fn locate(lines: &[&str]) -> Option<Self> {
        let upper: Vec<String> = lines.iter().map(|l| l.to_uppercase()).collect();
        let find = |needles: &[&str]| {
            upper
                .iter()
                .position(|line| needles.iter().any(|n| line.contains(n)))
        };

        let title = find(&[TITLE_MARKER])?;
        let right_eye = find(&["RIGHT EYE", "OD"])?;
        let left_eye = find(&["LEFT EYE", "OS"])?;
        let pupillary_distance = find(&[AGGREGATE_PD_MARKER]);

        Some(Self {
            title,
            right_eye,
            left_eye,
            pupillary_distance,
        })
    }
}

fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n').map(str::trim).collect()
}

/// Extractor for the banner layout.
pub struct StructuredSectionExtractor {
    placeholder_name: String,
    labels: LabelNormalizer,
}

impl Default for StructuredSectionExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER_NAME)
    }
}

impl StructuredSectionExtractor {
    pub fn new(placeholder_name: impl Into<String>) -> Self {
        Self {
            placeholder_name: placeholder_name.into(),
            labels: LabelNormalizer::new(),
        }
    }

    /// Whether `text` carries all three required markers.
    pub fn detects_layout(&self, text: &str) -> bool {
        SectionMarkers::locate(&split_lines(text)).is_some()
    }

    /// `key: value` patient lines above the right-eye marker.
    fn scan_header(
        &self,
        draft: &mut PrescriptionDraft,
        lines: &[&str],
        markers: &SectionMarkers,
        ctx: &ExtractContext,
    ) {
        for (i, line) in lines.iter().enumerate().take(markers.right_eye) {
            if i == markers.title || i == markers.left_eye || line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if let Some(field) = self.labels.field_for(key) {
                apply_patient_field(draft, field, value, ctx);
            }
        }
    }

    /// Eye fields between `start` (exclusive) and `end` (exclusive). A
    /// millimeter PD line inside the section records that eye's PD and
    /// switches to dual.
    fn scan_eye(draft: &mut PrescriptionDraft, eye: Eye, lines: &[&str], start: usize, end: usize) {
        let end = end.min(lines.len());
        for line in lines.iter().take(end).skip(start + 1) {
            if line.is_empty() || apply_eye_line(draft, eye, line) {
                continue;
            }

            if let Some(pd) = EYE_PD.captures(line).and_then(|c| parse_decimal(&c[1])) {
                draft.pd_type = PdType::Dual;
                let field = match eye {
                    Eye::Right => DraftField::PdOd,
                    Eye::Left => DraftField::PdOs,
                };
                draft.set_pd(field, pd);
            }
        }
    }

    fn apply_aggregate_pd(draft: &mut PrescriptionDraft, line: &str) {
        let Some(total) = AGGREGATE_PD.captures(line).and_then(|c| parse_decimal(&c[1])) else {
            return;
        };

        if draft.pd_od.is_none() || draft.pd_os.is_none() {
            draft.pd_type = PdType::Single;
            draft.set_pd(DraftField::Pd, total);
        }

        if line.to_lowercase().contains("dual") {
            draft.pd_type = PdType::Dual;
            // Only the missing side is synthesized; a value read from its eye
            // section is kept
            let half = round_tenth(total / 2.0);
            Self::fill_missing_pd(draft, DraftField::PdOd, half);
            Self::fill_missing_pd(draft, DraftField::PdOs, half);
        }
    }

    /// Write a synthesized per-eye PD when that side is absent or zero. The
    /// field is not marked as recovered.
    fn fill_missing_pd(draft: &mut PrescriptionDraft, field: DraftField, value: f64) {
        let slot = match field {
            DraftField::PdOd => &mut draft.pd_od,
            DraftField::PdOs => &mut draft.pd_os,
            _ => return,
        };
        if slot.map_or(true, |v| v == 0.0) {
            *slot = Some(value);
            draft.recovered.remove(&field);
        }
    }
}

impl PrescriptionExtractor for StructuredSectionExtractor {
    fn tier(&self) -> ExtractionTier {
        ExtractionTier::Structured
    }

    fn extract(&self, text: &str, ctx: &ExtractContext) -> PrescriptionDraft {
        let lines = split_lines(text);
        let Some(markers) = SectionMarkers::locate(&lines) else {
            return PrescriptionDraft::default();
        };

        let mut draft = PrescriptionDraft::default();
        self.scan_header(&mut draft, &lines, &markers, ctx);

        Self::scan_eye(&mut draft, Eye::Right, &lines, markers.right_eye, markers.left_eye);

        let left_end = markers.pupillary_distance.unwrap_or(lines.len());
        Self::scan_eye(&mut draft, Eye::Left, &lines, markers.left_eye, left_end);

        if let Some(index) = markers.pupillary_distance {
            Self::apply_aggregate_pd(&mut draft, lines[index]);
        }

        if draft.name.is_none() {
            draft.name = Some(self.placeholder_name.clone());
        }
        if draft.exam_date.is_none() {
            draft.exam_date = Some(ctx.run_date_string());
        }

        draft
    }
}
