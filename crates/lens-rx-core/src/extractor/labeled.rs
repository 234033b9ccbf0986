//! Labeled-section extractor.
//!
//! Walks the text line by line with a three-state cursor (patient, right
//! eye, left eye). Banner lines switch state; everything else is parsed as
//! `key: value` in the patient state or as an eye field line in an eye state.

use std::sync::LazyLock;

use regex::Regex;

use super::normalizer::{find_decimal, normalize_date, parse_leading_decimal, LabelNormalizer};
use super::{apply_eye_line, ExtractContext, ExtractionTier, PrescriptionExtractor};
use crate::models::{DraftField, Eye, PdType, PrescriptionDraft};

/// Cursor state while walking lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Patient,
    RightEye,
    LeftEye,
}

struct SectionBanners {
    right: [Regex; 2],
    left: [Regex; 2],
    patient: Regex,
}

static BANNERS: LazyLock<SectionBanners> = LazyLock::new(|| SectionBanners {
    right: [
        Regex::new(r"(?i)---\s*right\s*eye\s*---").unwrap(),
        Regex::new(r"(?i)right\s*eye\s*\(od\)").unwrap(),
    ],
    left: [
        Regex::new(r"(?i)---\s*left\s*eye\s*---").unwrap(),
        Regex::new(r"(?i)left\s*eye\s*\(os\)").unwrap(),
    ],
    patient: Regex::new(r"(?i)---\s*patient\s*---").unwrap(),
});

impl Section {
    /// The section a banner line switches to, if `line` is a banner.
    fn from_banner(line: &str) -> Option<Self> {
        let banners = &*BANNERS;
        if banners.right.iter().any(|re| re.is_match(line)) {
            Some(Section::RightEye)
        } else if banners.left.iter().any(|re| re.is_match(line)) {
            Some(Section::LeftEye)
        } else if banners.patient.is_match(line) {
            Some(Section::Patient)
        } else {
            None
        }
    }
}

/// Assign one patient-section value to `field`.
///
/// An unparseable birth date is kept verbatim for manual correction; an
/// unparseable exam date is replaced with the run date.
pub(crate) fn apply_patient_field(
    draft: &mut PrescriptionDraft,
    field: DraftField,
    value: &str,
    ctx: &ExtractContext,
) {
    match field {
        DraftField::Name | DraftField::Phone | DraftField::Email | DraftField::Location => {
            draft.set_text(field, value);
        }
        DraftField::Dob => {
            let dob = normalize_date(value).unwrap_or_else(|| value.to_string());
            draft.set_text(DraftField::Dob, &dob);
        }
        DraftField::ExamDate => match normalize_date(value) {
            Some(date) => draft.set_text(DraftField::ExamDate, &date),
            None => draft.exam_date = Some(ctx.run_date_string()),
        },
        DraftField::Pd => {
            if value.to_lowercase().contains("dual") {
                draft.pd_type = PdType::Dual;
            } else if let Some(pd) = find_decimal(value) {
                draft.pd_type = PdType::Single;
                draft.set_pd(DraftField::Pd, pd);
            }
        }
        DraftField::PdOd | DraftField::PdOs => {
            draft.pd_type = PdType::Dual;
            if let Some(pd) = parse_leading_decimal(value) {
                draft.set_pd(field, pd);
            }
        }
        _ => {}
    }
}

/// Extractor for `--- Section ---` layouts with `key: value` lines.
#[derive(Default)]
pub struct LabeledSectionExtractor {
    labels: LabelNormalizer,
}

impl LabeledSectionExtractor {
    pub fn new() -> Self {
        Self {
            labels: LabelNormalizer::new(),
        }
    }

    /// Use a custom label vocabulary for the patient section.
    pub fn with_labels(labels: LabelNormalizer) -> Self {
        Self { labels }
    }

    fn apply_patient_line(&self, draft: &mut PrescriptionDraft, line: &str, ctx: &ExtractContext) {
        let Some((key, value)) = line.split_once(':') else {
            return;
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            return;
        }

        if let Some(field) = self.labels.field_for(key) {
            apply_patient_field(draft, field, value, ctx);
        }
    }
}

impl PrescriptionExtractor for LabeledSectionExtractor {
    fn tier(&self) -> ExtractionTier {
        ExtractionTier::Labeled
    }

    fn extract(&self, text: &str, ctx: &ExtractContext) -> PrescriptionDraft {
        let mut draft = PrescriptionDraft::default();
        let mut section = Section::Patient;

        for line in text.split('\n').map(str::trim) {
            if line.is_empty() {
                continue;
            }

            if let Some(next) = Section::from_banner(line) {
                section = next;
                continue;
            }

            match section {
                Section::Patient => self.apply_patient_line(&mut draft, line, ctx),
                Section::RightEye => {
                    apply_eye_line(&mut draft, Eye::Right, line);
                }
                Section::LeftEye => {
                    apply_eye_line(&mut draft, Eye::Left, line);
                }
            }
        }

        draft
    }
}
