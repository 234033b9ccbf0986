//! Whole-text extractor.
//!
//! Each field is searched independently across the entire text through an
//! ordered list of label alternatives; the first alternative that matches
//! anywhere wins. No section state, so a document may mix conventions.

use std::sync::LazyLock;

use regex::Regex;

use super::normalizer::{normalize_date, parse_axis, parse_decimal};
use super::{ExtractContext, ExtractionTier, PrescriptionExtractor};
use crate::models::{DraftField, Eye, EyeComponent, PdType, PrescriptionDraft};

/// Non-blank remainder of the label's own line.
const REST_OF_LINE: &str = r"[ \t]*([^\n\r]*\S)";
const SIGNED_DECIMAL: &str = r"\s*([-+]?\d+\.?\d*)";
const UNSIGNED_DECIMAL: &str = r"\s*(\d+\.?\d*)";
const INTEGER: &str = r"\s*(\d+)";

/// Ordered label alternatives for one field.
struct LabelPatterns(Vec<Regex>);

impl LabelPatterns {
    /// Compile `(?i)<label><value>` for each label, preserving order.
    fn new(labels: &[&str], value: &str) -> Self {
        Self(
            labels
                .iter()
                .map(|label| {
                    Regex::new(&format!("(?i){}{}", regex::escape(label), value)).unwrap()
                })
                .collect(),
        )
    }

    /// Capture of the first alternative that matches.
    fn first_capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.0
            .iter()
            .find_map(|re| re.captures(text))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Value of the first alternative whose capture also parses.
    fn first_parsed<T>(&self, text: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
        self.0
            .iter()
            .filter_map(|re| re.captures(text))
            .find_map(|caps| caps.get(1).and_then(|m| parse(m.as_str())))
    }
}

struct EyePatterns {
    sph: LabelPatterns,
    cyl: LabelPatterns,
    axis: LabelPatterns,
    add: LabelPatterns,
}

impl EyePatterns {
    fn new(number: &str, side: &str) -> Self {
        let labels = |field: &str| [format!("{field}{number}:"), format!("{side} {field}:")];
        let decimal = |field: &str| {
            let [numbered, sided] = labels(field);
            LabelPatterns::new(&[numbered.as_str(), sided.as_str()], SIGNED_DECIMAL)
        };
        let [axis_numbered, axis_sided] = labels("AXIS");
        Self {
            sph: decimal("SPH"),
            cyl: decimal("CYL"),
            axis: LabelPatterns::new(&[axis_numbered.as_str(), axis_sided.as_str()], INTEGER),
            add: decimal("ADD"),
        }
    }
}

struct WholeTextPatterns {
    name: LabelPatterns,
    phone: LabelPatterns,
    email: LabelPatterns,
    location: LabelPatterns,
    dob: LabelPatterns,
    exam_date: LabelPatterns,
    right: EyePatterns,
    left: EyePatterns,
    dual_pd: Regex,
    pd_od: LabelPatterns,
    pd_os: LabelPatterns,
    pd: LabelPatterns,
}

static PATTERNS: LazyLock<WholeTextPatterns> = LazyLock::new(|| WholeTextPatterns {
    name: LabelPatterns::new(&["Name:", "Patient:", "Patient Name:"], REST_OF_LINE),
    phone: LabelPatterns::new(&["Phone:", "Tel:", "Telephone:"], REST_OF_LINE),
    email: LabelPatterns::new(&["Email:", "E-mail:"], REST_OF_LINE),
    location: LabelPatterns::new(&["Location:", "Address:", "City:"], REST_OF_LINE),
    dob: LabelPatterns::new(&["DOB:", "Date of Birth:", "Birth Date:"], REST_OF_LINE),
    exam_date: LabelPatterns::new(
        &["Exam Date:", "Examination Date:", "Date of Examination:"],
        REST_OF_LINE,
    ),
    right: EyePatterns::new("1", "OD"),
    left: EyePatterns::new("2", "OS"),
    dual_pd: Regex::new(r"(?i)Pupillary Distance:\s*.*Dual").unwrap(),
    pd_od: LabelPatterns::new(&["PD OD:", "Right PD:"], UNSIGNED_DECIMAL),
    pd_os: LabelPatterns::new(&["PD OS:", "Left PD:"], UNSIGNED_DECIMAL),
    pd: LabelPatterns::new(&["PD:", "Pupillary Distance:"], UNSIGNED_DECIMAL),
});

/// Universal fallback extractor.
#[derive(Debug, Default, Clone, Copy)]
pub struct WholeTextExtractor;

impl WholeTextExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_eye(draft: &mut PrescriptionDraft, eye: Eye, patterns: &EyePatterns, text: &str) {
        let decimals = [
            (&patterns.sph, EyeComponent::Sph),
            (&patterns.cyl, EyeComponent::Cyl),
            (&patterns.add, EyeComponent::Add),
        ];
        for (labels, component) in decimals {
            if let Some(value) = labels.first_parsed(text, parse_decimal) {
                draft.set_eye_decimal(eye, component, value);
            }
        }

        if let Some(axis) = patterns.axis.first_parsed(text, parse_axis) {
            draft.set_eye_axis(eye, axis);
        }
    }

    fn extract_pd(draft: &mut PrescriptionDraft, patterns: &WholeTextPatterns, text: &str) {
        if patterns.dual_pd.is_match(text) {
            draft.pd_type = PdType::Dual;
            for (labels, field) in [
                (&patterns.pd_od, DraftField::PdOd),
                (&patterns.pd_os, DraftField::PdOs),
            ] {
                if let Some(pd) = labels.first_parsed(text, parse_decimal) {
                    draft.set_pd(field, pd);
                }
            }
        } else if let Some(pd) = patterns.pd.first_parsed(text, parse_decimal) {
            draft.pd_type = PdType::Single;
            draft.set_pd(DraftField::Pd, pd);
        }
    }
}

impl PrescriptionExtractor for WholeTextExtractor {
    fn tier(&self) -> ExtractionTier {
        ExtractionTier::WholeText
    }

    fn extract(&self, text: &str, ctx: &ExtractContext) -> PrescriptionDraft {
        let patterns = &*PATTERNS;
        let mut draft = PrescriptionDraft::default();

        let text_fields = [
            (&patterns.name, DraftField::Name),
            (&patterns.phone, DraftField::Phone),
            (&patterns.email, DraftField::Email),
            (&patterns.location, DraftField::Location),
        ];
        for (labels, field) in text_fields {
            if let Some(value) = labels.first_capture(text) {
                draft.set_text(field, value);
            }
        }

        // Unparseable birth dates are dropped, not kept
        if let Some(dob) = patterns.dob.first_capture(text).and_then(normalize_date) {
            draft.set_text(DraftField::Dob, &dob);
        }

        match patterns.exam_date.first_capture(text).and_then(normalize_date) {
            Some(date) => draft.set_text(DraftField::ExamDate, &date),
            None => draft.exam_date = Some(ctx.run_date_string()),
        }

        Self::extract_eye(&mut draft, Eye::Right, &patterns.right, text);
        Self::extract_eye(&mut draft, Eye::Left, &patterns.left, text);
        Self::extract_pd(&mut draft, patterns, text);

        draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ctx() -> ExtractContext {
        ExtractContext::new(NaiveDate::from_ymd_opt(2025, 4, 25).unwrap())
    }

    fn extract(text: &str) -> PrescriptionDraft {
        WholeTextExtractor::new().extract(text, &ctx())
    }

    #[test]
    fn test_empty_text() {
        let draft = extract("");
        assert_eq!(draft.pd_type, PdType::Single);
        assert_eq!(draft.name, None);
        assert_eq!(draft.right_eye.sph, 0.0);
        assert_eq!(draft.exam_date.as_deref(), Some("2025-04-25"));
        assert!(draft.recovered.is_empty());
    }

    #[test]
    fn test_unstructured_mix() {
        let draft = extract("Patient: Jane Roe\nOD SPH: -1.00\nOS SPH: +0.50\nPD: 62");

        assert_eq!(draft.name.as_deref(), Some("Jane Roe"));
        assert_eq!(draft.right_eye.sph, -1.0);
        assert_eq!(draft.left_eye.sph, 0.5);
        assert_eq!(draft.pd_type, PdType::Single);
        assert_eq!(draft.pd, Some(62.0));
    }

    #[test]
    fn test_label_order_precedence() {
        // "Name:" is tried before "Patient:" regardless of position in text
        let draft = extract("Patient: First Person\nName: Second Person");
        assert_eq!(draft.name.as_deref(), Some("Second Person"));

        // Numbered label beats the OD form
        let draft = extract("OD SPH: -4.00\nSPH1: -3.00");
        assert_eq!(draft.right_eye.sph, -3.0);
    }

    #[test]
    fn test_contact_fields() {
        let draft = extract("Tel: 555 0100\nE-mail: a@b.c\r\nCity: Lyon\n");
        assert_eq!(draft.phone.as_deref(), Some("555 0100"));
        assert_eq!(draft.email.as_deref(), Some("a@b.c"));
        assert_eq!(draft.location.as_deref(), Some("Lyon"));
    }

    #[test]
    fn test_blank_value_stays_on_its_line() {
        let draft = extract("Name:\nPhone: 555");
        assert_eq!(draft.name, None);
        assert_eq!(draft.phone.as_deref(), Some("555"));
        assert!(!draft.was_recovered(DraftField::Name));

        let draft = extract("Name:   \t\nPatient: Jane Roe");
        assert_eq!(draft.name.as_deref(), Some("Jane Roe"));
    }

    #[test]
    fn test_unparseable_value_tries_next_label() {
        let draft = extract("AXIS1: 99999999999\nOD AXIS: 90");
        assert_eq!(draft.right_eye.axis, 90);
        assert!(draft.was_recovered(DraftField::RightAxis));

        let draft = extract("AXIS1: 99999999999");
        assert_eq!(draft.right_eye.axis, 0);
        assert!(!draft.was_recovered(DraftField::RightAxis));
    }

    #[test]
    fn test_invalid_dates() {
        let draft = extract("DOB: notadate\nExam Date: notadate");
        assert_eq!(draft.dob, None);
        assert_eq!(draft.exam_date.as_deref(), Some("2025-04-25"));
        assert!(!draft.was_recovered(DraftField::ExamDate));
    }

    #[test]
    fn test_valid_dates() {
        let draft = extract("Date of Birth: May 15, 1985\nExamination Date: 04/20/2025");
        assert_eq!(draft.dob.as_deref(), Some("1985-05-15"));
        assert_eq!(draft.exam_date.as_deref(), Some("2025-04-20"));
    }

    #[test]
    fn test_axis_and_add() {
        let draft = extract("AXIS1: 90\nOS AXIS: 85\nADD1: +2.00\nOS ADD: +2.25\nCYL2: -1.25");
        assert_eq!(draft.right_eye.axis, 90);
        assert_eq!(draft.left_eye.axis, 85);
        assert_eq!(draft.right_eye.add, 2.0);
        assert_eq!(draft.left_eye.add, 2.25);
        assert_eq!(draft.left_eye.cyl, -1.25);
    }

    #[test]
    fn test_dual_pd() {
        let draft = extract("Pupillary Distance: Dual\nRight PD: 32\nPD OS: 31.5");
        assert_eq!(draft.pd_type, PdType::Dual);
        assert_eq!(draft.pd_od, Some(32.0));
        assert_eq!(draft.pd_os, Some(31.5));
        assert_eq!(draft.pd, None);
    }

    #[test]
    fn test_single_pd_long_label() {
        let draft = extract("Pupillary Distance: 64mm");
        assert_eq!(draft.pd_type, PdType::Single);
        assert_eq!(draft.pd, Some(64.0));
    }
}
