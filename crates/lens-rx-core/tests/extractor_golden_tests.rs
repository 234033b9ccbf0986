//! Golden tests for the extractor chain.
//!
//! Each case pins the draft a known document must produce.

use chrono::NaiveDate;
use lens_rx_core::{
    DraftField, ExtractContext, ExtractionTier, EyeMeasurement, LabeledSectionExtractor, PdType,
    PrescriptionDraft, PrescriptionExtractor, StructuredSectionExtractor, TieredExtractor,
    WholeTextExtractor,
};

fn ctx() -> ExtractContext {
    ExtractContext::new(NaiveDate::from_ymd_opt(2025, 4, 25).unwrap())
}

fn eye(sph: f64, cyl: f64, axis: u32, add: f64) -> EyeMeasurement {
    EyeMeasurement { sph, cyl, axis, add }
}

const EYE_SECTIONS: &str = "\
RIGHT EYE
SPH1: -2.25
CYL1: -0.75
AXIS1: 180
ADD1: +1.50

LEFT EYE
SPH2: -2.00
CYL2: -0.50
AXIS2: 175
ADD2: +1.50
";

/// A golden test case
struct GoldenCase {
    id: &'static str,
    text: String,
    expected_tier: ExtractionTier,
    expected_name: Option<&'static str>,
    expected_right: EyeMeasurement,
    expected_left: EyeMeasurement,
    expected_pd_type: PdType,
    expected_pd: Option<f64>,
    expected_pd_od: Option<f64>,
    expected_pd_os: Option<f64>,
}

fn get_golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "structured-single-pd",
            text: format!("PATIENT PRESCRIPTION\n{EYE_SECTIONS}\nPUPILLARY DISTANCE: 64mm\n"),
            expected_tier: ExtractionTier::Structured,
            expected_name: Some("Patient from Prescription"),
            expected_right: eye(-2.25, -0.75, 180, 1.5),
            expected_left: eye(-2.0, -0.5, 175, 1.5),
            expected_pd_type: PdType::Single,
            expected_pd: Some(64.0),
            expected_pd_od: None,
            expected_pd_os: None,
        },
        GoldenCase {
            id: "structured-dual-split",
            text: format!(
                "PATIENT PRESCRIPTION\n{EYE_SECTIONS}\nPUPILLARY DISTANCE: 64mm (Dual)\n"
            ),
            expected_tier: ExtractionTier::Structured,
            expected_name: Some("Patient from Prescription"),
            expected_right: eye(-2.25, -0.75, 180, 1.5),
            expected_left: eye(-2.0, -0.5, 175, 1.5),
            expected_pd_type: PdType::Dual,
            expected_pd: Some(64.0),
            expected_pd_od: Some(32.0),
            expected_pd_os: Some(32.0),
        },
        GoldenCase {
            id: "structured-odd-dual-split",
            text: format!(
                "PATIENT PRESCRIPTION\n{EYE_SECTIONS}\nPUPILLARY DISTANCE: 63mm (dual)\n"
            ),
            expected_tier: ExtractionTier::Structured,
            expected_name: Some("Patient from Prescription"),
            expected_right: eye(-2.25, -0.75, 180, 1.5),
            expected_left: eye(-2.0, -0.5, 175, 1.5),
            expected_pd_type: PdType::Dual,
            expected_pd: Some(63.0),
            expected_pd_od: Some(31.5),
            expected_pd_os: Some(31.5),
        },
        GoldenCase {
            id: "structured-per-eye-pd",
            text: "\
PATIENT PRESCRIPTION
Name: John Doe
RIGHT EYE
SPH1: -1.25
PD: 31.5mm
LEFT EYE
SPH2: -1.50
PD: 32mm
PUPILLARY DISTANCE: 63.5mm
"
            .to_string(),
            expected_tier: ExtractionTier::Structured,
            expected_name: Some("John Doe"),
            expected_right: eye(-1.25, 0.0, 0, 0.0),
            expected_left: eye(-1.5, 0.0, 0, 0.0),
            expected_pd_type: PdType::Dual,
            expected_pd: None,
            expected_pd_od: Some(31.5),
            expected_pd_os: Some(32.0),
        },
        GoldenCase {
            id: "labeled-sections",
            text: "\
Patient: Maria Lopez
Phone: 555-0100
Email: maria@example.com
DOB: 03/14/1990

--- Right Eye ---
SPH: -0.75
CYL: -0.25
AXIS: 90

--- Left Eye ---
SPH2: -1.00
AXIS2: 85

--- Patient ---
Right PD: 31
Left PD: 30.5
"
            .to_string(),
            expected_tier: ExtractionTier::Labeled,
            expected_name: Some("Maria Lopez"),
            expected_right: eye(-0.75, -0.25, 90, 0.0),
            expected_left: eye(-1.0, 0.0, 85, 0.0),
            expected_pd_type: PdType::Dual,
            expected_pd: None,
            expected_pd_od: Some(31.0),
            expected_pd_os: Some(30.5),
        },
        GoldenCase {
            id: "whole-text-unstructured",
            text: "Patient: Jane Roe\nOD SPH: -1.00\nOS SPH: +0.50\nPD: 62".to_string(),
            expected_tier: ExtractionTier::WholeText,
            expected_name: Some("Jane Roe"),
            expected_right: eye(-1.0, 0.0, 0, 0.0),
            expected_left: eye(0.5, 0.0, 0, 0.0),
            expected_pd_type: PdType::Single,
            expected_pd: Some(62.0),
            expected_pd_od: None,
            expected_pd_os: None,
        },
        GoldenCase {
            id: "whole-text-dual",
            text: "\
OD SPH: +1.25
OD AXIS: 10
OS SPH: +1.00
Pupillary Distance: Dual
PD OD: 30
PD OS: 31
"
            .to_string(),
            expected_tier: ExtractionTier::WholeText,
            expected_name: None,
            expected_right: eye(1.25, 0.0, 10, 0.0),
            expected_left: eye(1.0, 0.0, 0, 0.0),
            expected_pd_type: PdType::Dual,
            expected_pd: None,
            expected_pd_od: Some(30.0),
            expected_pd_os: Some(31.0),
        },
    ]
}

#[test]
fn test_golden_cases() {
    let extractor = TieredExtractor::default();

    for case in get_golden_cases() {
        let outcome = extractor.extract_sectioned(&case.text, &ctx());
        let draft = &outcome.draft;

        assert_eq!(outcome.tier, case.expected_tier, "Case {}: tier mismatch", case.id);
        assert_eq!(
            draft.name.as_deref(),
            case.expected_name,
            "Case {}: name mismatch",
            case.id
        );
        assert_eq!(
            draft.right_eye, case.expected_right,
            "Case {}: right eye mismatch",
            case.id
        );
        assert_eq!(
            draft.left_eye, case.expected_left,
            "Case {}: left eye mismatch",
            case.id
        );
        assert_eq!(
            draft.pd_type, case.expected_pd_type,
            "Case {}: pd type mismatch",
            case.id
        );
        assert_eq!(draft.pd, case.expected_pd, "Case {}: pd mismatch", case.id);
        assert_eq!(draft.pd_od, case.expected_pd_od, "Case {}: pd od mismatch", case.id);
        assert_eq!(draft.pd_os, case.expected_pd_os, "Case {}: pd os mismatch", case.id);
    }
}

#[test]
fn test_empty_text_all_extractors() {
    let extractors: Vec<Box<dyn PrescriptionExtractor>> = vec![
        Box::new(StructuredSectionExtractor::default()),
        Box::new(LabeledSectionExtractor::new()),
        Box::new(WholeTextExtractor::new()),
    ];

    for extractor in extractors {
        let draft = extractor.extract("", &ctx());
        let tier = extractor.tier();

        assert_eq!(draft.pd_type, PdType::Single, "{tier}: pd type");
        assert_eq!(draft.right_eye, EyeMeasurement::default(), "{tier}: right eye");
        assert_eq!(draft.left_eye, EyeMeasurement::default(), "{tier}: left eye");
        assert_eq!(draft.name, None, "{tier}: name");
        assert_eq!(draft.phone, None, "{tier}: phone");
        assert_eq!(draft.email, None, "{tier}: email");
        assert_eq!(draft.location, None, "{tier}: location");
        assert!(draft.recovered.is_empty(), "{tier}: recovered");
    }
}

#[test]
fn test_structured_ignores_unstructured_text() {
    let text = "Patient: Jane Roe\nOD SPH: -1.00\nOS SPH: +0.50\nPD: 62";
    let draft = StructuredSectionExtractor::default().extract(text, &ctx());
    assert_eq!(draft, PrescriptionDraft::default());
}

#[test]
fn test_structured_is_idempotent() {
    let text = format!("PATIENT PRESCRIPTION\n{EYE_SECTIONS}\nPUPILLARY DISTANCE: 64mm (Dual)\n");
    let extractor = StructuredSectionExtractor::default();

    let first = extractor.extract(&text, &ctx());
    let second = extractor.extract(&text, &ctx());
    assert_eq!(first, second);
}

#[test]
fn test_whole_text_invalid_dates() {
    let extractor = WholeTextExtractor::new();

    let draft = extractor.extract("DOB: notadate\nExam Date: notadate", &ctx());
    assert_eq!(draft.dob, None);
    assert_eq!(draft.exam_date.as_deref(), Some("2025-04-25"));
    assert!(!draft.was_recovered(DraftField::Dob));
    assert!(!draft.was_recovered(DraftField::ExamDate));

    let draft = extractor.extract("DOB: May 5, 1980\nExam Date: 04/20/2025", &ctx());
    assert_eq!(draft.dob.as_deref(), Some("1980-05-05"));
    assert_eq!(draft.exam_date.as_deref(), Some("2025-04-20"));
}

#[test]
fn test_recovered_marks_only_matched_eye_values() {
    let draft = WholeTextExtractor::new().extract("OD SPH: 0.00\nOD AXIS: 0", &ctx());

    // Explicit zeros are distinguishable from defaults
    assert!(draft.was_recovered(DraftField::RightSph));
    assert!(draft.was_recovered(DraftField::RightAxis));
    assert!(!draft.was_recovered(DraftField::RightCyl));
    assert!(!draft.was_recovered(DraftField::LeftSph));
    assert_eq!(draft.right_eye, EyeMeasurement::default());
}

#[test]
fn test_first_label_alternative_wins() {
    let draft = WholeTextExtractor::new().extract(
        "Patient: Second Choice\nName: First Choice\nSPH1: -3.00\nOD SPH: -1.00",
        &ctx(),
    );
    assert_eq!(draft.name.as_deref(), Some("First Choice"));
    assert_eq!(draft.right_eye.sph, -3.0);
}
