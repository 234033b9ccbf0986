//! Caller-owned form state that extraction drafts are merged into.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::draft::{DraftField, Eye, EyeComponent, EyeMeasurement, PdType, PrescriptionDraft};
use crate::extractor::parse_calendar_date;

/// Editable patient/prescription record as held by the entry form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PatientForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub location: String,
    /// `YYYY-MM-DD`, or whatever the user typed
    pub dob: String,
    /// Completed years, derived from `dob`
    pub age: Option<u32>,
    /// `YYYY-MM-DD`
    pub exam_date: String,
    pub right_eye: EyeMeasurement,
    pub left_eye: EyeMeasurement,
    pub pd_type: PdType,
    pub pd: Option<f64>,
    pub pd_od: Option<f64>,
    pub pd_os: Option<f64>,
}

impl PatientForm {
    /// A blank form dated `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            exam_date: today.format("%Y-%m-%d").to_string(),
            pd: Some(0.0),
            ..Self::default()
        }
    }

    /// Apply an extraction draft on top of the current values.
    ///
    /// Present draft fields win one by one; absent ones leave the form alone.
    /// Eye values are only taken when the draft actually recovered them, so a
    /// defaulted zero never clobbers something the user typed. `pd_type`
    /// always follows the draft.
    pub fn merge_draft(&mut self, draft: &PrescriptionDraft, today: NaiveDate) {
        let text_fields = [
            (&mut self.name, &draft.name),
            (&mut self.phone, &draft.phone),
            (&mut self.email, &draft.email),
            (&mut self.location, &draft.location),
            (&mut self.dob, &draft.dob),
            (&mut self.exam_date, &draft.exam_date),
        ];
        for (target, value) in text_fields {
            if let Some(value) = value {
                target.clone_from(value);
            }
        }

        for eye in [Eye::Right, Eye::Left] {
            let source = draft.eye(eye);
            let target = match eye {
                Eye::Right => &mut self.right_eye,
                Eye::Left => &mut self.left_eye,
            };
            if draft.was_recovered(eye.field(EyeComponent::Sph)) {
                target.sph = source.sph;
            }
            if draft.was_recovered(eye.field(EyeComponent::Cyl)) {
                target.cyl = source.cyl;
            }
            if draft.was_recovered(eye.field(EyeComponent::Axis)) {
                target.axis = source.axis;
            }
            if draft.was_recovered(eye.field(EyeComponent::Add)) {
                target.add = source.add;
            }
        }

        self.pd_type = draft.pd_type;
        for (target, value) in [
            (&mut self.pd, draft.pd),
            (&mut self.pd_od, draft.pd_od),
            (&mut self.pd_os, draft.pd_os),
        ] {
            if value.is_some() {
                *target = value;
            }
        }

        if let Some(dob) = draft.dob.as_deref().and_then(parse_calendar_date) {
            self.age = Some(calculate_age(dob, today));
        }

        tracing::debug!(
            fields = draft.recovered.len(),
            dob_recovered = draft.was_recovered(DraftField::Dob),
            "merged draft into form"
        );
    }
}

/// Completed years between `dob` and `today` (zero for future dates).
pub fn calculate_age(dob: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    years.max(0) as u32
}
