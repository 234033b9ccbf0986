//! Prescription draft produced by a single extraction run.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Refraction values for one eye.
///
/// Values that were not found stay at zero. Use
/// [`PrescriptionDraft::recovered`] to tell a measured zero from a default.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct EyeMeasurement {
    /// Sphere, signed diopters
    pub sph: f64,
    /// Cylinder, signed diopters
    pub cyl: f64,
    /// Axis in degrees; nominally 0-180 but passed through as written
    pub axis: u32,
    /// Near addition, signed diopters
    pub add: f64,
}

/// Which pupillary distance fields are authoritative.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PdType {
    /// One binocular value in `pd`
    #[default]
    Single,
    /// Per-eye values in `pd_od` / `pd_os`
    Dual,
}

impl PdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PdType::Single => "single",
            PdType::Dual => "dual",
        }
    }
}

/// Every field an extractor can recover from text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DraftField {
    Name,
    Phone,
    Email,
    Location,
    Dob,
    ExamDate,
    RightSph,
    RightCyl,
    RightAxis,
    RightAdd,
    LeftSph,
    LeftCyl,
    LeftAxis,
    LeftAdd,
    Pd,
    PdOd,
    PdOs,
}

impl DraftField {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftField::Name => "name",
            DraftField::Phone => "phone",
            DraftField::Email => "email",
            DraftField::Location => "location",
            DraftField::Dob => "dob",
            DraftField::ExamDate => "exam_date",
            DraftField::RightSph => "right_sph",
            DraftField::RightCyl => "right_cyl",
            DraftField::RightAxis => "right_axis",
            DraftField::RightAdd => "right_add",
            DraftField::LeftSph => "left_sph",
            DraftField::LeftCyl => "left_cyl",
            DraftField::LeftAxis => "left_axis",
            DraftField::LeftAdd => "left_add",
            DraftField::Pd => "pd",
            DraftField::PdOd => "pd_od",
            DraftField::PdOs => "pd_os",
        }
    }
}

/// Eye side, used to pick the right measurement and recovered-field tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Right,
    Left,
}

/// One refraction component of an eye.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeComponent {
    Sph,
    Cyl,
    Axis,
    Add,
}

impl Eye {
    /// The recovered-field tag for `component` on this eye.
    pub fn field(self, component: EyeComponent) -> DraftField {
        match (self, component) {
            (Eye::Right, EyeComponent::Sph) => DraftField::RightSph,
            (Eye::Right, EyeComponent::Cyl) => DraftField::RightCyl,
            (Eye::Right, EyeComponent::Axis) => DraftField::RightAxis,
            (Eye::Right, EyeComponent::Add) => DraftField::RightAdd,
            (Eye::Left, EyeComponent::Sph) => DraftField::LeftSph,
            (Eye::Left, EyeComponent::Cyl) => DraftField::LeftCyl,
            (Eye::Left, EyeComponent::Axis) => DraftField::LeftAxis,
            (Eye::Left, EyeComponent::Add) => DraftField::LeftAdd,
        }
    }
}

/// The result of one extraction call.
///
/// Always a total structure: eye values default to zero and `pd_type` to
/// single. Text and date fields are `None` when nothing was found and no
/// default applies.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionDraft {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    /// `YYYY-MM-DD` when parseable; the Labeled-Section extractor keeps an
    /// unparseable value verbatim
    pub dob: Option<String>,
    /// `YYYY-MM-DD`
    pub exam_date: Option<String>,
    pub right_eye: EyeMeasurement,
    pub left_eye: EyeMeasurement,
    pub pd_type: PdType,
    /// Binocular PD in mm, authoritative iff `pd_type` is single
    pub pd: Option<f64>,
    /// Right PD in mm, authoritative iff `pd_type` is dual
    pub pd_od: Option<f64>,
    /// Left PD in mm, authoritative iff `pd_type` is dual
    pub pd_os: Option<f64>,
    /// Fields actually matched in the text (defaults are never listed)
    #[serde(default)]
    pub recovered: BTreeSet<DraftField>,
}

impl PrescriptionDraft {
    /// Count of populated top-level scalar fields.
    ///
    /// Counts name, phone, email, location, dob, exam date and the three PD
    /// values. Eye sub-structures and `pd_type` never count. Defaults that
    /// were filled in (placeholder name, run-date exam date) do count.
    pub fn populated_field_count(&self) -> usize {
        let text_fields = [
            &self.name,
            &self.phone,
            &self.email,
            &self.location,
            &self.dob,
            &self.exam_date,
        ];
        let pd_fields = [self.pd, self.pd_od, self.pd_os];

        text_fields.iter().filter(|f| f.is_some()).count()
            + pd_fields.iter().filter(|f| f.is_some()).count()
    }

    /// Whether `field` was matched in the source text.
    pub fn was_recovered(&self, field: DraftField) -> bool {
        self.recovered.contains(&field)
    }

    pub fn eye(&self, eye: Eye) -> &EyeMeasurement {
        match eye {
            Eye::Right => &self.right_eye,
            Eye::Left => &self.left_eye,
        }
    }

    // Setters record the field as recovered.

    pub(crate) fn set_text(&mut self, field: DraftField, value: &str) {
        let value = Some(value.trim().to_string());
        match field {
            DraftField::Name => self.name = value,
            DraftField::Phone => self.phone = value,
            DraftField::Email => self.email = value,
            DraftField::Location => self.location = value,
            DraftField::Dob => self.dob = value,
            DraftField::ExamDate => self.exam_date = value,
            _ => return,
        }
        self.recovered.insert(field);
    }

    pub(crate) fn set_eye_decimal(&mut self, eye: Eye, component: EyeComponent, value: f64) {
        let target = match eye {
            Eye::Right => &mut self.right_eye,
            Eye::Left => &mut self.left_eye,
        };
        match component {
            EyeComponent::Sph => target.sph = value,
            EyeComponent::Cyl => target.cyl = value,
            EyeComponent::Add => target.add = value,
            EyeComponent::Axis => return,
        }
        self.recovered.insert(eye.field(component));
    }

    pub(crate) fn set_eye_axis(&mut self, eye: Eye, axis: u32) {
        match eye {
            Eye::Right => self.right_eye.axis = axis,
            Eye::Left => self.left_eye.axis = axis,
        }
        self.recovered.insert(eye.field(EyeComponent::Axis));
    }

    pub(crate) fn set_pd(&mut self, field: DraftField, value: f64) {
        match field {
            DraftField::Pd => self.pd = Some(value),
            DraftField::PdOd => self.pd_od = Some(value),
            DraftField::PdOs => self.pd_os = Some(value),
            _ => return,
        }
        self.recovered.insert(field);
    }

    /// Names of the recovered fields, in declaration order.
    pub fn recovered_names(&self) -> Vec<&'static str> {
        self.recovered.iter().map(DraftField::as_str).collect()
    }
}
