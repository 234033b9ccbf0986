//! Prescription extractors.
//!
//! Three heuristics of decreasing specificity, run as a fallback chain:
//!
//! - [`StructuredSectionExtractor`]: banner-delimited layout with numbered
//!   field labels (`SPH1`, `SPH2`, `PUPILLARY DISTANCE: 64mm`)
//! - [`LabeledSectionExtractor`]: `--- Right Eye ---` style sections with
//!   `key: value` lines
//! - [`WholeTextExtractor`]: per-field label search over the whole text
//!
//! None of them fail: unmatched input yields a defaulted draft.

mod labeled;
mod normalizer;
mod structured;
mod whole_text;

pub use labeled::*;
pub use normalizer::*;
pub use structured::*;
pub use whole_text::*;

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ExtractorConfig;
use crate::models::{Eye, EyeComponent, PrescriptionDraft};

/// Per-call context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractContext {
    /// Date substituted for a missing or unparseable exam date
    pub run_date: NaiveDate,
}

impl ExtractContext {
    pub fn new(run_date: NaiveDate) -> Self {
        Self { run_date }
    }

    /// Context dated with the current UTC calendar day.
    pub fn today() -> Self {
        Self::new(chrono::Utc::now().date_naive())
    }

    /// The run date as `YYYY-MM-DD`.
    pub fn run_date_string(&self) -> String {
        format_date(self.run_date)
    }
}

/// Which extractor produced a draft.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTier {
    Structured,
    Labeled,
    WholeText,
}

impl ExtractionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionTier::Structured => "structured",
            ExtractionTier::Labeled => "labeled",
            ExtractionTier::WholeText => "whole_text",
        }
    }
}

impl fmt::Display for ExtractionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A draft plus the tier that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionOutcome {
    pub draft: PrescriptionDraft,
    pub tier: ExtractionTier,
}

/// Common shape of every extractor: raw text in, total draft out.
pub trait PrescriptionExtractor {
    fn tier(&self) -> ExtractionTier;

    fn extract(&self, text: &str, ctx: &ExtractContext) -> PrescriptionDraft;
}

/// The fallback chain over already-decoded text.
pub struct TieredExtractor {
    structured: StructuredSectionExtractor,
    labeled: LabeledSectionExtractor,
    whole_text: WholeTextExtractor,
    min_populated_fields: usize,
}

impl Default for TieredExtractor {
    fn default() -> Self {
        Self::new(&ExtractorConfig::default())
    }
}

impl TieredExtractor {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            structured: StructuredSectionExtractor::new(config.placeholder_name.clone()),
            labeled: LabeledSectionExtractor::new(),
            whole_text: WholeTextExtractor::new(),
            min_populated_fields: config.min_populated_fields,
        }
    }

    /// Full chain: structured layout if its markers are present, otherwise
    /// labeled sections; either result is replaced by the whole-text result
    /// when it populates fewer fields than the threshold.
    pub fn extract_sectioned(&self, text: &str, ctx: &ExtractContext) -> ExtractionOutcome {
        let candidate: &dyn PrescriptionExtractor = if self.structured.detects_layout(text) {
            &self.structured
        } else {
            &self.labeled
        };

        let draft = candidate.extract(text, ctx);
        let populated = draft.populated_field_count();
        tracing::debug!(
            tier = %candidate.tier(),
            populated,
            threshold = self.min_populated_fields,
            "section extraction finished"
        );

        if populated >= self.min_populated_fields {
            return ExtractionOutcome {
                draft,
                tier: candidate.tier(),
            };
        }

        self.extract_whole_text(text, ctx)
    }

    /// Whole-text extraction only.
    pub fn extract_whole_text(&self, text: &str, ctx: &ExtractContext) -> ExtractionOutcome {
        ExtractionOutcome {
            draft: self.whole_text.extract(text, ctx),
            tier: ExtractionTier::WholeText,
        }
    }

    pub fn structured(&self) -> &StructuredSectionExtractor {
        &self.structured
    }

    pub fn labeled(&self) -> &LabeledSectionExtractor {
        &self.labeled
    }

    pub fn whole_text(&self) -> &WholeTextExtractor {
        &self.whole_text
    }
}

// =========================================================================
// Eye field lines (shared by the section-aware extractors)
// =========================================================================

/// Label patterns for one eye. Each accepts the bare label or the label with
/// the eye's number (`SPH`, `SPH1`).
struct EyeLinePatterns {
    sph: Regex,
    cyl: Regex,
    axis: Regex,
    add: Regex,
}

impl EyeLinePatterns {
    fn for_suffix(suffix: char) -> Self {
        let decimal = |label: &str| {
            Regex::new(&format!(r"(?i){label}{suffix}?:\s*([-+]?\d+\.?\d*)")).unwrap()
        };
        Self {
            sph: decimal("SPH"),
            cyl: decimal("CYL"),
            axis: Regex::new(&format!(r"(?i)AXIS{suffix}?:\s*(\d+)")).unwrap(),
            add: decimal("ADD"),
        }
    }
}

static RIGHT_EYE_LINE: LazyLock<EyeLinePatterns> = LazyLock::new(|| EyeLinePatterns::for_suffix('1'));
static LEFT_EYE_LINE: LazyLock<EyeLinePatterns> = LazyLock::new(|| EyeLinePatterns::for_suffix('2'));

/// Try one line against the sphere/cylinder/axis/add labels of `eye`, in
/// that order. Returns `true` when a label matched; the first match wins and
/// the rest are not tried.
pub(crate) fn apply_eye_line(draft: &mut PrescriptionDraft, eye: Eye, line: &str) -> bool {
    let patterns: &EyeLinePatterns = match eye {
        Eye::Right => &RIGHT_EYE_LINE,
        Eye::Left => &LEFT_EYE_LINE,
    };

    let decimals = [
        (&patterns.sph, EyeComponent::Sph),
        (&patterns.cyl, EyeComponent::Cyl),
    ];
    for (regex, component) in decimals {
        if let Some(caps) = regex.captures(line) {
            if let Some(value) = parse_decimal(&caps[1]) {
                draft.set_eye_decimal(eye, component, value);
            }
            return true;
        }
    }

    if let Some(caps) = patterns.axis.captures(line) {
        if let Some(axis) = parse_axis(&caps[1]) {
            draft.set_eye_axis(eye, axis);
        }
        return true;
    }

    if let Some(caps) = patterns.add.captures(line) {
        if let Some(value) = parse_decimal(&caps[1]) {
            draft.set_eye_decimal(eye, EyeComponent::Add, value);
        }
        return true;
    }

    false
}
