// 📐 Backend Response Schemas
// Explicit typed shapes for AI backend payloads, validated at the API
// boundary. Callers downstream never probe loose JSON.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::ResponseBody;
use crate::bills::MedicalBill;
use crate::insurance::InsuranceInfo;

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), Vec<ValidationError>>;

// ============================================================================
// FIELD VALIDATORS
// ============================================================================

/// Core bill invariants checked wherever a bill crosses into the system
pub fn validate_bill(bill: &MedicalBill) -> ValidationResult {
    let mut errors = Vec::new();

    if bill.provider_name.is_empty() {
        errors.push(ValidationError::new("provider_name", "Required field is empty"));
    }
    if bill.total_amount < 0.0 {
        errors.push(ValidationError::new("total_amount", "Must not be negative"));
    }
    if bill.patient_responsibility < 0.0 {
        errors.push(ValidationError::new(
            "patient_responsibility",
            "Must not be negative",
        ));
    }
    if bill.insurance_paid < 0.0 {
        errors.push(ValidationError::new("insurance_paid", "Must not be negative"));
    }
    if bill.insurance_adjustments < 0.0 {
        errors.push(ValidationError::new(
            "insurance_adjustments",
            "Must not be negative",
        ));
    }
    if bill.patient_responsibility > bill.total_amount {
        errors.push(ValidationError::new(
            "patient_responsibility",
            "Cannot exceed the total billed amount",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Plan invariants: non-negative amounts, rates expressed as fractions
pub fn validate_insurance(insurance: &InsuranceInfo) -> ValidationResult {
    let mut errors = Vec::new();

    for (field, value) in [
        ("annual_deductible", insurance.annual_deductible),
        ("deductible_met", insurance.deductible_met),
        ("annual_out_of_pocket_max", insurance.annual_out_of_pocket_max),
        ("out_of_pocket_met", insurance.out_of_pocket_met),
        ("copay_amount", insurance.copay_amount),
    ] {
        if value < 0.0 {
            errors.push(ValidationError::new(field, "Must not be negative"));
        }
    }

    for (field, rate) in [
        ("coinsurance_rate", insurance.coinsurance_rate),
        ("coverage_percentage", insurance.coverage_percentage),
    ] {
        if !(0.0..=1.0).contains(&rate) {
            errors.push(ValidationError::new(field, "Must be between 0.0 and 1.0"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// ============================================================================
// EXTRACTED BILL (bill photo → structured data)
// ============================================================================

/// Structured result of backend bill extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedBill {
    pub bill: MedicalBill,

    /// Extraction confidence, 0.0–1.0
    pub confidence: f64,

    /// Fields the extractor was unsure about
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ExtractedBill {
    /// Decode and validate a backend response; rejects non-JSON payloads,
    /// unexpected shapes, and out-of-range values
    pub fn parse(body: &ResponseBody) -> Result<Self, Vec<ValidationError>> {
        let value = json_payload(body)?;

        let extracted: ExtractedBill = serde_json::from_value(value.clone())
            .map_err(|err| vec![ValidationError::new("response", err.to_string())])?;

        let mut errors = Vec::new();
        if !(0.0..=1.0).contains(&extracted.confidence) {
            errors.push(ValidationError::new(
                "confidence",
                "Must be between 0.0 and 1.0",
            ));
        }
        if let Err(mut bill_errors) = validate_bill(&extracted.bill) {
            errors.append(&mut bill_errors);
        }

        if errors.is_empty() {
            Ok(extracted)
        } else {
            Err(errors)
        }
    }
}

// ============================================================================
// APPEAL LETTER (denial info → draft letter)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppealTone {
    Professional,
    Emphatic,
    Detailed,
    Concise,
}

impl AppealTone {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppealTone::Professional => "professional",
            AppealTone::Emphatic => "emphatic",
            AppealTone::Detailed => "detailed",
            AppealTone::Concise => "concise",
        }
    }
}

/// Request body for the appeal-drafting endpoint
#[derive(Debug, Clone, Serialize)]
pub struct AppealRequest {
    pub denial_info: Value,
    pub policy_data: Value,
    pub tone: AppealTone,
}

impl AppealRequest {
    pub fn to_body(&self) -> Value {
        json!({
            "denial_info": self.denial_info,
            "policy_data": self.policy_data,
            "tone": self.tone.as_str(),
        })
    }
}

/// Draft appeal letter returned by the backend; offered to the user as a
/// downloadable text blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppealLetter {
    pub letter_text: String,

    #[serde(default)]
    pub tone: Option<AppealTone>,

    /// Plan clauses or regulations the letter cites
    #[serde(default)]
    pub citations: Vec<String>,
}

impl AppealLetter {
    pub fn parse(body: &ResponseBody) -> Result<Self, Vec<ValidationError>> {
        let value = json_payload(body)?;

        let letter: AppealLetter = serde_json::from_value(value.clone())
            .map_err(|err| vec![ValidationError::new("response", err.to_string())])?;

        if letter.letter_text.trim().is_empty() {
            return Err(vec![ValidationError::new(
                "letter_text",
                "Letter text must not be empty",
            )]);
        }

        Ok(letter)
    }
}

fn json_payload(body: &ResponseBody) -> Result<&Value, Vec<ValidationError>> {
    body.as_json().ok_or_else(|| {
        vec![ValidationError::new(
            "response",
            "Expected a JSON response body",
        )]
    })
}

// ============================================================================
// TESTS
// ============================================================================
