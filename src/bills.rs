// 🧾 Medical Bill Audit Engine
// Deterministic checks over itemized bills: duplicate charges, coding
// inconsistencies, missing insurance payments, upcoding, unbundling, and
// pricing anomalies. Every issue carries an estimated savings figure.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

// ============================================================================
// MEDICAL BILL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalBill {
    pub provider_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_date: Option<NaiveDate>,

    pub total_amount: f64,
    pub patient_responsibility: f64,

    #[serde(default)]
    pub insurance_paid: f64,

    #[serde(default)]
    pub insurance_adjustments: f64,

    #[serde(default)]
    pub service_codes: Vec<String>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub is_itemized: bool,
}

impl MedicalBill {
    /// Idempotency hash over the fields that identify one statement.
    /// Two bills with the same fingerprint are the same charge submitted
    /// twice, not two distinct services.
    pub fn fingerprint(&self) -> String {
        let mut codes = self.service_codes.clone();
        codes.sort();

        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}|{}|{:.2}|{}",
            self.provider_name,
            self.service_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            self.total_amount,
            codes.join(",")
        ));
        format!("{:x}", hasher.finalize())
    }
}

// ============================================================================
// ISSUES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    High,
    Medium,
    Low,
}

impl IssueSeverity {
    fn rank(self) -> u8 {
        match self {
            IssueSeverity::High => 0,
            IssueSeverity::Medium => 1,
            IssueSeverity::Low => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    NotItemized,
    DuplicateCharge,
    DuplicateBill,
    CodingInconsistency,
    UnknownCode,
    NoInsuranceApplied,
    ExcessiveAdjustment,
    PotentialUpcoding,
    PotentialUnbundling,
    PricingAnomaly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillAnalysisIssue {
    pub kind: IssueKind,
    pub severity: IssueSeverity,
    pub description: String,
    pub potential_savings: f64,
    pub recommendation: String,
}

// ============================================================================
// CPT REFERENCE DATA
// ============================================================================

struct CptInfo {
    name: &'static str,
    typical_cost_range: (f64, f64),
}

fn cpt_database() -> HashMap<&'static str, CptInfo> {
    HashMap::from([
        (
            "99213",
            CptInfo {
                name: "Office Visit - Level 3",
                typical_cost_range: (100.0, 200.0),
            },
        ),
        (
            "99214",
            CptInfo {
                name: "Office Visit - Level 4",
                typical_cost_range: (200.0, 300.0),
            },
        ),
        (
            "99281",
            CptInfo {
                name: "Emergency Room Visit - Level 1",
                typical_cost_range: (400.0, 600.0),
            },
        ),
        (
            "70551",
            CptInfo {
                name: "MRI Brain without Contrast",
                typical_cost_range: (1_000.0, 1_500.0),
            },
        ),
        (
            "71250",
            CptInfo {
                name: "CT Scan Chest",
                typical_cost_range: (600.0, 900.0),
            },
        ),
        (
            "80053",
            CptInfo {
                name: "Comprehensive Metabolic Panel",
                typical_cost_range: (30.0, 60.0),
            },
        ),
        (
            "45378",
            CptInfo {
                name: "Colonoscopy with Biopsy",
                typical_cost_range: (2_000.0, 3_000.0),
            },
        ),
    ])
}

// ============================================================================
// ITEMIZATION REQUEST
// ============================================================================

/// Ready-to-send request for a fully itemized statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemizationRequest {
    pub provider_name: String,
    pub service_date: Option<NaiveDate>,
    pub request_text: String,
    pub additional_notes: Vec<&'static str>,
}

// ============================================================================
// SAVINGS OPPORTUNITIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueTypeSummary {
    pub count: usize,
    pub total_savings: f64,
    pub average_savings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsOpportunities {
    pub total_issues: usize,
    pub total_potential_savings: f64,
    pub by_type: HashMap<IssueKind, IssueTypeSummary>,
    pub high_priority_issues: Vec<BillAnalysisIssue>,
    pub recommended_actions: Vec<&'static str>,
}

// ============================================================================
// BILL ANALYZER
// ============================================================================

pub struct BillAnalyzer {
    cpt_database: HashMap<&'static str, CptInfo>,
}

impl BillAnalyzer {
    pub fn new() -> Self {
        BillAnalyzer {
            cpt_database: cpt_database(),
        }
    }

    /// Run every check over every bill and return issues sorted by severity,
    /// then by descending potential savings
    pub fn analyze_bills(&self, bills: &[MedicalBill]) -> Vec<BillAnalysisIssue> {
        let mut issues = Vec::new();

        for bill in bills {
            issues.extend(self.analyze_single_bill(bill));
        }
        issues.extend(self.check_resubmitted_bills(bills));

        Self::prioritize(issues)
    }

    fn analyze_single_bill(&self, bill: &MedicalBill) -> Vec<BillAnalysisIssue> {
        if !bill.is_itemized {
            // Nothing else can be verified without line items
            return vec![BillAnalysisIssue {
                kind: IssueKind::NotItemized,
                severity: IssueSeverity::Medium,
                description: "Bill is not itemized, preventing detailed analysis".to_string(),
                potential_savings: bill.patient_responsibility * 0.10,
                recommendation: "Request an itemized bill to review charges in detail".to_string(),
            }];
        }

        let mut issues = Vec::new();
        issues.extend(self.check_duplicates(bill));
        issues.extend(self.check_coding_consistency(bill));
        issues.extend(self.check_insurance_adjustments(bill));
        issues.extend(self.check_upcoding(bill));
        issues.extend(self.check_unbundling(bill));
        issues.extend(self.check_pricing_anomalies(bill));
        issues
    }

    fn check_duplicates(&self, bill: &MedicalBill) -> Vec<BillAnalysisIssue> {
        let mut code_counts: HashMap<&str, usize> = HashMap::new();
        for code in &bill.service_codes {
            *code_counts.entry(code.as_str()).or_insert(0) += 1;
        }

        let mut issues = Vec::new();
        for (code, count) in code_counts {
            if count > 1 {
                let typical_cost = self
                    .cpt_database
                    .get(code)
                    .map(|info| info.typical_cost_range.0)
                    .unwrap_or(0.0);

                issues.push(BillAnalysisIssue {
                    kind: IssueKind::DuplicateCharge,
                    severity: IssueSeverity::High,
                    description: format!(
                        "CPT code {} appears {} times on the same bill",
                        code, count
                    ),
                    potential_savings: typical_cost * (count as f64 - 1.0),
                    recommendation: "Verify that the service was actually performed multiple times. Contact the provider to dispute duplicate charges.".to_string(),
                });
            }
        }
        issues
    }

    fn check_coding_consistency(&self, bill: &MedicalBill) -> Vec<BillAnalysisIssue> {
        let mut issues = Vec::new();

        if bill.description.to_lowercase().contains("office visit")
            && !bill.service_codes.iter().any(|code| code.starts_with("992"))
        {
            issues.push(BillAnalysisIssue {
                kind: IssueKind::CodingInconsistency,
                severity: IssueSeverity::Medium,
                description:
                    "Bill description mentions office visit but no evaluation codes (992xx) found"
                        .to_string(),
                potential_savings: bill.patient_responsibility * 0.15,
                recommendation:
                    "Request clarification on the codes used and verify they match the services provided"
                        .to_string(),
            });
        }

        for code in &bill.service_codes {
            if !self.cpt_database.contains_key(code.as_str()) {
                issues.push(BillAnalysisIssue {
                    kind: IssueKind::UnknownCode,
                    severity: IssueSeverity::Low,
                    description: format!("CPT code {} not found in standard database", code),
                    potential_savings: 0.0,
                    recommendation: "Verify this code with your provider".to_string(),
                });
            }
        }
        issues
    }

    fn check_insurance_adjustments(&self, bill: &MedicalBill) -> Vec<BillAnalysisIssue> {
        let mut issues = Vec::new();

        if bill.insurance_adjustments == 0.0
            && bill.insurance_paid == 0.0
            && bill.total_amount > bill.patient_responsibility
        {
            issues.push(BillAnalysisIssue {
                kind: IssueKind::NoInsuranceApplied,
                severity: IssueSeverity::High,
                description: "No insurance payment or adjustment recorded on bill".to_string(),
                potential_savings: bill.total_amount - bill.patient_responsibility,
                recommendation: "Contact insurance to verify coverage was applied correctly"
                    .to_string(),
            });
        }

        if bill.insurance_adjustments > bill.total_amount {
            issues.push(BillAnalysisIssue {
                kind: IssueKind::ExcessiveAdjustment,
                severity: IssueSeverity::Medium,
                description: format!(
                    "Insurance adjustment (${:.2}) exceeds total bill (${:.2})",
                    bill.insurance_adjustments, bill.total_amount
                ),
                potential_savings: 0.0,
                recommendation: "Contact provider billing department for clarification".to_string(),
            });
        }
        issues
    }

    fn check_upcoding(&self, bill: &MedicalBill) -> Vec<BillAnalysisIssue> {
        let mut issues = Vec::new();

        for code in &bill.service_codes {
            // Evaluation codes billed with scant documentation are suspect
            if code.starts_with("992")
                && self.cpt_database.contains_key(code.as_str())
                && bill.description.len() < 50
            {
                issues.push(BillAnalysisIssue {
                    kind: IssueKind::PotentialUpcoding,
                    severity: IssueSeverity::Medium,
                    description: format!(
                        "Evaluation code {} may be upcoded if description doesn't support complexity level",
                        code
                    ),
                    potential_savings: bill.patient_responsibility * 0.20,
                    recommendation:
                        "Compare services received to code description and discuss with provider if discrepancy exists"
                            .to_string(),
                });
            }
        }
        issues
    }

    fn check_unbundling(&self, bill: &MedicalBill) -> Vec<BillAnalysisIssue> {
        let mut issues = Vec::new();

        if bill.service_codes.len() > 5 {
            issues.push(BillAnalysisIssue {
                kind: IssueKind::PotentialUnbundling,
                severity: IssueSeverity::Medium,
                description: format!(
                    "Bill contains {} separate codes which may indicate unbundling",
                    bill.service_codes.len()
                ),
                potential_savings: bill.patient_responsibility * 0.15,
                recommendation:
                    "Ask if services could have been billed as a single bundled procedure"
                        .to_string(),
            });
        }
        issues
    }

    fn check_pricing_anomalies(&self, bill: &MedicalBill) -> Vec<BillAnalysisIssue> {
        let mut issues = Vec::new();

        for code in &bill.service_codes {
            let Some(info) = self.cpt_database.get(code.as_str()) else {
                continue;
            };
            let (typical_min, typical_max) = info.typical_cost_range;

            let charge_per_service = if bill.service_codes.is_empty() {
                bill.total_amount
            } else {
                bill.total_amount / bill.service_codes.len() as f64
            };

            if charge_per_service > typical_max * 1.5 {
                issues.push(BillAnalysisIssue {
                    kind: IssueKind::PricingAnomaly,
                    severity: IssueSeverity::High,
                    description: format!(
                        "Charge for code {} (${:.2}) significantly exceeds typical range (${:.0}-{:.0})",
                        code, charge_per_service, typical_min, typical_max
                    ),
                    potential_savings: charge_per_service - typical_max,
                    recommendation: "Request pricing justification or negotiate with provider"
                        .to_string(),
                });
            }
        }
        issues
    }

    /// The same statement submitted more than once across the set of bills
    fn check_resubmitted_bills(&self, bills: &[MedicalBill]) -> Vec<BillAnalysisIssue> {
        let mut seen = std::collections::HashSet::new();
        let mut issues = Vec::new();

        for bill in bills {
            let fingerprint = bill.fingerprint();
            if seen.contains(&fingerprint) {
                issues.push(BillAnalysisIssue {
                    kind: IssueKind::DuplicateBill,
                    severity: IssueSeverity::High,
                    description: format!(
                        "Bill from {} for ${:.2} appears more than once",
                        bill.provider_name, bill.total_amount
                    ),
                    potential_savings: bill.patient_responsibility,
                    recommendation:
                        "Confirm with the provider that this statement was not billed twice"
                            .to_string(),
                });
            } else {
                seen.insert(fingerprint);
            }
        }
        issues
    }

    fn prioritize(mut issues: Vec<BillAnalysisIssue>) -> Vec<BillAnalysisIssue> {
        issues.sort_by(|a, b| {
            a.severity
                .rank()
                .cmp(&b.severity.rank())
                .then(b.potential_savings.total_cmp(&a.potential_savings))
        });
        issues
    }

    /// Template for requesting a fully itemized statement from the provider
    pub fn itemization_request(&self, bill: &MedicalBill) -> ItemizationRequest {
        let date_text = bill
            .service_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "the relevant date".to_string());

        ItemizationRequest {
            provider_name: bill.provider_name.clone(),
            service_date: bill.service_date,
            request_text: format!(
                "Please provide a fully itemized bill for services rendered on {}. \
                 The itemized bill should include:\n\
                 - Date of each service\n\
                 - Description of each service\n\
                 - CPT/HCPCS code for each service\n\
                 - Charge for each service\n\
                 - Any adjustments or write-offs\n\
                 - Insurance payments and patient responsibility",
                date_text
            ),
            additional_notes: vec![
                "Include NPI number of each provider",
                "Request proof of medical necessity if applicable",
                "Ask for charge master rates used",
            ],
        }
    }

    /// Aggregate view over all issues found in a set of bills
    pub fn savings_opportunities(&self, bills: &[MedicalBill]) -> SavingsOpportunities {
        let issues = self.analyze_bills(bills);

        let total_potential_savings: f64 = issues.iter().map(|i| i.potential_savings).sum();

        let mut by_type: HashMap<IssueKind, IssueTypeSummary> = HashMap::new();
        for issue in &issues {
            let entry = by_type.entry(issue.kind).or_insert(IssueTypeSummary {
                count: 0,
                total_savings: 0.0,
                average_savings: 0.0,
            });
            entry.count += 1;
            entry.total_savings += issue.potential_savings;
        }
        for summary in by_type.values_mut() {
            summary.average_savings = summary.total_savings / summary.count as f64;
        }

        let high_priority_issues = issues
            .iter()
            .filter(|issue| issue.severity == IssueSeverity::High)
            .cloned()
            .collect();

        SavingsOpportunities {
            total_issues: issues.len(),
            total_potential_savings: (total_potential_savings * 100.0).round() / 100.0,
            by_type,
            high_priority_issues,
            recommended_actions: vec![
                "Address high-severity issues first",
                "Request itemized bills for all charges",
                "Contact providers to dispute errors",
                "Review insurance EOB for all claims",
            ],
        }
    }
}

impl Default for BillAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
