// 🤝 Assistance Program Matcher
// Scores a built-in catalog of financial assistance programs against a
// household's insurance, income, and debt, and orders the applications.

use serde::{Deserialize, Serialize};

use crate::bills::MedicalBill;
use crate::insurance::{InsuranceInfo, InsuranceType};
use crate::navigation::{federal_poverty_level, HardshipLevel};

// ============================================================================
// PROGRAM CATALOG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    Hospital,
    Government,
    Pharmaceutical,
    Nonprofit,
    Clinic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistanceProgram {
    pub program_name: &'static str,
    pub provider_type: ProviderType,
    pub eligibility_requirements: Vec<&'static str>,
    pub coverage_type: &'static str,
    pub max_benefit: Option<f64>,
    pub application_process: &'static str,
    pub documentation_required: Vec<&'static str>,
    pub contact_info: &'static str,
    pub approval_timeframe: &'static str,
}

struct ProgramDefinition {
    program: AssistanceProgram,

    /// Qualifying income as a multiple of the federal poverty level
    income_threshold: f64,
}

fn program_catalog() -> Vec<ProgramDefinition> {
    vec![
        ProgramDefinition {
            income_threshold: 3.0,
            program: AssistanceProgram {
                program_name: "Hospital Charity Care",
                provider_type: ProviderType::Hospital,
                eligibility_requirements: vec![
                    "Income below 300% FPL",
                    "Uninsured or underinsured",
                    "Medical debt burden",
                    "Resident in hospital service area",
                ],
                coverage_type: "full_or_partial_discount",
                max_benefit: None,
                application_process:
                    "Complete charity care application at hospital financial assistance office",
                documentation_required: vec![
                    "Proof of income (tax returns, pay stubs)",
                    "Household size documentation",
                    "Proof of residency",
                    "Medical bills",
                ],
                contact_info: "Hospital billing department",
                approval_timeframe: "2-6 weeks",
            },
        },
        ProgramDefinition {
            income_threshold: 1.38,
            program: AssistanceProgram {
                program_name: "Medicaid",
                provider_type: ProviderType::Government,
                eligibility_requirements: vec![
                    "Income below state threshold (varies)",
                    "US citizen or qualified immigrant",
                    "State residency",
                    "Categorical eligibility (pregnancy, disability, etc.)",
                ],
                coverage_type: "comprehensive_health_coverage",
                max_benefit: None,
                application_process: "Apply through state Medicaid agency or Healthcare.gov",
                documentation_required: vec![
                    "Proof of citizenship/immigration status",
                    "Income verification",
                    "Social security numbers",
                    "Household information",
                ],
                contact_info: "State Medicaid agency",
                approval_timeframe: "45-90 days",
            },
        },
        ProgramDefinition {
            income_threshold: 2.5,
            program: AssistanceProgram {
                program_name: "CHIP (Children's Health Insurance Program)",
                provider_type: ProviderType::Government,
                eligibility_requirements: vec![
                    "Children under 19",
                    "Income above Medicaid eligibility but below state threshold",
                    "US citizen or qualified immigrant",
                    "Uninsured",
                ],
                coverage_type: "comprehensive_pediatric_coverage",
                max_benefit: None,
                application_process: "Apply through state CHIP agency or Healthcare.gov",
                documentation_required: vec![
                    "Proof of income",
                    "Child's birth certificate",
                    "Social security numbers",
                    "Proof of residency",
                ],
                contact_info: "State CHIP agency",
                approval_timeframe: "30-45 days",
            },
        },
        ProgramDefinition {
            income_threshold: 4.0,
            program: AssistanceProgram {
                program_name: "Hospital Financial Assistance Program",
                provider_type: ProviderType::Hospital,
                eligibility_requirements: vec![
                    "Income below 400% FPL",
                    "Demonstrated financial hardship",
                    "Medical debt with hospital",
                    "Unable to pay full amount",
                ],
                coverage_type: "payment_reduction",
                max_benefit: None,
                application_process:
                    "Contact hospital billing department to request financial assistance application",
                documentation_required: vec![
                    "Recent tax returns",
                    "Current pay stubs",
                    "Bank statements",
                    "Medical bills",
                ],
                contact_info: "Hospital financial assistance office",
                approval_timeframe: "2-4 weeks",
            },
        },
        ProgramDefinition {
            income_threshold: 3.0,
            program: AssistanceProgram {
                program_name: "Prescription Assistance Programs",
                provider_type: ProviderType::Pharmaceutical,
                eligibility_requirements: vec![
                    "No prescription drug coverage",
                    "Income below program threshold (varies)",
                    "US resident",
                    "Taking qualifying medications",
                ],
                coverage_type: "free_or_discounted_medications",
                max_benefit: None,
                application_process: "Apply through drug manufacturer assistance program",
                documentation_required: vec![
                    "Proof of income",
                    "Prescription information",
                    "Physician verification",
                    "No insurance coverage letter",
                ],
                contact_info: "Individual drug manufacturers",
                approval_timeframe: "2-4 weeks",
            },
        },
        ProgramDefinition {
            income_threshold: 4.0,
            program: AssistanceProgram {
                program_name: "State High-Risk Pool",
                provider_type: ProviderType::Government,
                eligibility_requirements: vec![
                    "Pre-existing condition",
                    "Unable to obtain private insurance",
                    "State residency",
                    "Meet income requirements",
                ],
                coverage_type: "comprehensive_health_coverage",
                max_benefit: None,
                application_process: "Apply through state high-risk pool program",
                documentation_required: vec![
                    "Proof of pre-existing condition",
                    "Insurance denial letters",
                    "Income documentation",
                    "Proof of residency",
                ],
                contact_info: "State insurance department",
                approval_timeframe: "4-8 weeks",
            },
        },
        ProgramDefinition {
            income_threshold: 2.5,
            program: AssistanceProgram {
                program_name: "Medical Debt Relief Charities",
                provider_type: ProviderType::Nonprofit,
                eligibility_requirements: vec![
                    "Significant medical debt",
                    "Income below threshold",
                    "Hardship circumstances",
                    "US resident",
                ],
                coverage_type: "debt_assistance",
                max_benefit: Some(10_000.0),
                application_process: "Submit application to charity organization",
                documentation_required: vec![
                    "Medical debt statements",
                    "Income verification",
                    "Hardship explanation",
                    "Household information",
                ],
                contact_info: "Individual charity organizations",
                approval_timeframe: "4-12 weeks",
            },
        },
        ProgramDefinition {
            income_threshold: 2.0,
            program: AssistanceProgram {
                program_name: "Community Health Centers",
                provider_type: ProviderType::Clinic,
                eligibility_requirements: vec![
                    "No geographic barriers",
                    "Willingness to use sliding fee scale",
                    "Household income verification",
                ],
                coverage_type: "discounted_medical_services",
                max_benefit: None,
                application_process: "Register at community health center",
                documentation_required: vec![
                    "Proof of income",
                    "Proof of residency",
                    "Identification",
                    "Household information",
                ],
                contact_info: "Local community health centers",
                approval_timeframe: "1-2 weeks",
            },
        },
    ]
}

// ============================================================================
// MATCH INPUT / OUTPUT
// ============================================================================

/// Everything the matcher knows about the household
#[derive(Debug, Clone, Copy)]
pub struct AssistanceContext<'a> {
    pub insurance: &'a InsuranceInfo,
    pub monthly_income: f64,
    pub household_size: u32,
    pub bills: &'a [MedicalBill],
    pub hardship_level: Option<HardshipLevel>,
    pub prescriptions: &'a [String],
}

/// Structured match result: `programs` is the one true response shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistanceMatch {
    pub programs: Vec<AssistanceProgram>,
    pub total_potential_savings: f64,
    pub recommended_programs: Vec<&'static str>,
    pub application_priority_order: Vec<&'static str>,
    pub additional_notes: Vec<String>,
}

struct Eligibility {
    eligible: bool,
    score: i32,
    priority: u8,
}

// ============================================================================
// ASSISTANCE MATCHER
// ============================================================================

/// Eligibility score a program must reach to be listed
const ELIGIBLE_SCORE: i32 = 40;

pub struct AssistanceMatcher {
    programs: Vec<ProgramDefinition>,
}

impl AssistanceMatcher {
    pub fn new() -> Self {
        AssistanceMatcher {
            programs: program_catalog(),
        }
    }

    pub fn match_assistance(&self, context: &AssistanceContext<'_>) -> AssistanceMatch {
        let mut scored: Vec<(&AssistanceProgram, Eligibility)> = self
            .programs
            .iter()
            .filter_map(|definition| {
                let eligibility = self.check_eligibility(definition, context);
                eligibility
                    .eligible
                    .then_some((&definition.program, eligibility))
            })
            .collect();

        scored.sort_by(|a, b| {
            a.1.priority
                .cmp(&b.1.priority)
                .then(b.1.score.cmp(&a.1.score))
        });

        let programs: Vec<AssistanceProgram> =
            scored.iter().map(|(program, _)| (*program).clone()).collect();

        let total_potential_savings = self.estimate_total_savings(&programs, context.bills);

        let recommended_programs = programs
            .iter()
            .take(3)
            .map(|program| program.program_name)
            .collect();
        let application_priority_order = programs
            .iter()
            .map(|program| program.program_name)
            .collect();

        let additional_notes = self.assistance_notes(&programs, context);

        AssistanceMatch {
            programs,
            total_potential_savings: (total_potential_savings * 100.0).round() / 100.0,
            recommended_programs,
            application_priority_order,
            additional_notes,
        }
    }

    fn check_eligibility(
        &self,
        definition: &ProgramDefinition,
        context: &AssistanceContext<'_>,
    ) -> Eligibility {
        let mut score = 0;
        let mut priority: u8 = 3;

        let annual_income = context.monthly_income * 12.0;
        let fpl = federal_poverty_level(context.household_size);
        let income_ratio = if fpl > 0.0 { annual_income / fpl } else { 0.0 };

        if income_ratio <= definition.income_threshold {
            score += 50;
        }

        if let Some(hardship) = context.hardship_level {
            let adjusted_threshold = match hardship {
                HardshipLevel::None => 4.0,
                HardshipLevel::Mild => 3.5,
                HardshipLevel::Moderate => 2.5,
                HardshipLevel::Severe => 1.5,
            };
            if income_ratio <= adjusted_threshold {
                score += 30;
            }
        }

        let uninsured = context.insurance.insurance_type == InsuranceType::Uninsured;
        let provider_type = definition.program.provider_type;

        if uninsured && provider_type == ProviderType::Hospital {
            score += 40;
            priority = 1;
        } else if uninsured && provider_type == ProviderType::Government {
            score += 35;
            priority = 1;
        } else if context.insurance.insurance_type == InsuranceType::Medicare
            && provider_type == ProviderType::Pharmaceutical
        {
            score += 30;
            priority = 2;
        }

        if !context.prescriptions.is_empty() && provider_type == ProviderType::Pharmaceutical {
            score += 25;
            priority = 2;
        }

        if !context.bills.is_empty() {
            let total_debt: f64 = context
                .bills
                .iter()
                .map(|bill| bill.patient_responsibility)
                .sum();
            if total_debt > 1_000.0 {
                score += 20;
            }
        }

        if matches!(
            provider_type,
            ProviderType::Hospital | ProviderType::Nonprofit
        ) {
            if income_ratio <= 2.0 {
                priority = priority.min(1);
            } else if income_ratio <= 3.0 {
                priority = priority.min(2);
            }
        }

        Eligibility {
            eligible: score >= ELIGIBLE_SCORE,
            score,
            priority,
        }
    }

    /// Rough ceiling on what matched programs could be worth; never more
    /// than the outstanding debt
    fn estimate_total_savings(
        &self,
        programs: &[AssistanceProgram],
        bills: &[MedicalBill],
    ) -> f64 {
        if bills.is_empty() {
            return 0.0;
        }

        let total_debt: f64 = bills.iter().map(|bill| bill.patient_responsibility).sum();
        let mut estimated = 0.0;

        if programs
            .iter()
            .any(|p| p.provider_type == ProviderType::Hospital)
        {
            estimated += total_debt * 0.50;
        }
        if programs
            .iter()
            .any(|p| p.provider_type == ProviderType::Government)
        {
            estimated += total_debt * 0.40;
        }
        for program in programs
            .iter()
            .filter(|p| p.provider_type == ProviderType::Nonprofit)
        {
            if let Some(max_benefit) = program.max_benefit {
                estimated += max_benefit * 0.50;
            }
        }

        estimated.min(total_debt)
    }

    fn assistance_notes(
        &self,
        programs: &[AssistanceProgram],
        context: &AssistanceContext<'_>,
    ) -> Vec<String> {
        let mut notes = Vec::new();

        if programs.is_empty() {
            notes.push(
                "No programs matched current criteria. Consider exploring alternative assistance options."
                    .to_string(),
            );
        } else {
            notes.push(format!(
                "Found {} potential assistance program(s).",
                programs.len()
            ));
        }

        if context.insurance.insurance_type == InsuranceType::Uninsured {
            notes.push(
                "Uninsured status qualifies for many hospital and government programs.".to_string(),
            );
        }

        if matches!(
            context.hardship_level,
            Some(HardshipLevel::Moderate) | Some(HardshipLevel::Severe)
        ) {
            notes.push(
                "Financial hardship level increases eligibility for charity care programs."
                    .to_string(),
            );
        }

        let hospital_count = programs
            .iter()
            .filter(|p| p.provider_type == ProviderType::Hospital)
            .count();
        if hospital_count > 0 {
            notes.push(format!(
                "Apply to {} hospital program(s) first for fastest processing.",
                hospital_count
            ));
        }

        let government_count = programs
            .iter()
            .filter(|p| p.provider_type == ProviderType::Government)
            .count();
        if government_count > 0 {
            notes.push(
                "Government programs may take longer but offer comprehensive coverage.".to_string(),
            );
        }

        notes.push(
            "Gather all required documentation before applying to streamline the process."
                .to_string(),
        );

        notes
    }

    /// Abbreviated catalog listing for program browsers
    pub fn programs(&self) -> Vec<&AssistanceProgram> {
        self.programs
            .iter()
            .map(|definition| &definition.program)
            .collect()
    }
}

impl Default for AssistanceMatcher {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insurance::InsuranceType;

    fn bill(patient_responsibility: f64) -> MedicalBill {
        MedicalBill {
            provider_name: "Hospital ABC".to_string(),
            service_date: None,
            total_amount: patient_responsibility * 2.0,
            patient_responsibility,
            insurance_paid: 0.0,
            insurance_adjustments: 0.0,
            service_codes: vec!["99213".to_string()],
            description: "Service".to_string(),
            is_itemized: true,
        }
    }

    fn private_insurance() -> InsuranceInfo {
        InsuranceInfo {
            insurance_type: InsuranceType::Private,
            provider_name: Some("Blue Cross".to_string()),
            plan_type: Some("PPO".to_string()),
            annual_deductible: 2_000.0,
            deductible_met: 500.0,
            annual_out_of_pocket_max: 6_000.0,
            out_of_pocket_met: 1_200.0,
            copay_amount: 30.0,
            coinsurance_rate: 0.2,
            coverage_percentage: 0.8,
        }
    }

    #[test]
    fn test_uninsured_low_income_matches_hospital_and_government() {
        let matcher = AssistanceMatcher::new();
        let insurance = InsuranceInfo::uninsured();
        let bills = vec![bill(5_000.0)];
        let context = AssistanceContext {
            insurance: &insurance,
            monthly_income: 1_500.0,
            household_size: 3,
            bills: &bills,
            hardship_level: Some(HardshipLevel::Severe),
            prescriptions: &[],
        };

        let matched = matcher.match_assistance(&context);

        assert!(!matched.programs.is_empty());
        assert!(matched
            .programs
            .iter()
            .any(|p| p.provider_type == ProviderType::Hospital));
        assert!(matched
            .programs
            .iter()
            .any(|p| p.provider_type == ProviderType::Government));

        // Hospital charity care outranks slower programs for the uninsured
        assert_eq!(matched.programs[0].provider_type, ProviderType::Hospital);
        assert_eq!(matched.recommended_programs.len(), 3);
        assert!(matched
            .additional_notes
            .iter()
            .any(|note| note.contains("Uninsured status")));
    }

    #[test]
    fn test_savings_never_exceed_outstanding_debt() {
        let matcher = AssistanceMatcher::new();
        let insurance = InsuranceInfo::uninsured();
        let bills = vec![bill(2_000.0)];
        let context = AssistanceContext {
            insurance: &insurance,
            monthly_income: 1_000.0,
            household_size: 4,
            bills: &bills,
            hardship_level: Some(HardshipLevel::Severe),
            prescriptions: &[],
        };

        let matched = matcher.match_assistance(&context);

        assert!(matched.total_potential_savings <= 2_000.0);
        assert!(matched.total_potential_savings > 0.0);
    }

    #[test]
    fn test_high_income_insured_matches_little() {
        let matcher = AssistanceMatcher::new();
        let insurance = private_insurance();
        let context = AssistanceContext {
            insurance: &insurance,
            monthly_income: 20_000.0,
            household_size: 1,
            bills: &[],
            hardship_level: None,
            prescriptions: &[],
        };

        let matched = matcher.match_assistance(&context);

        assert!(matched.programs.is_empty());
        assert_eq!(matched.total_potential_savings, 0.0);
        assert!(matched
            .additional_notes
            .iter()
            .any(|note| note.contains("No programs matched")));
    }

    #[test]
    fn test_prescriptions_surface_pharma_program() {
        let matcher = AssistanceMatcher::new();
        let insurance = private_insurance();
        let prescriptions = vec!["metformin".to_string()];
        let bills = vec![bill(1_500.0)];
        let context = AssistanceContext {
            insurance: &insurance,
            monthly_income: 3_000.0,
            household_size: 2,
            bills: &bills,
            hardship_level: Some(HardshipLevel::Moderate),
            prescriptions: &prescriptions,
        };

        let matched = matcher.match_assistance(&context);

        assert!(matched
            .programs
            .iter()
            .any(|p| p.provider_type == ProviderType::Pharmaceutical));
    }

    #[test]
    fn test_catalog_exposes_all_programs() {
        let matcher = AssistanceMatcher::new();
        assert_eq!(matcher.programs().len(), 8);
    }
}
