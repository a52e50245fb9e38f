// 🧭 Financial Navigation Planner
// Turns a pile of bills plus coverage and income into a risk assessment,
// coverage gaps, and a prioritized action plan.

use serde::{Deserialize, Serialize};

use crate::bills::MedicalBill;
use crate::insurance::{CoverageGap, GapType, InsuranceInfo, InsuranceType};

// ============================================================================
// RISK / HARDSHIP LEVELS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardshipLevel {
    None,
    Mild,
    Moderate,
    Severe,
}

impl HardshipLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            HardshipLevel::None => "none",
            HardshipLevel::Mild => "mild",
            HardshipLevel::Moderate => "moderate",
            HardshipLevel::Severe => "severe",
        }
    }
}

/// 2024 federal poverty level by household size (contiguous US)
pub fn federal_poverty_level(household_size: u32) -> f64 {
    match household_size {
        0 | 1 => 15_180.0,
        2 => 20_440.0,
        3 => 25_700.0,
        4 => 30_960.0,
        5 => 36_220.0,
        6 => 41_480.0,
        7 => 46_740.0,
        8 => 52_000.0,
        more => 52_000.0 + (more - 8) as f64 * 5_260.0,
    }
}

// ============================================================================
// PLAN TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    BillReview,
    Assistance,
    Insurance,
    PaymentPlanning,
    ProfessionalHelp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionItem {
    /// 1 = do first
    pub priority: u32,
    pub action: &'static str,
    pub category: ActionCategory,
    pub estimated_savings: Option<f64>,
    pub estimated_timeframe: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationPlan {
    pub risk_level: RiskLevel,
    pub hardship_level: HardshipLevel,
    pub total_medical_debt: f64,
    pub debt_to_income_ratio: f64,
    pub coverage_gaps: Vec<CoverageGap>,
    pub action_plan: Vec<ActionItem>,
    pub estimated_total_savings: f64,
    pub recommended_timeline: &'static str,
    pub summary: String,
}

/// Lightweight first-look assessment without the full plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SituationAnalysis {
    pub risk_level: RiskLevel,
    pub hardship_level: HardshipLevel,
    pub total_medical_debt: f64,
    pub debt_to_income_ratio: f64,
    pub monthly_income: f64,
    pub household_size: u32,
    pub recommendations: Vec<&'static str>,
    pub next_steps: Vec<&'static str>,
}

// ============================================================================
// NAVIGATION ENGINE
// ============================================================================

/// Debt-to-income thresholds for the risk ladder
const RISK_MEDIUM: f64 = 0.15;
const RISK_HIGH: f64 = 0.30;
const RISK_CRITICAL: f64 = 0.50;

/// FPL-ratio thresholds for the hardship ladder
const HARDSHIP_SEVERE: f64 = 1.5;
const HARDSHIP_MODERATE: f64 = 2.5;
const HARDSHIP_MILD: f64 = 4.0;

pub struct NavigationEngine;

impl NavigationEngine {
    pub fn new() -> Self {
        NavigationEngine
    }

    pub fn create_plan(
        &self,
        bills: &[MedicalBill],
        insurance: &InsuranceInfo,
        monthly_income: f64,
        household_size: u32,
    ) -> NavigationPlan {
        let total_debt = total_medical_debt(bills);
        let debt_to_income = debt_to_income_ratio(total_debt, monthly_income);

        let risk_level = self.assess_risk_level(debt_to_income);
        let hardship_level = self.assess_hardship_level(monthly_income, household_size);

        let coverage_gaps = self.identify_coverage_gaps(insurance, bills);
        let action_plan = self.build_action_plan(risk_level, hardship_level, total_debt);

        let estimated_total_savings = action_plan
            .iter()
            .filter_map(|item| item.estimated_savings)
            .sum();

        NavigationPlan {
            risk_level,
            hardship_level,
            total_medical_debt: total_debt,
            debt_to_income_ratio: debt_to_income,
            coverage_gaps,
            action_plan,
            estimated_total_savings,
            recommended_timeline: timeline(risk_level),
            summary: self.summarize(risk_level, hardship_level, total_debt, estimated_total_savings),
        }
    }

    pub fn analyze_situation(
        &self,
        bills: &[MedicalBill],
        monthly_income: f64,
        household_size: u32,
    ) -> SituationAnalysis {
        let total_debt = total_medical_debt(bills);
        let debt_to_income = debt_to_income_ratio(total_debt, monthly_income);
        let risk_level = self.assess_risk_level(debt_to_income);
        let hardship_level = self.assess_hardship_level(monthly_income, household_size);

        SituationAnalysis {
            risk_level,
            hardship_level,
            total_medical_debt: total_debt,
            debt_to_income_ratio: debt_to_income,
            monthly_income,
            household_size,
            recommendations: immediate_recommendations(risk_level, hardship_level),
            next_steps: next_steps(risk_level),
        }
    }

    fn assess_risk_level(&self, debt_to_income: f64) -> RiskLevel {
        if debt_to_income >= RISK_CRITICAL {
            RiskLevel::Critical
        } else if debt_to_income >= RISK_HIGH {
            RiskLevel::High
        } else if debt_to_income >= RISK_MEDIUM {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    fn assess_hardship_level(&self, monthly_income: f64, household_size: u32) -> HardshipLevel {
        let annual_income = monthly_income * 12.0;
        let fpl = federal_poverty_level(household_size);
        let income_ratio = if fpl > 0.0 { annual_income / fpl } else { 0.0 };

        if income_ratio <= HARDSHIP_SEVERE {
            HardshipLevel::Severe
        } else if income_ratio <= HARDSHIP_MODERATE {
            HardshipLevel::Moderate
        } else if income_ratio <= HARDSHIP_MILD {
            HardshipLevel::Mild
        } else {
            HardshipLevel::None
        }
    }

    fn identify_coverage_gaps(
        &self,
        insurance: &InsuranceInfo,
        bills: &[MedicalBill],
    ) -> Vec<CoverageGap> {
        let mut gaps = Vec::new();

        let remaining_deductible = insurance.remaining_deductible();
        if remaining_deductible > 0.0 {
            gaps.push(CoverageGap {
                gap_type: GapType::DeductibleNotMet,
                description: format!("Deductible not met: ${:.2} remaining", remaining_deductible),
                impact: "Full charges apply until deductible is met".to_string(),
                recommendation:
                    "Consider deferring non-urgent care until deductible is met or explore payment assistance"
                        .to_string(),
            });
        }

        let remaining_oop = insurance.remaining_out_of_pocket();
        if remaining_oop > 0.0 && insurance.out_of_pocket_met > 0.0 {
            let progress_percent = insurance.out_of_pocket_progress_percent();
            if progress_percent > 80.0 {
                gaps.push(CoverageGap {
                    gap_type: GapType::NearMaxOutOfPocket,
                    description: format!(
                        "Out-of-pocket max nearly reached: ${:.2} remaining",
                        remaining_oop
                    ),
                    impact: "Most services will be covered after reaching max".to_string(),
                    recommendation: "Schedule necessary procedures now to maximize coverage"
                        .to_string(),
                });
            }
        }

        let uncovered_count = bills
            .iter()
            .filter(|bill| bill.insurance_paid == 0.0 && bill.insurance_adjustments == 0.0)
            .count();
        if uncovered_count > 0 && insurance.insurance_type != InsuranceType::Uninsured {
            gaps.push(CoverageGap {
                gap_type: GapType::PotentialUncoveredCharges,
                description: format!(
                    "{} bill(s) with no insurance payment recorded",
                    uncovered_count
                ),
                impact: "May indicate out-of-network services or coverage issues".to_string(),
                recommendation: "Review bills for out-of-network charges and verify coverage"
                    .to_string(),
            });
        }

        gaps
    }

    fn build_action_plan(
        &self,
        risk_level: RiskLevel,
        hardship_level: HardshipLevel,
        total_debt: f64,
    ) -> Vec<ActionItem> {
        let mut actions = Vec::new();
        let mut priority = 1;

        actions.push(ActionItem {
            priority,
            action: "Request itemized bills for all charges",
            category: ActionCategory::BillReview,
            estimated_savings: Some(total_debt * 0.05),
            estimated_timeframe: "1-2 weeks",
            description: "Itemized bills reveal errors and overcharges that can be disputed",
        });
        priority += 1;

        actions.push(ActionItem {
            priority,
            action: "Apply for hospital charity care or financial assistance",
            category: ActionCategory::Assistance,
            estimated_savings: if hardship_level != HardshipLevel::None {
                Some(total_debt * 0.40)
            } else {
                Some(0.0)
            },
            estimated_timeframe: "2-4 weeks",
            description: "Hospitals are required to offer financial assistance programs",
        });
        priority += 1;

        actions.push(ActionItem {
            priority,
            action: "Review insurance coverage for all bills",
            category: ActionCategory::Insurance,
            estimated_savings: Some(total_debt * 0.15),
            estimated_timeframe: "2-3 weeks",
            description: "Check for out-of-network charges and coverage denials that can be appealed",
        });
        priority += 1;

        actions.push(ActionItem {
            priority,
            action: "Negotiate payment plan with providers",
            category: ActionCategory::PaymentPlanning,
            estimated_savings: Some(total_debt * 0.10),
            estimated_timeframe: "1-2 weeks",
            description: "Many providers offer interest-free payment plans with flexible terms",
        });
        priority += 1;

        if matches!(risk_level, RiskLevel::High | RiskLevel::Critical) {
            actions.push(ActionItem {
                priority,
                action: "Consult with medical billing advocate",
                category: ActionCategory::ProfessionalHelp,
                estimated_savings: Some(total_debt * 0.20),
                estimated_timeframe: "2-4 weeks",
                description: "Professional advocates can negotiate significant reductions",
            });
            priority += 1;
        }

        actions.push(ActionItem {
            priority,
            action: "Explore government assistance programs",
            category: ActionCategory::Assistance,
            estimated_savings: if hardship_level == HardshipLevel::Severe {
                Some(total_debt * 0.25)
            } else {
                Some(0.0)
            },
            estimated_timeframe: "4-8 weeks",
            description: "Medicaid, CHIP, and other programs may cover past medical expenses",
        });

        actions
    }

    fn summarize(
        &self,
        risk_level: RiskLevel,
        hardship_level: HardshipLevel,
        total_debt: f64,
        estimated_savings: f64,
    ) -> String {
        let risk_verb = match risk_level {
            RiskLevel::Low => "manageable",
            RiskLevel::Medium => "requires attention",
            RiskLevel::High => "serious concern",
            RiskLevel::Critical => "urgent action needed",
        };

        format!(
            "Your medical debt situation is {} with a total of ${:.2} in debt. \
             Based on your hardship level ({}), you may be eligible for assistance programs \
             that could save an estimated ${:.2}. Follow the action plan to reduce your \
             financial burden systematically.",
            risk_verb,
            total_debt,
            hardship_level.as_str(),
            estimated_savings
        )
    }
}

impl Default for NavigationEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// HELPERS
// ============================================================================

pub fn total_medical_debt(bills: &[MedicalBill]) -> f64 {
    bills.iter().map(|bill| bill.patient_responsibility).sum()
}

/// Debt as a fraction of annual income, rounded to four places.
/// Zero income counts as fully indebted.
pub fn debt_to_income_ratio(debt: f64, monthly_income: f64) -> f64 {
    if monthly_income == 0.0 {
        return 1.0;
    }
    let annual_income = monthly_income * 12.0;
    (debt / annual_income * 10_000.0).round() / 10_000.0
}

fn timeline(risk_level: RiskLevel) -> &'static str {
    match risk_level {
        RiskLevel::Critical => "Immediate action required within 30 days",
        RiskLevel::High => "High-priority actions within 60 days, remainder within 90 days",
        RiskLevel::Medium => "Complete within 3-6 months",
        RiskLevel::Low => "Complete within 6-12 months",
    }
}

fn immediate_recommendations(
    risk_level: RiskLevel,
    hardship_level: HardshipLevel,
) -> Vec<&'static str> {
    let mut recommendations = Vec::new();

    if matches!(risk_level, RiskLevel::High | RiskLevel::Critical) {
        recommendations.push("Contact providers immediately to pause collection efforts");
        recommendations.push("Apply for hospital financial assistance programs");
    }

    if matches!(hardship_level, HardshipLevel::Moderate | HardshipLevel::Severe) {
        recommendations.push("You likely qualify for charity care programs");
        recommendations.push("Consider Medicaid enrollment if eligible");
    }

    recommendations.push("Request itemized bills for all charges");
    recommendations
}

fn next_steps(risk_level: RiskLevel) -> Vec<&'static str> {
    match risk_level {
        RiskLevel::Critical => vec![
            "1. Contact hospital billing department immediately",
            "2. Request charity care application",
            "3. Provide income documentation",
            "4. Review all bills for errors",
            "5. Negotiate payment terms",
        ],
        RiskLevel::High => vec![
            "1. Gather all medical bills",
            "2. Request itemized statements",
            "3. Apply for financial assistance",
            "4. Review insurance coverage",
            "5. Set up payment plans",
        ],
        _ => vec![
            "1. Review your current medical expenses",
            "2. Check insurance benefits",
            "3. Look for savings opportunities",
            "4. Plan for future healthcare costs",
        ],
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insurance::InsuranceType;

    fn sample_insurance() -> InsuranceInfo {
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

    fn sample_bills() -> Vec<MedicalBill> {
        vec![
            MedicalBill {
                provider_name: "Hospital ABC".to_string(),
                service_date: None,
                total_amount: 5_000.0,
                patient_responsibility: 2_000.0,
                insurance_paid: 2_500.0,
                insurance_adjustments: 500.0,
                service_codes: vec!["99213".to_string(), "80053".to_string()],
                description: "Office visit and lab work".to_string(),
                is_itemized: true,
            },
            MedicalBill {
                provider_name: "Clinic XYZ".to_string(),
                service_date: None,
                total_amount: 1_000.0,
                patient_responsibility: 500.0,
                insurance_paid: 400.0,
                insurance_adjustments: 100.0,
                service_codes: vec!["99214".to_string()],
                description: "Specialist visit".to_string(),
                is_itemized: false,
            },
        ]
    }

    #[test]
    fn test_total_medical_debt() {
        assert_eq!(total_medical_debt(&sample_bills()), 2_500.0);
    }

    #[test]
    fn test_debt_to_income_ratio_rounds_to_four_places() {
        assert_eq!(debt_to_income_ratio(2_500.0, 5_000.0), 0.0417);
        assert_eq!(debt_to_income_ratio(2_500.0, 0.0), 1.0);
    }

    #[test]
    fn test_risk_ladder() {
        let engine = NavigationEngine::new();

        assert_eq!(engine.assess_risk_level(0.04), RiskLevel::Low);
        assert_eq!(engine.assess_risk_level(0.20), RiskLevel::Medium);
        assert_eq!(engine.assess_risk_level(0.33), RiskLevel::High);
        assert_eq!(engine.assess_risk_level(0.60), RiskLevel::Critical);
    }

    #[test]
    fn test_hardship_ladder_against_fpl() {
        let engine = NavigationEngine::new();

        // 1000/month for a household of 4: 12000 annual vs 30960 FPL → severe
        assert_eq!(engine.assess_hardship_level(1_000.0, 4), HardshipLevel::Severe);
        // 5000/month, household of 2: ratio ≈ 2.94 → mild
        assert_eq!(engine.assess_hardship_level(5_000.0, 2), HardshipLevel::Mild);
        // 10000/month, household of 1: well above 4x FPL → none
        assert_eq!(engine.assess_hardship_level(10_000.0, 1), HardshipLevel::None);
    }

    #[test]
    fn test_fpl_extends_beyond_table() {
        assert_eq!(federal_poverty_level(8), 52_000.0);
        assert_eq!(federal_poverty_level(10), 52_000.0 + 2.0 * 5_260.0);
    }

    #[test]
    fn test_plan_includes_advocate_only_at_high_risk() {
        let engine = NavigationEngine::new();
        let insurance = sample_insurance();

        let low = engine.create_plan(&sample_bills(), &insurance, 10_000.0, 1);
        assert_eq!(low.risk_level, RiskLevel::Low);
        assert!(!low
            .action_plan
            .iter()
            .any(|a| a.category == ActionCategory::ProfessionalHelp));

        // 2500 debt against 400/month → critical
        let critical = engine.create_plan(&sample_bills(), &insurance, 400.0, 4);
        assert_eq!(critical.risk_level, RiskLevel::Critical);
        assert!(critical
            .action_plan
            .iter()
            .any(|a| a.category == ActionCategory::ProfessionalHelp));

        // Priorities are consecutive starting at 1
        for (index, item) in critical.action_plan.iter().enumerate() {
            assert_eq!(item.priority, index as u32 + 1);
        }
    }

    #[test]
    fn test_plan_reports_deductible_gap() {
        let engine = NavigationEngine::new();
        let plan = engine.create_plan(&sample_bills(), &sample_insurance(), 5_000.0, 3);

        assert!(plan
            .coverage_gaps
            .iter()
            .any(|gap| gap.gap_type == GapType::DeductibleNotMet));
        assert!(plan.summary.contains("$2500.00"));
    }

    #[test]
    fn test_situation_analysis_recommendations() {
        let engine = NavigationEngine::new();

        let analysis = engine.analyze_situation(&sample_bills(), 400.0, 4);

        assert_eq!(analysis.risk_level, RiskLevel::Critical);
        assert_eq!(analysis.hardship_level, HardshipLevel::Severe);
        assert!(analysis
            .recommendations
            .contains(&"Contact providers immediately to pause collection efforts"));
        assert_eq!(analysis.next_steps.len(), 5);
    }
}
