// 🛡️ Insurance Coverage Model
// Plan-level cost-sharing state (deductible, out-of-pocket, coinsurance)
// plus the coverage analyzer that turns it into gaps and recommendations.

use serde::{Deserialize, Serialize};

use crate::bills::MedicalBill;
use crate::entities::ActionPriority;

// ============================================================================
// INSURANCE TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceType {
    Private,
    Medicare,
    Medicaid,
    Va,
    Tricare,
    Uninsured,
}

impl InsuranceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsuranceType::Private => "private",
            InsuranceType::Medicare => "medicare",
            InsuranceType::Medicaid => "medicaid",
            InsuranceType::Va => "va",
            InsuranceType::Tricare => "tricare",
            InsuranceType::Uninsured => "uninsured",
        }
    }
}

/// Cost-sharing state for one plan year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceInfo {
    pub insurance_type: InsuranceType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_type: Option<String>,

    #[serde(default)]
    pub annual_deductible: f64,

    #[serde(default)]
    pub deductible_met: f64,

    #[serde(default)]
    pub annual_out_of_pocket_max: f64,

    #[serde(default)]
    pub out_of_pocket_met: f64,

    #[serde(default)]
    pub copay_amount: f64,

    /// Fraction of allowed charges the member pays after the deductible (0.0–1.0)
    #[serde(default)]
    pub coinsurance_rate: f64,

    /// Overall fraction of costs the plan has historically covered (0.0–1.0)
    #[serde(default)]
    pub coverage_percentage: f64,
}

impl InsuranceInfo {
    /// Plan with no coverage at all
    pub fn uninsured() -> Self {
        InsuranceInfo {
            insurance_type: InsuranceType::Uninsured,
            provider_name: None,
            plan_type: None,
            annual_deductible: 0.0,
            deductible_met: 0.0,
            annual_out_of_pocket_max: 0.0,
            out_of_pocket_met: 0.0,
            copay_amount: 0.0,
            coinsurance_rate: 0.0,
            coverage_percentage: 0.0,
        }
    }

    pub fn remaining_deductible(&self) -> f64 {
        (self.annual_deductible - self.deductible_met).max(0.0)
    }

    pub fn remaining_out_of_pocket(&self) -> f64 {
        (self.annual_out_of_pocket_max - self.out_of_pocket_met).max(0.0)
    }

    pub fn is_deductible_met(&self) -> bool {
        self.remaining_deductible() == 0.0
    }

    /// Percent of the deductible consumed; a plan without a deductible
    /// counts as fully met
    pub fn deductible_progress_percent(&self) -> f64 {
        if self.annual_deductible <= 0.0 {
            return 100.0;
        }
        self.deductible_met / self.annual_deductible * 100.0
    }

    pub fn out_of_pocket_progress_percent(&self) -> f64 {
        if self.annual_out_of_pocket_max <= 0.0 {
            return 0.0;
        }
        self.out_of_pocket_met / self.annual_out_of_pocket_max * 100.0
    }
}

// ============================================================================
// COVERAGE GAPS
// ============================================================================

/// A weakness in current coverage worth acting on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageGap {
    pub gap_type: GapType,
    pub description: String,
    pub impact: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapType {
    HighDeductible,
    DeductibleNotMet,
    NearMaxOutOfPocket,
    HighCoinsurance,
    OutOfNetworkUsage,
    LowCoverageRate,
    PotentialUncoveredCharges,
}

// ============================================================================
// ANALYSIS OUTPUT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStanding {
    Excellent,
    Developing,
    NearlyMaxed,
}

/// Progress against one annual limit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub annual: f64,
    pub met: f64,
    pub remaining: f64,
    pub progress_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageStatus {
    pub standing: CoverageStanding,
    pub deductible: ProgressSnapshot,
    pub out_of_pocket: ProgressSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UtilizationSummary {
    pub total_services: usize,
    pub total_billed: f64,
    pub insurance_paid: f64,
    pub patient_responsibility: f64,
    pub coverage_rate_percent: f64,
    pub out_of_network_count: usize,
    pub out_of_network_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationTip {
    pub category: &'static str,
    pub priority: ActionPriority,
    pub action: &'static str,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsuranceAnalysis {
    pub coverage_status: CoverageStatus,
    pub utilization: UtilizationSummary,
    pub coverage_gaps: Vec<CoverageGap>,
    pub optimization_recommendations: Vec<OptimizationTip>,
    pub summary: String,
}

// ============================================================================
// INSURANCE ANALYZER
// ============================================================================

/// Deterministic coverage review over a plan and its bill history
pub struct InsuranceAnalyzer;

impl InsuranceAnalyzer {
    pub fn new() -> Self {
        InsuranceAnalyzer
    }

    pub fn analyze(&self, insurance: &InsuranceInfo, bills: &[MedicalBill]) -> InsuranceAnalysis {
        let coverage_status = self.assess_coverage_status(insurance);
        let utilization = self.calculate_utilization(insurance, bills);
        let coverage_gaps = self.identify_gaps(insurance, bills);
        let optimization_recommendations = self.optimization_tips(insurance, &coverage_gaps);
        let summary = self.summarize(&coverage_status, &coverage_gaps);

        InsuranceAnalysis {
            coverage_status,
            utilization,
            coverage_gaps,
            optimization_recommendations,
            summary,
        }
    }

    fn assess_coverage_status(&self, insurance: &InsuranceInfo) -> CoverageStatus {
        let remaining_deductible = insurance.remaining_deductible();
        let remaining_oop = insurance.remaining_out_of_pocket();

        let mut standing = CoverageStanding::Excellent;
        if remaining_deductible > 0.0 {
            standing = CoverageStanding::Developing;
        }
        if remaining_oop > 0.0 && remaining_oop < 1_000.0 {
            standing = CoverageStanding::NearlyMaxed;
        }

        CoverageStatus {
            standing,
            deductible: ProgressSnapshot {
                annual: insurance.annual_deductible,
                met: insurance.deductible_met,
                remaining: remaining_deductible,
                progress_percent: round1(insurance.deductible_progress_percent()),
            },
            out_of_pocket: ProgressSnapshot {
                annual: insurance.annual_out_of_pocket_max,
                met: insurance.out_of_pocket_met,
                remaining: remaining_oop,
                progress_percent: round1(insurance.out_of_pocket_progress_percent()),
            },
        }
    }

    fn calculate_utilization(
        &self,
        insurance: &InsuranceInfo,
        bills: &[MedicalBill],
    ) -> UtilizationSummary {
        let total_billed: f64 = bills.iter().map(|b| b.total_amount).sum();
        let insurance_paid: f64 = bills.iter().map(|b| b.insurance_paid).sum();
        let patient_responsibility: f64 = bills.iter().map(|b| b.patient_responsibility).sum();

        let coverage_rate = if total_billed > 0.0 {
            insurance_paid / total_billed
        } else {
            0.0
        };

        let out_of_network: Vec<&MedicalBill> = self.out_of_network_bills(insurance, bills);

        UtilizationSummary {
            total_services: bills.len(),
            total_billed: round2(total_billed),
            insurance_paid: round2(insurance_paid),
            patient_responsibility: round2(patient_responsibility),
            coverage_rate_percent: round1(coverage_rate * 100.0),
            out_of_network_count: out_of_network.len(),
            out_of_network_amount: round2(
                out_of_network.iter().map(|b| b.patient_responsibility).sum(),
            ),
        }
    }

    fn identify_gaps(&self, insurance: &InsuranceInfo, bills: &[MedicalBill]) -> Vec<CoverageGap> {
        let mut gaps = Vec::new();

        let remaining_deductible = insurance.remaining_deductible();
        if remaining_deductible > 1_000.0 {
            gaps.push(CoverageGap {
                gap_type: GapType::HighDeductible,
                description: format!("High deductible remaining: ${:.2}", remaining_deductible),
                impact: "Full charges apply until deductible is met".to_string(),
                recommendation:
                    "Consider health savings account (HSA) contributions and defer non-urgent care"
                        .to_string(),
            });
        }

        let remaining_oop = insurance.remaining_out_of_pocket();
        if remaining_oop > 0.0 && insurance.out_of_pocket_met > 0.0 {
            let oop_percent = insurance.out_of_pocket_progress_percent();
            if oop_percent > 80.0 {
                gaps.push(CoverageGap {
                    gap_type: GapType::NearMaxOutOfPocket,
                    description: format!(
                        "Out-of-pocket max nearly reached: ${:.2} remaining",
                        remaining_oop
                    ),
                    impact: "Most services will be covered after reaching max".to_string(),
                    recommendation:
                        "Schedule necessary procedures now to maximize coverage benefits"
                            .to_string(),
                });
            }
        }

        if insurance.coinsurance_rate > 0.30 {
            gaps.push(CoverageGap {
                gap_type: GapType::HighCoinsurance,
                description: format!(
                    "High coinsurance rate: {:.0}%",
                    insurance.coinsurance_rate * 100.0
                ),
                impact: "You pay a large percentage of costs after deductible".to_string(),
                recommendation: "Review plan options and consider supplemental insurance"
                    .to_string(),
            });
        }

        let out_of_network = self.out_of_network_bills(insurance, bills);
        if !out_of_network.is_empty() {
            gaps.push(CoverageGap {
                gap_type: GapType::OutOfNetworkUsage,
                description: format!(
                    "{} potential out-of-network charges detected",
                    out_of_network.len()
                ),
                impact: "Higher costs due to out-of-network penalties".to_string(),
                recommendation:
                    "Verify network status of all providers and request in-network alternatives"
                        .to_string(),
            });
        }

        if insurance.coverage_percentage < 0.70 {
            gaps.push(CoverageGap {
                gap_type: GapType::LowCoverageRate,
                description: format!(
                    "Low overall coverage: {:.0}%",
                    insurance.coverage_percentage * 100.0
                ),
                impact: "You may have significant out-of-pocket costs".to_string(),
                recommendation: "Consider plan changes during next enrollment period".to_string(),
            });
        }

        gaps
    }

    /// Bills where nothing was paid or adjusted despite active coverage
    fn out_of_network_bills<'a>(
        &self,
        insurance: &InsuranceInfo,
        bills: &'a [MedicalBill],
    ) -> Vec<&'a MedicalBill> {
        if insurance.insurance_type == InsuranceType::Uninsured {
            return Vec::new();
        }

        bills
            .iter()
            .filter(|bill| {
                bill.insurance_paid == 0.0
                    && bill.insurance_adjustments == 0.0
                    && bill.total_amount > 0.0
                    && bill.patient_responsibility == bill.total_amount
            })
            .collect()
    }

    fn optimization_tips(
        &self,
        insurance: &InsuranceInfo,
        gaps: &[CoverageGap],
    ) -> Vec<OptimizationTip> {
        let mut tips = Vec::new();

        let remaining_deductible = insurance.remaining_deductible();
        if remaining_deductible > 0.0 && remaining_deductible < 500.0 {
            tips.push(OptimizationTip {
                category: "timing",
                priority: ActionPriority::High,
                action: "Schedule necessary services soon",
                description: format!(
                    "Only ${:.2} remaining on deductible. Schedule needed procedures before year-end to maximize coverage.",
                    remaining_deductible
                ),
            });
        }

        let remaining_oop = insurance.remaining_out_of_pocket();
        if remaining_oop > 0.0 && remaining_oop < 2_000.0 {
            tips.push(OptimizationTip {
                category: "timing",
                priority: ActionPriority::High,
                action: "Maximize benefits before year-end",
                description: format!(
                    "Out-of-pocket max nearly reached (${:.2} remaining). Schedule major procedures now.",
                    remaining_oop
                ),
            });
        }

        if remaining_deductible > 2_000.0 {
            tips.push(OptimizationTip {
                category: "planning",
                priority: ActionPriority::Medium,
                action: "Defer non-urgent care",
                description:
                    "Consider deferring elective procedures until deductible is met or new plan year begins."
                        .to_string(),
            });
        }

        if insurance.insurance_type != InsuranceType::Uninsured && insurance.coinsurance_rate > 0.25
        {
            tips.push(OptimizationTip {
                category: "coverage",
                priority: ActionPriority::Medium,
                action: "Review plan options",
                description:
                    "High coinsurance rates may indicate you could benefit from a plan with lower cost-sharing."
                        .to_string(),
            });
        }

        if gaps.iter().any(|gap| gap.gap_type == GapType::OutOfNetworkUsage) {
            tips.push(OptimizationTip {
                category: "network",
                priority: ActionPriority::High,
                action: "Verify provider network status",
                description:
                    "Check if out-of-network charges can be appealed or if in-network alternatives exist."
                        .to_string(),
            });
        }

        tips.push(OptimizationTip {
            category: "general",
            priority: ActionPriority::Low,
            action: "Track all medical expenses",
            description:
                "Maintain records for tax deductions and to monitor benefit utilization.".to_string(),
        });

        tips
    }

    fn summarize(&self, status: &CoverageStatus, gaps: &[CoverageGap]) -> String {
        let standing = match status.standing {
            CoverageStanding::Excellent => "excellent",
            CoverageStanding::Developing => "developing",
            CoverageStanding::NearlyMaxed => "nearly maxed",
        };

        let mut summary = format!("Your insurance coverage status is {}. ", standing);

        if status.deductible.remaining > 0.0 {
            summary.push_str(&format!(
                "You have ${:.2} remaining on your deductible. ",
                status.deductible.remaining
            ));
        } else {
            summary.push_str("Your deductible has been met. ");
        }

        if status.out_of_pocket.remaining > 0.0 {
            summary.push_str(&format!(
                "${:.2} remains until reaching your out-of-pocket maximum. ",
                status.out_of_pocket.remaining
            ));
        } else {
            summary.push_str("You've reached your out-of-pocket maximum for the year. ");
        }

        if gaps.is_empty() {
            summary.push_str("Your coverage appears well-optimized.");
        } else {
            summary.push_str(&format!(
                "{} coverage gap(s) identified that could be optimized.",
                gaps.len()
            ));
        }

        summary
    }
}

impl Default for InsuranceAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

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

    fn unpaid_bill(total: f64) -> MedicalBill {
        MedicalBill {
            provider_name: "Hospital ABC".to_string(),
            service_date: None,
            total_amount: total,
            patient_responsibility: total,
            insurance_paid: 0.0,
            insurance_adjustments: 0.0,
            service_codes: vec!["99213".to_string()],
            description: "Office visit".to_string(),
            is_itemized: true,
        }
    }

    #[test]
    fn test_progress_helpers() {
        let insurance = sample_insurance();

        assert_eq!(insurance.remaining_deductible(), 1_500.0);
        assert_eq!(insurance.remaining_out_of_pocket(), 4_800.0);
        assert_eq!(insurance.deductible_progress_percent(), 25.0);
        assert_eq!(insurance.out_of_pocket_progress_percent(), 20.0);
        assert!(!insurance.is_deductible_met());
    }

    #[test]
    fn test_no_deductible_counts_as_met() {
        let mut insurance = sample_insurance();
        insurance.annual_deductible = 0.0;
        insurance.deductible_met = 0.0;

        assert!(insurance.is_deductible_met());
        assert_eq!(insurance.deductible_progress_percent(), 100.0);
    }

    #[test]
    fn test_standing_reflects_deductible_and_oop() {
        let analyzer = InsuranceAnalyzer::new();

        let developing = analyzer.analyze(&sample_insurance(), &[]);
        assert_eq!(
            developing.coverage_status.standing,
            CoverageStanding::Developing
        );

        let mut nearly_maxed = sample_insurance();
        nearly_maxed.deductible_met = 2_000.0;
        nearly_maxed.out_of_pocket_met = 5_500.0;
        let analysis = analyzer.analyze(&nearly_maxed, &[]);
        assert_eq!(
            analysis.coverage_status.standing,
            CoverageStanding::NearlyMaxed
        );
    }

    #[test]
    fn test_high_deductible_gap_detected() {
        let analyzer = InsuranceAnalyzer::new();
        let analysis = analyzer.analyze(&sample_insurance(), &[]);

        assert!(analysis
            .coverage_gaps
            .iter()
            .any(|gap| gap.gap_type == GapType::HighDeductible));
    }

    #[test]
    fn test_out_of_network_detection_skips_uninsured() {
        let analyzer = InsuranceAnalyzer::new();
        let bills = vec![unpaid_bill(400.0)];

        let insured = analyzer.analyze(&sample_insurance(), &bills);
        assert_eq!(insured.utilization.out_of_network_count, 1);
        assert!(insured
            .coverage_gaps
            .iter()
            .any(|gap| gap.gap_type == GapType::OutOfNetworkUsage));

        let uninsured = analyzer.analyze(&InsuranceInfo::uninsured(), &bills);
        assert_eq!(uninsured.utilization.out_of_network_count, 0);
    }

    #[test]
    fn test_utilization_rates() {
        let analyzer = InsuranceAnalyzer::new();
        let bills = vec![
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
        ];

        let analysis = analyzer.analyze(&sample_insurance(), &bills);

        assert_eq!(analysis.utilization.total_services, 2);
        assert_eq!(analysis.utilization.total_billed, 6_000.0);
        assert_eq!(analysis.utilization.insurance_paid, 2_900.0);
        assert_eq!(analysis.utilization.coverage_rate_percent, 48.3);
    }

    #[test]
    fn test_summary_mentions_gap_count() {
        let analyzer = InsuranceAnalyzer::new();
        let analysis = analyzer.analyze(&sample_insurance(), &[]);

        assert!(analysis.summary.contains("coverage gap"));
        assert!(analysis.summary.contains("$1500.00"));
    }
}
