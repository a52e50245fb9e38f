// 💵 Procedure Cost Estimator
// Catalog-driven estimates with regional multipliers, emergency and
// out-of-network adjustments, and the deductible/coinsurance breakdown.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::insurance::InsuranceInfo;

// ============================================================================
// SERVICE CATALOG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// CPT/HCPCS code ("N/A" for non-coded services)
    pub code: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub base_cost: f64,
    pub description: &'static str,
}

fn service_catalog() -> HashMap<&'static str, ServiceInfo> {
    HashMap::from([
        (
            "office_visit",
            ServiceInfo {
                code: "99213",
                name: "Office Visit - Level 3",
                category: "primary_care",
                base_cost: 150.0,
                description: "Standard office visit for established patient",
            },
        ),
        (
            "emergency_room",
            ServiceInfo {
                code: "99281",
                name: "Emergency Room Visit - Level 1",
                category: "emergency",
                base_cost: 500.0,
                description: "Emergency department visit for minor issues",
            },
        ),
        (
            "mri_scan",
            ServiceInfo {
                code: "70551",
                name: "MRI Brain without Contrast",
                category: "imaging",
                base_cost: 1_200.0,
                description: "Magnetic resonance imaging of brain",
            },
        ),
        (
            "ct_scan",
            ServiceInfo {
                code: "71250",
                name: "CT Scan Chest without Contrast",
                category: "imaging",
                base_cost: 700.0,
                description: "Computed tomography of chest",
            },
        ),
        (
            "lab_work",
            ServiceInfo {
                code: "80053",
                name: "Comprehensive Metabolic Panel",
                category: "laboratory",
                base_cost: 45.0,
                description: "Blood panel covering 14 tests",
            },
        ),
        (
            "surgery_minor",
            ServiceInfo {
                code: "12001",
                name: "Simple Repair of Skin Wounds",
                category: "surgery",
                base_cost: 400.0,
                description: "Minor surgical procedure",
            },
        ),
        (
            "colonoscopy",
            ServiceInfo {
                code: "45378",
                name: "Colonoscopy with Biopsy",
                category: "procedure",
                base_cost: 2_500.0,
                description: "Diagnostic colonoscopy procedure",
            },
        ),
        (
            "physical_therapy",
            ServiceInfo {
                code: "97110",
                name: "Therapeutic Exercise",
                category: "therapy",
                base_cost: 85.0,
                description: "Physical therapy session",
            },
        ),
        (
            "specialist_visit",
            ServiceInfo {
                code: "99214",
                name: "Specialist Visit - Level 4",
                category: "specialist",
                base_cost: 250.0,
                description: "Visit with medical specialist",
            },
        ),
        (
            "prescription_generic",
            ServiceInfo {
                code: "N/A",
                name: "Generic Prescription Medication",
                category: "pharmacy",
                base_cost: 30.0,
                description: "Standard generic medication",
            },
        ),
    ])
}

// ============================================================================
// ESTIMATE OUTPUT
// ============================================================================

/// Split of one charge between member and plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageBreakdown {
    pub patient_responsibility: f64,
    pub insurance_paid: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alternative {
    pub kind: &'static str,
    pub estimated_cost: f64,
    pub description: &'static str,
    pub savings: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEstimate {
    pub service_name: &'static str,
    pub base_cost: f64,

    /// (low, high) around the adjusted cost
    pub estimated_range: (f64, f64),

    pub location_multiplier: f64,
    pub with_insurance: f64,
    pub out_of_pocket: f64,
    pub alternatives: Vec<Alternative>,
}

// ============================================================================
// COST ESTIMATOR
// ============================================================================

pub struct CostEstimator {
    services: HashMap<&'static str, ServiceInfo>,
}

impl CostEstimator {
    pub fn new() -> Self {
        CostEstimator {
            services: service_catalog(),
        }
    }

    /// Estimate the cost of a catalog service; `None` for an unknown key
    pub fn estimate(
        &self,
        service_key: &str,
        insurance: &InsuranceInfo,
        location: &str,
        is_emergency: bool,
        in_network: bool,
    ) -> Option<CostEstimate> {
        let service = self.services.get(service_key)?;

        let base_cost = service.base_cost;
        let location_multiplier = location_multiplier(location);
        let mut adjusted_cost = base_cost * location_multiplier;

        // Non-emergency services delivered through the ER roughly double
        if is_emergency && service.category != "emergency" {
            adjusted_cost *= 2.0;
        }
        if !in_network {
            adjusted_cost *= 1.5;
        }

        let estimated_range = (round2(adjusted_cost * 0.85), round2(adjusted_cost * 1.15));

        let breakdown = Self::coverage_breakdown(adjusted_cost, insurance);

        Some(CostEstimate {
            service_name: service.name,
            base_cost: round2(base_cost),
            estimated_range,
            location_multiplier,
            with_insurance: round2(breakdown.total_cost),
            out_of_pocket: round2(breakdown.patient_responsibility),
            alternatives: self.alternatives(service_key),
        })
    }

    /// Apply remaining deductible, then coinsurance capped by the remaining
    /// out-of-pocket room; whatever is left is the plan's share
    pub fn coverage_breakdown(cost: f64, insurance: &InsuranceInfo) -> CoverageBreakdown {
        let remaining_deductible = insurance.annual_deductible - insurance.deductible_met;
        let remaining_oop = insurance.annual_out_of_pocket_max - insurance.out_of_pocket_met;

        let mut remaining_cost = cost;
        let mut patient_responsibility = 0.0;

        if remaining_deductible > 0.0 {
            let deductible_amount = remaining_cost.min(remaining_deductible);
            patient_responsibility += deductible_amount;
            remaining_cost -= deductible_amount;
        }

        if remaining_cost > 0.0 && insurance.coinsurance_rate > 0.0 {
            let coinsurance_amount = remaining_cost * insurance.coinsurance_rate;
            let max_coinsurance = (remaining_oop - patient_responsibility).max(0.0);
            let coinsurance_to_pay = coinsurance_amount.min(max_coinsurance);
            patient_responsibility += coinsurance_to_pay;
            remaining_cost -= coinsurance_to_pay;
        }

        CoverageBreakdown {
            patient_responsibility,
            insurance_paid: remaining_cost,
            total_cost: patient_responsibility + remaining_cost,
        }
    }

    fn alternatives(&self, service_key: &str) -> Vec<Alternative> {
        let mut alternatives = Vec::new();

        match service_key {
            "emergency_room" => {
                if let Some(office_visit) = self.services.get("office_visit") {
                    alternatives.push(Alternative {
                        kind: "Urgent Care",
                        estimated_cost: office_visit.base_cost * 1.5,
                        description: "Consider urgent care for non-life-threatening issues",
                        savings: "60-80%",
                    });
                }
            }
            "mri_scan" => {
                if let Some(ct_scan) = self.services.get("ct_scan") {
                    alternatives.push(Alternative {
                        kind: "CT Scan",
                        estimated_cost: ct_scan.base_cost,
                        description: "Ask if CT scan could be sufficient for diagnosis",
                        savings: "40-50%",
                    });
                }
            }
            "colonoscopy" => {
                alternatives.push(Alternative {
                    kind: "At-home Screening",
                    estimated_cost: 150.0,
                    description: "Cologuard or FIT test for routine screening",
                    savings: "90-95%",
                });
            }
            _ => {}
        }

        alternatives
    }

    /// Catalog listing for service pickers
    pub fn available_services(&self) -> Vec<(&'static str, &ServiceInfo)> {
        let mut services: Vec<_> = self
            .services
            .iter()
            .map(|(key, info)| (*key, info))
            .collect();
        services.sort_by_key(|(key, _)| *key);
        services
    }
}

impl Default for CostEstimator {
    fn default() -> Self {
        Self::new()
    }
}

fn location_multiplier(location: &str) -> f64 {
    match location.to_lowercase().as_str() {
        "northeast" => 1.25,
        "west" => 1.20,
        "midwest" => 0.95,
        "south" => 0.90,
        _ => 1.0,
    }
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

    #[test]
    fn test_estimate_basic_office_visit() {
        let estimator = CostEstimator::new();
        let estimate = estimator
            .estimate("office_visit", &sample_insurance(), "midwest", false, true)
            .unwrap();

        assert_eq!(estimate.service_name, "Office Visit - Level 3");
        assert_eq!(estimate.base_cost, 150.0);
        assert_eq!(estimate.location_multiplier, 0.95);
        assert!(estimate.with_insurance >= 0.0);
        assert!(estimate.out_of_pocket >= 0.0);
    }

    #[test]
    fn test_unknown_service_is_rejected() {
        let estimator = CostEstimator::new();
        assert!(estimator
            .estimate("quantum_scan", &sample_insurance(), "midwest", false, true)
            .is_none());
    }

    #[test]
    fn test_location_multipliers_ordered() {
        let estimator = CostEstimator::new();
        let insurance = sample_insurance();

        let northeast = estimator
            .estimate("office_visit", &insurance, "northeast", false, true)
            .unwrap();
        let south = estimator
            .estimate("office_visit", &insurance, "south", false, true)
            .unwrap();

        assert!(northeast.location_multiplier > south.location_multiplier);
        assert!(northeast.estimated_range.0 > south.estimated_range.0);
    }

    #[test]
    fn test_emergency_doubles_non_emergency_services() {
        let estimator = CostEstimator::new();
        let insurance = sample_insurance();

        let routine = estimator
            .estimate("office_visit", &insurance, "midwest", false, true)
            .unwrap();
        let emergency = estimator
            .estimate("office_visit", &insurance, "midwest", true, true)
            .unwrap();

        assert_eq!(emergency.estimated_range.1, round2(150.0 * 0.95 * 2.0 * 1.15));
        assert!(emergency.estimated_range.1 > routine.estimated_range.1);

        // The ER service itself is not double-penalized
        let er = estimator
            .estimate("emergency_room", &insurance, "midwest", true, true)
            .unwrap();
        assert_eq!(er.estimated_range.0, round2(500.0 * 0.95 * 0.85));
    }

    #[test]
    fn test_out_of_network_surcharge() {
        let estimator = CostEstimator::new();
        let insurance = sample_insurance();

        let in_network = estimator
            .estimate("office_visit", &insurance, "midwest", false, true)
            .unwrap();
        let out_of_network = estimator
            .estimate("office_visit", &insurance, "midwest", false, false)
            .unwrap();

        assert!(out_of_network.out_of_pocket > in_network.out_of_pocket);
    }

    #[test]
    fn test_coverage_breakdown_under_deductible() {
        // Cost below remaining deductible: the member pays everything
        let breakdown = CostEstimator::coverage_breakdown(400.0, &sample_insurance());

        assert_eq!(breakdown.patient_responsibility, 400.0);
        assert_eq!(breakdown.insurance_paid, 0.0);
        assert_eq!(breakdown.total_cost, 400.0);
    }

    #[test]
    fn test_coverage_breakdown_past_deductible_applies_coinsurance() {
        // 2000 charge, 1500 deductible remaining, then 20% of the rest
        let breakdown = CostEstimator::coverage_breakdown(2_000.0, &sample_insurance());

        assert_eq!(breakdown.patient_responsibility, 1_600.0);
        assert_eq!(breakdown.insurance_paid, 400.0);
        assert_eq!(breakdown.total_cost, 2_000.0);
    }

    #[test]
    fn test_coinsurance_capped_by_out_of_pocket_room() {
        let mut insurance = sample_insurance();
        insurance.deductible_met = 2_000.0;
        insurance.out_of_pocket_met = 5_900.0; // only 100 of OOP room left

        let breakdown = CostEstimator::coverage_breakdown(10_000.0, &insurance);

        assert_eq!(breakdown.patient_responsibility, 100.0);
        assert_eq!(breakdown.insurance_paid, 9_900.0);
    }

    #[test]
    fn test_alternatives_for_emergency_room() {
        let estimator = CostEstimator::new();
        let estimate = estimator
            .estimate("emergency_room", &sample_insurance(), "midwest", true, true)
            .unwrap();

        assert_eq!(estimate.alternatives.len(), 1);
        assert_eq!(estimate.alternatives[0].kind, "Urgent Care");
        assert_eq!(estimate.alternatives[0].estimated_cost, 225.0);
    }

    #[test]
    fn test_available_services_lists_catalog() {
        let estimator = CostEstimator::new();
        let services = estimator.available_services();

        assert_eq!(services.len(), 10);
        assert!(services.iter().any(|(key, _)| *key == "office_visit"));
    }
}
