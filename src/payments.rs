// 💳 Payment Plan Generator
// Candidate repayment strategies for a medical debt balance, scored by
// affordability, interest, and hardship fit.

use serde::Serialize;

// ============================================================================
// PLAN OPTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentPlanOption {
    pub plan_type: String,
    pub monthly_payment: f64,
    pub total_repayment: f64,
    pub term_months: u32,

    /// APR in percent (0.0 for interest-free plans)
    pub interest_rate: f64,
    pub total_interest: f64,

    pub pros: Vec<&'static str>,
    pub cons: Vec<&'static str>,
    pub eligibility_criteria: Vec<&'static str>,

    /// 0–100, higher is better
    pub recommendation_score: f64,
}

/// Inputs shared by every generator
#[derive(Debug, Clone, Copy)]
pub struct PaymentProfile {
    pub total_debt: f64,
    pub monthly_income: f64,
    pub credit_score: Option<u32>,
    pub debt_to_income_ratio: f64,
    pub hardship: bool,
}

// ============================================================================
// PAYMENT PLANNER
// ============================================================================

pub struct PaymentPlanner;

impl PaymentPlanner {
    pub fn new() -> Self {
        PaymentPlanner
    }

    /// All affordable plan options, best-scored first
    pub fn generate_plans(&self, profile: &PaymentProfile) -> Vec<PaymentPlanOption> {
        let mut plans = Vec::new();

        plans.extend(self.provider_plans(profile));
        plans.extend(self.medical_credit_card_plans(profile));
        plans.extend(self.personal_loan_plans(profile));
        plans.extend(self.home_equity_plans(profile));
        if profile.hardship {
            plans.extend(self.hardship_plans(profile));
        }

        for plan in &mut plans {
            plan.recommendation_score = self.recommendation_score(plan, profile);
        }

        plans.sort_by(|a, b| b.recommendation_score.total_cmp(&a.recommendation_score));
        plans
    }

    pub fn recommend_best(&self, profile: &PaymentProfile) -> Option<PaymentPlanOption> {
        self.generate_plans(profile).into_iter().next()
    }

    // ========================================================================
    // GENERATORS
    // ========================================================================

    /// Interest-free installments negotiated directly with the provider;
    /// affordable when the payment stays under 20% of monthly income
    fn provider_plans(&self, profile: &PaymentProfile) -> Vec<PaymentPlanOption> {
        let mut plans = Vec::new();

        for term in [6u32, 12, 18, 24, 36] {
            let mut monthly_payment = profile.total_debt / term as f64;
            let mut total_repayment = profile.total_debt;

            if monthly_payment > profile.monthly_income * 0.20 {
                continue;
            }

            // Hardship discount negotiated up front
            if profile.hardship {
                total_repayment = profile.total_debt * 0.90;
                monthly_payment = total_repayment / term as f64;
            }

            plans.push(PaymentPlanOption {
                plan_type: format!("Provider Payment Plan ({} months)", term),
                monthly_payment: round2(monthly_payment),
                total_repayment: round2(total_repayment),
                term_months: term,
                interest_rate: 0.0,
                total_interest: 0.0,
                pros: vec![
                    "No interest charges",
                    "No credit check required",
                    "Flexible terms negotiated directly with provider",
                    "Payments reported to credit bureaus",
                ],
                cons: vec![
                    "May require down payment",
                    "Limited to specific providers",
                    "Late fees may apply",
                    "Terms vary by provider",
                ],
                eligibility_criteria: vec![
                    "Contact provider billing department",
                    "Demonstrate ability to pay",
                    "Agree to automatic payments (may offer discount)",
                ],
                recommendation_score: 0.0,
            });
        }

        plans
    }

    fn medical_credit_card_plans(&self, profile: &PaymentProfile) -> Vec<PaymentPlanOption> {
        if matches!(profile.credit_score, Some(score) if score < 640) {
            return Vec::new();
        }

        let promotional_period = 12u32;
        let mut plans = Vec::new();

        for term in [promotional_period, 24] {
            let monthly_payment = profile.total_debt / term as f64;

            plans.push(PaymentPlanOption {
                plan_type: format!("Medical Credit Card - 0% APR ({} months)", term),
                monthly_payment: round2(monthly_payment),
                total_repayment: round2(profile.total_debt),
                term_months: term,
                interest_rate: 0.0,
                total_interest: 0.0,
                pros: vec![
                    "0% APR for first 12 months",
                    "Can be used at multiple providers",
                    "May offer welcome bonuses",
                    "Fast application process",
                ],
                cons: vec![
                    "Interest charges apply after 12 months if not paid",
                    "Deferred interest on full balance if not paid in full",
                    "Requires good credit",
                    "Limited network of participating providers",
                ],
                eligibility_criteria: vec![
                    "Credit score 640+ recommended",
                    "Application through participating provider or issuer",
                    "Proof of income may be required",
                ],
                recommendation_score: 0.0,
            });
        }

        plans
    }

    fn personal_loan_plans(&self, profile: &PaymentProfile) -> Vec<PaymentPlanOption> {
        if matches!(profile.credit_score, Some(score) if score < 600) {
            return Vec::new();
        }
        if profile.debt_to_income_ratio > 0.43 {
            return Vec::new();
        }

        let interest_rate = match profile.credit_score {
            Some(score) if score >= 740 => 0.05,
            Some(score) if score >= 670 => 0.07,
            Some(_) => 0.12,
            None => 0.08,
        };

        let mut plans = Vec::new();
        for term in [24u32, 36, 48, 60] {
            let monthly_payment = monthly_payment(profile.total_debt, interest_rate, term);
            if monthly_payment > profile.monthly_income * 0.15 {
                continue;
            }

            let total_interest = round2(monthly_payment * term as f64 - profile.total_debt);

            plans.push(PaymentPlanOption {
                plan_type: format!("Personal Loan ({} months)", term),
                monthly_payment: round2(monthly_payment),
                total_repayment: round2(profile.total_debt + total_interest),
                term_months: term,
                interest_rate: round2(interest_rate * 100.0),
                total_interest,
                pros: vec![
                    "Fixed interest rate and monthly payment",
                    "Consolidates multiple bills into single payment",
                    "Lump-sum payment can provide leverage for discounts",
                    "Can improve credit mix if managed responsibly",
                ],
                cons: vec![
                    "Interest charges apply",
                    "Requires good credit for best rates",
                    "Origination fees may apply",
                    "May have prepayment penalties",
                ],
                eligibility_criteria: vec![
                    "Credit score 600+ required",
                    "Debt-to-income ratio below 43%",
                    "Proof of income and employment",
                    "Valid bank account",
                ],
                recommendation_score: 0.0,
            });
        }

        plans
    }

    fn home_equity_plans(&self, profile: &PaymentProfile) -> Vec<PaymentPlanOption> {
        if matches!(profile.credit_score, Some(score) if score < 620) {
            return Vec::new();
        }

        let interest_rate = match profile.credit_score {
            Some(score) if score >= 740 => 0.04,
            _ => 0.06,
        };

        let mut plans = Vec::new();
        for term in [60u32, 120, 180] {
            let monthly_payment = monthly_payment(profile.total_debt, interest_rate, term);
            if monthly_payment > profile.monthly_income * 0.25 {
                continue;
            }

            let total_interest = round2(monthly_payment * term as f64 - profile.total_debt);

            plans.push(PaymentPlanOption {
                plan_type: format!("Home Equity Loan ({} months)", term),
                monthly_payment: round2(monthly_payment),
                total_repayment: round2(profile.total_debt + total_interest),
                term_months: term,
                interest_rate: round2(interest_rate * 100.0),
                total_interest,
                pros: vec![
                    "Low interest rate",
                    "Interest may be tax deductible",
                    "Long repayment terms keep payments low",
                    "Large borrowing capacity",
                ],
                cons: vec![
                    "Home used as collateral",
                    "Closing costs and fees",
                    "Longer loan term means more total interest",
                    "Risk of foreclosure if payments are missed",
                ],
                eligibility_criteria: vec![
                    "Credit score 620+ required",
                    "Sufficient home equity",
                    "Debt-to-income ratio below 43%",
                    "Home appraisal required",
                ],
                recommendation_score: 0.0,
            });
        }

        plans
    }

    /// Principal reduction plus extended terms; only offered when the
    /// resulting payment is genuinely small relative to income
    fn hardship_plans(&self, profile: &PaymentProfile) -> Vec<PaymentPlanOption> {
        let term = 60u32;
        let total_repayment = profile.total_debt * 0.70;
        let monthly_payment = total_repayment / term as f64;

        if monthly_payment > profile.monthly_income * 0.10 {
            return Vec::new();
        }

        vec![PaymentPlanOption {
            plan_type: format!("Hardship Payment Plan ({} months)", term),
            monthly_payment: round2(monthly_payment),
            total_repayment: round2(total_repayment),
            term_months: term,
            interest_rate: 0.0,
            total_interest: 0.0,
            pros: vec![
                "30% principal reduction",
                "No interest charges",
                "Extended repayment terms",
                "Protects credit score from collections",
            ],
            cons: vec![
                "Requires proof of financial hardship",
                "Limited availability",
                "May require down payment",
                "Provider must approve hardship status",
            ],
            eligibility_criteria: vec![
                "Documented financial hardship",
                "Income below 300% FPL",
                "Medical debt burden",
                "Provider approval required",
            ],
            recommendation_score: 0.0,
        }]
    }

    // ========================================================================
    // SCORING
    // ========================================================================

    fn recommendation_score(&self, plan: &PaymentPlanOption, profile: &PaymentProfile) -> f64 {
        let mut score: f64 = 50.0;

        let payment_ratio = if profile.monthly_income > 0.0 {
            plan.monthly_payment / profile.monthly_income
        } else {
            1.0
        };

        if payment_ratio <= 0.10 {
            score += 30.0;
        } else if payment_ratio <= 0.15 {
            score += 20.0;
        } else if payment_ratio <= 0.20 {
            score += 10.0;
        }

        if plan.interest_rate == 0.0 {
            score += 20.0;
        } else if plan.interest_rate <= 5.0 {
            score += 15.0;
        } else if plan.interest_rate <= 10.0 {
            score += 5.0;
        }

        if profile.hardship && plan.plan_type.contains("Hardship") {
            score += 25.0;
        }

        if plan.plan_type.contains("Provider Payment Plan") {
            score += 15.0;
            if profile.hardship {
                score += 10.0;
            }
        }

        match profile.credit_score {
            Some(credit) if credit >= 700 => {
                if plan.plan_type.contains("Personal Loan") {
                    score += 10.0;
                }
                if plan.plan_type.contains("Home Equity") {
                    score += 10.0;
                }
                if plan.plan_type.contains("Medical Credit Card") {
                    score += 5.0;
                }
            }
            Some(credit) if credit < 650 => {
                if plan.plan_type.contains("Provider Payment Plan") {
                    score += 20.0;
                }
                if plan.plan_type.contains("Hardship") {
                    score += 25.0;
                }
            }
            _ => {}
        }

        if profile.debt_to_income_ratio > 0.35 {
            if plan.plan_type.contains("Provider Payment Plan")
                || plan.plan_type.contains("Hardship")
            {
                score += 15.0;
            }
            if plan.plan_type.contains("Personal Loan") || plan.plan_type.contains("Home Equity") {
                score -= 20.0;
            }
        }

        (score.clamp(0.0, 100.0) * 10.0).round() / 10.0
    }
}

impl Default for PaymentPlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Standard amortization; zero-rate loans divide evenly
fn monthly_payment(principal: f64, annual_rate: f64, months: u32) -> f64 {
    if annual_rate == 0.0 {
        return principal / months as f64;
    }

    let monthly_rate = annual_rate / 12.0;
    let growth = (1.0 + monthly_rate).powi(months as i32);
    principal * (monthly_rate * growth) / (growth - 1.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// TESTS
// ============================================================================
