// 📖 Insurance Jargon Translator
// Pure dictionary substitution: swaps billing/insurance jargon for plain
// language and explains the terms found in a document.

use regex::Regex;
use serde::Serialize;

// ============================================================================
// DICTIONARY
// ============================================================================

/// (term, plain-language replacement, one-line definition)
///
/// Replacements intentionally avoid other dictionary terms so substitution
/// never cascades. Multi-word terms come first to win over their substrings.
const DICTIONARY: [(&str, &str, &str); 16] = [
    (
        "explanation of benefits",
        "statement showing what your plan paid",
        "A statement from your insurer describing what was billed, what the plan paid, and what you owe. It is not a bill.",
    ),
    (
        "out-of-pocket maximum",
        "yearly spending cap",
        "The most you pay for covered services in a plan year; after reaching it, the plan pays 100%.",
    ),
    (
        "prior authorization",
        "advance approval from your plan",
        "Approval your insurer requires before certain services are performed, or the claim may be denied.",
    ),
    (
        "balance billing",
        "billing you for the leftover amount",
        "When an out-of-network provider bills you for the difference between their charge and what your plan allowed.",
    ),
    (
        "allowed amount",
        "plan-approved price",
        "The maximum your plan considers payable for a service; the basis for your share of the cost.",
    ),
    (
        "in-network",
        "contracted with your plan",
        "Providers that agreed to your plan's negotiated rates; using them costs you less.",
    ),
    (
        "out-of-network",
        "not contracted with your plan",
        "Providers without a contract with your plan; higher cost-sharing and balance bills are possible.",
    ),
    (
        "coinsurance",
        "your percentage share of the cost",
        "The percentage of an approved charge you pay after meeting the deductible.",
    ),
    (
        "copayment",
        "fixed fee per visit",
        "A flat amount you pay for a covered service, like $30 for an office visit.",
    ),
    (
        "copay",
        "fixed fee per visit",
        "A flat amount you pay for a covered service, like $30 for an office visit.",
    ),
    (
        "deductible",
        "amount you pay before coverage starts",
        "What you pay for covered services each year before your plan begins to pay.",
    ),
    (
        "formulary",
        "list of covered medications",
        "Your plan's list of covered drugs, grouped into tiers that determine your cost.",
    ),
    (
        "premium",
        "monthly plan payment",
        "The amount you pay each month to keep your insurance active, regardless of care received.",
    ),
    (
        "appeal",
        "formal request to reverse a denial",
        "A formal request asking your insurer to reconsider a denied claim or authorization.",
    ),
    (
        "claim",
        "payment request sent to your plan",
        "A request for payment that a provider or member submits to the insurer after care.",
    ),
    (
        "upcoding",
        "billing for a costlier service than performed",
        "Billing with a code for a more complex (and expensive) service than the one actually provided.",
    ),
];

// ============================================================================
// TRANSLATOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermExplanation {
    pub term: &'static str,
    pub definition: &'static str,
}

struct JargonEntry {
    term: &'static str,
    plain: &'static str,
    definition: &'static str,
    pattern: Regex,
}

pub struct JargonTranslator {
    entries: Vec<JargonEntry>,
}

impl JargonTranslator {
    pub fn new() -> Self {
        let entries = DICTIONARY
            .iter()
            .map(|&(term, plain, definition)| JargonEntry {
                term,
                plain,
                definition,
                pattern: Regex::new(&format!(r"(?i)\b{}s?\b", regex::escape(term))).unwrap(),
            })
            .collect();

        JargonTranslator { entries }
    }

    /// Replace every known term with its plain-language equivalent
    pub fn translate(&self, text: &str) -> String {
        let mut output = text.to_string();
        for entry in &self.entries {
            output = entry.pattern.replace_all(&output, entry.plain).into_owned();
        }
        output
    }

    /// Definitions for the terms present in the text, in dictionary order,
    /// each term listed once
    pub fn explain_terms(&self, text: &str) -> Vec<TermExplanation> {
        let mut explanations: Vec<TermExplanation> = Vec::new();

        for entry in &self.entries {
            if entry.pattern.is_match(text)
                && !explanations
                    .iter()
                    .any(|existing| existing.definition == entry.definition)
            {
                explanations.push(TermExplanation {
                    term: entry.term,
                    definition: entry.definition,
                });
            }
        }
        explanations
    }

    pub fn term_count(&self) -> usize {
        self.entries.len()
    }
}

impl Default for JargonTranslator {
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

    #[test]
    fn test_translates_single_term() {
        let translator = JargonTranslator::new();

        let plain = translator.translate("You have not met your deductible yet.");
        assert_eq!(
            plain,
            "You have not met your amount you pay before coverage starts yet."
        );
    }

    #[test]
    fn test_translation_is_case_insensitive_and_handles_plurals() {
        let translator = JargonTranslator::new();

        let plain = translator.translate("Copays and COINSURANCE apply.");
        assert!(!plain.to_lowercase().contains("copay"));
        assert!(!plain.to_lowercase().contains("coinsurance"));
    }

    #[test]
    fn test_multi_word_terms_win_over_substrings() {
        let translator = JargonTranslator::new();

        let plain = translator.translate("Your out-of-pocket maximum is $6,000.");
        assert_eq!(plain, "Your yearly spending cap is $6,000.");
    }

    #[test]
    fn test_word_boundaries_protect_other_words() {
        let translator = JargonTranslator::new();

        // "reclaim" contains "claim" but must survive untouched
        let plain = translator.translate("You can reclaim your receipts.");
        assert_eq!(plain, "You can reclaim your receipts.");
    }

    #[test]
    fn test_unknown_text_unchanged() {
        let translator = JargonTranslator::new();
        let text = "Nothing medical in this sentence.";

        assert_eq!(translator.translate(text), text);
    }

    #[test]
    fn test_explain_terms_lists_each_once() {
        let translator = JargonTranslator::new();

        let explanations = translator.explain_terms(
            "The deductible applies, then a copay or copayment per visit. Deductible resets yearly.",
        );

        let terms: Vec<&str> = explanations.iter().map(|e| e.term).collect();
        assert!(terms.contains(&"deductible"));
        // copay and copayment share a definition, listed once
        assert_eq!(
            explanations
                .iter()
                .filter(|e| e.definition.contains("flat amount"))
                .count(),
            1
        );
        assert_eq!(
            terms.iter().filter(|t| **t == "deductible").count(),
            1
        );
    }

    #[test]
    fn test_dictionary_covers_core_glossary() {
        let translator = JargonTranslator::new();
        let glossary = "deductible out-of-pocket maximum coinsurance copay prior authorization appeal";

        let explanations = translator.explain_terms(glossary);
        assert!(explanations.len() >= 6);
    }
}
