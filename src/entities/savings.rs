// 💰 Savings Ledger
// Every dollar the user keeps (disputed charges, won appeals, cheaper
// alternatives) is logged here and aggregated on demand.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::warn;

use super::{StoreError, EXPORT_VERSION};
use crate::storage::Storage;

/// Fixed persistence key; distinct from the family registry key
pub const SAVINGS_STORAGE_KEY: &str = "medfin.savings";

// ============================================================================
// SAVINGS EVENT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavingsCategory {
    BillingError,
    AppealWon,
    NetworkSavings,
    RxSavings,
    DenialPrevented,
}

impl SavingsCategory {
    pub const ALL: [SavingsCategory; 5] = [
        SavingsCategory::BillingError,
        SavingsCategory::AppealWon,
        SavingsCategory::NetworkSavings,
        SavingsCategory::RxSavings,
        SavingsCategory::DenialPrevented,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SavingsCategory::BillingError => "billing_error",
            SavingsCategory::AppealWon => "appeal_won",
            SavingsCategory::NetworkSavings => "network_savings",
            SavingsCategory::RxSavings => "rx_savings",
            SavingsCategory::DenialPrevented => "denial_prevented",
        }
    }
}

/// One logged savings event; immutable apart from explicit update/remove
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsEvent {
    /// Stable identity, unique within the ledger
    pub id: String,

    /// Stamped at creation
    pub date: DateTime<Utc>,

    pub category: SavingsCategory,
    pub description: String,

    /// Never negative
    pub amount_saved: f64,

    /// Family member this savings applies to, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
}

/// Input for `add`: id and date are stamped by the registry
#[derive(Debug, Clone)]
pub struct NewSavingsEvent {
    pub category: SavingsCategory,
    pub description: String,
    pub amount_saved: f64,
    pub member_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SavingsExport {
    events: Vec<SavingsEvent>,
    export_date: DateTime<Utc>,
    version: u32,
}

// ============================================================================
// SAVINGS REGISTRY
// ============================================================================

/// In-memory event log with write-through persistence and on-demand
/// aggregate views. Same degradation rules as the family registry: storage
/// faults are logged, never surfaced.
pub struct SavingsRegistry {
    events: Vec<SavingsEvent>,
    storage: Arc<dyn Storage>,
}

impl SavingsRegistry {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let events = Self::load_events(storage.as_ref());
        SavingsRegistry { events, storage }
    }

    fn load_events(storage: &dyn Storage) -> Vec<SavingsEvent> {
        match storage.load(SAVINGS_STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(events) => events,
                Err(err) => {
                    warn!(error = %err, "corrupt savings records, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "savings records unreadable, starting empty");
                Vec::new()
            }
        }
    }

    fn persist(&self) {
        let raw = match serde_json::to_string(&self.events) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "failed to serialize savings records");
                return;
            }
        };
        if let Err(err) = self.storage.save(SAVINGS_STORAGE_KEY, &raw) {
            warn!(error = %err, "failed to persist savings records, keeping in-memory state");
        }
    }

    /// Append a new event with generated id and creation date, then persist.
    /// Negative amounts are clamped to zero at this boundary.
    pub fn add(&mut self, new_event: NewSavingsEvent) -> SavingsEvent {
        let event = SavingsEvent {
            id: uuid::Uuid::new_v4().to_string(),
            date: Utc::now(),
            category: new_event.category,
            description: new_event.description,
            amount_saved: new_event.amount_saved.max(0.0),
            member_id: new_event.member_id,
        };

        self.events.push(event.clone());
        self.persist();
        event
    }

    /// Merge changes into the matching event; silently a no-op when the id
    /// is absent. The amount is clamped back to zero afterwards.
    pub fn update<F>(&mut self, id: &str, apply: F) -> bool
    where
        F: FnOnce(&mut SavingsEvent),
    {
        let Some(event) = self.events.iter_mut().find(|e| e.id == id) else {
            return false;
        };

        // Identity is not updatable
        let identity = event.id.clone();
        apply(event);
        event.id = identity;
        event.amount_saved = event.amount_saved.max(0.0);

        self.persist();
        true
    }

    /// Remove the matching event; no-op when absent
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.events.len();
        self.events.retain(|e| e.id != id);

        if self.events.len() == before {
            return false;
        }
        self.persist();
        true
    }

    pub fn get(&self, id: &str) -> Option<&SavingsEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn events(&self) -> &[SavingsEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Empty the ledger and persist the empty state
    pub fn clear(&mut self) {
        self.events.clear();
        self.persist();
    }

    // ========================================================================
    // EXPORT / IMPORT
    // ========================================================================

    /// Versioned snapshot of the full ledger
    pub fn export(&self) -> Result<String, StoreError> {
        let snapshot = SavingsExport {
            events: self.events.clone(),
            export_date: Utc::now(),
            version: EXPORT_VERSION,
        };
        serde_json::to_string(&snapshot).map_err(|err| StoreError::Export(err.to_string()))
    }

    /// Validate and replace the whole ledger; on any failure the existing
    /// state is left untouched (never a partial import)
    pub fn import(&mut self, raw: &str) -> Result<usize, StoreError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| StoreError::InvalidImport(format!("malformed JSON: {}", err)))?;

        let events_value = value
            .get("events")
            .ok_or_else(|| StoreError::InvalidImport("missing \"events\" field".to_string()))?;
        if !events_value.is_array() {
            return Err(StoreError::InvalidImport(
                "\"events\" must be an array".to_string(),
            ));
        }

        let events: Vec<SavingsEvent> = serde_json::from_value(events_value.clone())
            .map_err(|err| StoreError::InvalidImport(format!("unexpected event shape: {}", err)))?;

        let mut seen_ids = std::collections::HashSet::new();
        for event in &events {
            if !seen_ids.insert(event.id.as_str()) {
                return Err(StoreError::InvalidImport(format!(
                    "duplicate event id: {}",
                    event.id
                )));
            }
            if event.amount_saved < 0.0 {
                return Err(StoreError::InvalidImport(format!(
                    "negative amount on event {}",
                    event.id
                )));
            }
        }

        self.events = events;
        self.persist();
        Ok(self.events.len())
    }

    /// Spreadsheet-friendly CSV rendering of the event log
    pub fn export_csv(&self) -> Result<String, StoreError> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer
            .write_record(["id", "date", "category", "description", "amount_saved", "member_id"])
            .map_err(|err| StoreError::Export(err.to_string()))?;

        for event in &self.events {
            let date = event.date.to_rfc3339();
            let amount = format!("{:.2}", event.amount_saved);
            writer
                .write_record([
                    event.id.as_str(),
                    date.as_str(),
                    event.category.as_str(),
                    event.description.as_str(),
                    amount.as_str(),
                    event.member_id.as_deref().unwrap_or(""),
                ])
                .map_err(|err| StoreError::Export(err.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|err| StoreError::Export(err.to_string()))?;
        String::from_utf8(bytes).map_err(|err| StoreError::Export(err.to_string()))
    }

    // ========================================================================
    // DERIVED VIEWS
    // ========================================================================

    pub fn total_saved(&self) -> f64 {
        self.events.iter().map(|e| e.amount_saved).sum()
    }

    pub fn savings_by_category(&self) -> HashMap<SavingsCategory, f64> {
        let mut totals = HashMap::new();
        for event in &self.events {
            *totals.entry(event.category).or_insert(0.0) += event.amount_saved;
        }
        totals
    }

    pub fn total_for_member(&self, member_id: &str) -> f64 {
        self.events
            .iter()
            .filter(|e| e.member_id.as_deref() == Some(member_id))
            .map(|e| e.amount_saved)
            .sum()
    }

    /// Totals keyed by "YYYY-MM", sorted chronologically
    pub fn monthly_totals(&self) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        for event in &self.events {
            let month = event.date.format("%Y-%m").to_string();
            *totals.entry(month).or_insert(0.0) += event.amount_saved;
        }
        totals
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn registry() -> SavingsRegistry {
        SavingsRegistry::new(Arc::new(MemoryStorage::new()))
    }

    fn event(category: SavingsCategory, amount: f64) -> NewSavingsEvent {
        NewSavingsEvent {
            category,
            description: "test".to_string(),
            amount_saved: amount,
            member_id: None,
        }
    }

    #[test]
    fn test_add_aggregates_by_category() {
        let mut registry = registry();

        registry.add(NewSavingsEvent {
            category: SavingsCategory::BillingError,
            description: "Found duplicate charge".to_string(),
            amount_saved: 150.0,
            member_id: None,
        });

        assert_eq!(registry.total_saved(), 150.0);
        assert_eq!(
            registry.savings_by_category().get(&SavingsCategory::BillingError),
            Some(&150.0)
        );
    }

    #[test]
    fn test_add_generates_unique_ids_and_stamps_date() {
        let mut registry = registry();

        let a = registry.add(event(SavingsCategory::AppealWon, 10.0));
        let b = registry.add(event(SavingsCategory::AppealWon, 20.0));

        assert_eq!(registry.len(), 2);
        assert_ne!(a.id, b.id);
        assert!(a.date <= Utc::now());
    }

    #[test]
    fn test_negative_amount_clamped_on_add_and_update() {
        let mut registry = registry();

        let added = registry.add(event(SavingsCategory::RxSavings, -50.0));
        assert_eq!(added.amount_saved, 0.0);

        registry.update(&added.id, |e| e.amount_saved = -10.0);
        assert_eq!(registry.get(&added.id).unwrap().amount_saved, 0.0);
    }

    #[test]
    fn test_update_and_remove_are_noops_for_missing_ids() {
        let mut registry = registry();
        registry.add(event(SavingsCategory::NetworkSavings, 75.0));

        assert!(!registry.update("missing", |e| e.amount_saved = 1.0));
        assert!(!registry.remove("missing"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_export_clear_import_round_trip() {
        let mut registry = registry();
        registry.add(event(SavingsCategory::BillingError, 150.0));
        registry.add(NewSavingsEvent {
            category: SavingsCategory::AppealWon,
            description: "MRI denial reversed".to_string(),
            amount_saved: 900.0,
            member_id: Some("m-1".to_string()),
        });
        let before = registry.events().to_vec();

        let snapshot = registry.export().unwrap();
        registry.clear();
        assert!(registry.is_empty());

        let imported = registry.import(&snapshot).unwrap();
        assert_eq!(imported, 2);
        assert_eq!(registry.events(), before.as_slice());
    }

    #[test]
    fn test_import_missing_collection_field_leaves_state_unchanged() {
        let mut registry = registry();
        registry.add(event(SavingsCategory::DenialPrevented, 30.0));

        let err = registry.import(r#"{"records": [], "version": 1}"#);

        assert!(matches!(err, Err(StoreError::InvalidImport(_))));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.total_saved(), 30.0);
    }

    #[test]
    fn test_import_rejects_out_of_set_category() {
        let mut registry = registry();

        let err = registry.import(
            r#"{"events": [{"id": "1", "date": "2026-01-01T00:00:00Z", "category": "lottery_win", "description": "no", "amount_saved": 5.0}], "version": 1}"#,
        );

        assert!(matches!(err, Err(StoreError::InvalidImport(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_write_through_and_reload() {
        let storage = Arc::new(MemoryStorage::new());

        {
            let mut registry = SavingsRegistry::new(storage.clone());
            registry.add(event(SavingsCategory::RxSavings, 42.0));
        }

        let reloaded = SavingsRegistry::new(storage);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.total_saved(), 42.0);
    }

    #[test]
    fn test_member_and_monthly_views() {
        let mut registry = registry();
        registry.add(NewSavingsEvent {
            category: SavingsCategory::NetworkSavings,
            description: "in-network imaging".to_string(),
            amount_saved: 200.0,
            member_id: Some("m-1".to_string()),
        });
        registry.add(NewSavingsEvent {
            category: SavingsCategory::RxSavings,
            description: "generic substitution".to_string(),
            amount_saved: 35.0,
            member_id: Some("m-2".to_string()),
        });

        assert_eq!(registry.total_for_member("m-1"), 200.0);
        assert_eq!(registry.total_for_member("m-2"), 35.0);
        assert_eq!(registry.total_for_member("m-3"), 0.0);

        let monthly = registry.monthly_totals();
        // Both events were stamped this month
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly.values().next(), Some(&235.0));
    }

    #[test]
    fn test_csv_export_contains_header_and_rows() {
        let mut registry = registry();
        registry.add(NewSavingsEvent {
            category: SavingsCategory::BillingError,
            description: "duplicate lab charge".to_string(),
            amount_saved: 62.5,
            member_id: None,
        });

        let csv_text = registry.export_csv().unwrap();
        let mut lines = csv_text.lines();

        assert_eq!(
            lines.next(),
            Some("id,date,category,description,amount_saved,member_id")
        );
        let row = lines.next().unwrap();
        assert!(row.contains("billing_error"));
        assert!(row.contains("duplicate lab charge"));
        assert!(row.contains("62.50"));
    }
}
