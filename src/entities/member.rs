// 🧑‍⚕️ Family Member Registry
// Household members with their insurance policy assignments, plus the
// pending-action rules derived from policy progress.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use super::{StoreError, EXPORT_VERSION};
use crate::storage::Storage;

/// Fixed persistence key; distinct from the savings registry key
pub const FAMILY_STORAGE_KEY: &str = "medfin.family";

/// Policy fields consulted by the pending-action rules. `policy_data` is
/// otherwise opaque to the registry.
const ANNUAL_DEDUCTIBLE_FIELD: &str = "annual_deductible_individual";
const ANNUAL_OUT_OF_POCKET_FIELD: &str = "annual_out_of_pocket_individual";
const RENEWAL_DATE_FIELD: &str = "renewal_date";

/// Days ahead a renewal date counts as "approaching"
const RENEWAL_WINDOW_DAYS: i64 = 60;

// ============================================================================
// MEMBER TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    #[serde(rename = "self")]
    Myself,
    Spouse,
    Child,
    Parent,
    Other,
}

impl Relationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Myself => "self",
            Relationship::Spouse => "spouse",
            Relationship::Child => "child",
            Relationship::Parent => "parent",
            Relationship::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberType {
    Primary,
    Dependent,
}

/// A policy attached to one member. Assignments are owned by the member:
/// removing the member removes its assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyAssignment {
    pub policy_id: String,

    /// Opaque insurance-policy record as returned by the backend
    pub policy_data: Value,

    pub member_type: MemberType,

    /// Amount applied toward the annual deductible (never negative)
    pub deductible_met: f64,

    /// Amount applied toward the out-of-pocket maximum (never negative)
    pub out_of_pocket_met: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyMember {
    /// Stable identity, unique within the registry
    pub id: String,

    pub name: String,
    pub relationship: Relationship,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,

    #[serde(default)]
    pub policies: Vec<PolicyAssignment>,
}

/// Input for `add`: identity is generated by the registry
#[derive(Debug, Clone)]
pub struct NewFamilyMember {
    pub name: String,
    pub relationship: Relationship,
    pub date_of_birth: Option<NaiveDate>,
}

// ============================================================================
// PENDING ACTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPriority {
    High,
    Medium,
    Low,
}

impl ActionPriority {
    /// Sort rank: high > medium > low
    fn rank(self) -> u8 {
        match self {
            ActionPriority::High => 0,
            ActionPriority::Medium => 1,
            ActionPriority::Low => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionPriority::High => "high",
            ActionPriority::Medium => "medium",
            ActionPriority::Low => "low",
        }
    }
}

/// One recommended follow-up derived from a member's policy state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingAction {
    pub member_id: String,
    pub member_name: String,
    pub priority: ActionPriority,
    pub action: String,
    pub detail: String,
}

// ============================================================================
// EXPORT SNAPSHOT
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct FamilyExport {
    members: Vec<FamilyMember>,
    export_date: DateTime<Utc>,
    version: u32,
}

// ============================================================================
// FAMILY REGISTRY
// ============================================================================

/// In-memory collection of family members with write-through persistence
///
/// Loaded once at construction; absent or corrupt persisted state yields an
/// empty registry, never a failure. Storage faults during mutation are
/// logged and swallowed — the registry keeps operating in memory.
pub struct FamilyRegistry {
    members: Vec<FamilyMember>,
    storage: Arc<dyn Storage>,
}

impl FamilyRegistry {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let members = Self::load_members(storage.as_ref());
        FamilyRegistry { members, storage }
    }

    fn load_members(storage: &dyn Storage) -> Vec<FamilyMember> {
        match storage.load(FAMILY_STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(members) => members,
                Err(err) => {
                    warn!(error = %err, "corrupt family records, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "family records unreadable, starting empty");
                Vec::new()
            }
        }
    }

    fn persist(&self) {
        let raw = match serde_json::to_string(&self.members) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "failed to serialize family records");
                return;
            }
        };
        if let Err(err) = self.storage.save(FAMILY_STORAGE_KEY, &raw) {
            warn!(error = %err, "failed to persist family records, keeping in-memory state");
        }
    }

    /// Append a new member with a generated id and persist
    pub fn add(&mut self, new_member: NewFamilyMember) -> FamilyMember {
        let member = FamilyMember {
            id: uuid::Uuid::new_v4().to_string(),
            name: new_member.name,
            relationship: new_member.relationship,
            date_of_birth: new_member.date_of_birth,
            policies: Vec::new(),
        };

        self.members.push(member.clone());
        self.persist();
        member
    }

    /// Merge changes into the matching member; silently a no-op when the id
    /// is absent. Money fields are clamped back to zero afterwards so a
    /// mutation can never store a negative amount.
    pub fn update<F>(&mut self, id: &str, apply: F) -> bool
    where
        F: FnOnce(&mut FamilyMember),
    {
        let Some(member) = self.members.iter_mut().find(|m| m.id == id) else {
            return false;
        };

        // Identity is not updatable
        let identity = member.id.clone();
        apply(member);
        member.id = identity;

        for policy in &mut member.policies {
            policy.deductible_met = policy.deductible_met.max(0.0);
            policy.out_of_pocket_met = policy.out_of_pocket_met.max(0.0);
        }

        self.persist();
        true
    }

    /// Remove the matching member (and its owned assignments); no-op when absent
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.id != id);

        if self.members.len() == before {
            return false;
        }
        self.persist();
        true
    }

    pub fn get(&self, id: &str) -> Option<&FamilyMember> {
        self.members.iter().find(|m| m.id == id)
    }

    pub fn members(&self) -> &[FamilyMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Attach a policy to a member, replacing any assignment with the same
    /// policy id. Money fields are clamped to zero or above.
    pub fn assign_policy(&mut self, member_id: &str, mut assignment: PolicyAssignment) -> bool {
        let Some(member) = self.members.iter_mut().find(|m| m.id == member_id) else {
            return false;
        };

        assignment.deductible_met = assignment.deductible_met.max(0.0);
        assignment.out_of_pocket_met = assignment.out_of_pocket_met.max(0.0);

        member.policies.retain(|p| p.policy_id != assignment.policy_id);
        member.policies.push(assignment);

        self.persist();
        true
    }

    /// Record progress toward deductible / out-of-pocket on one assignment
    pub fn update_policy_progress(
        &mut self,
        member_id: &str,
        policy_id: &str,
        deductible_met: f64,
        out_of_pocket_met: f64,
    ) -> bool {
        let Some(member) = self.members.iter_mut().find(|m| m.id == member_id) else {
            return false;
        };
        let Some(policy) = member.policies.iter_mut().find(|p| p.policy_id == policy_id) else {
            return false;
        };

        policy.deductible_met = deductible_met.max(0.0);
        policy.out_of_pocket_met = out_of_pocket_met.max(0.0);

        self.persist();
        true
    }

    /// Empty the registry and persist the empty state
    pub fn clear(&mut self) {
        self.members.clear();
        self.persist();
    }

    // ========================================================================
    // EXPORT / IMPORT
    // ========================================================================

    /// Versioned snapshot of the full collection
    pub fn export(&self) -> Result<String, StoreError> {
        let snapshot = FamilyExport {
            members: self.members.clone(),
            export_date: Utc::now(),
            version: EXPORT_VERSION,
        };
        serde_json::to_string(&snapshot).map_err(|err| StoreError::Export(err.to_string()))
    }

    /// Validate and replace the whole collection; on any failure the
    /// existing state is left untouched (never a partial import)
    pub fn import(&mut self, raw: &str) -> Result<usize, StoreError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|err| StoreError::InvalidImport(format!("malformed JSON: {}", err)))?;

        let members_value = value
            .get("members")
            .ok_or_else(|| StoreError::InvalidImport("missing \"members\" field".to_string()))?;
        if !members_value.is_array() {
            return Err(StoreError::InvalidImport(
                "\"members\" must be an array".to_string(),
            ));
        }

        let members: Vec<FamilyMember> = serde_json::from_value(members_value.clone())
            .map_err(|err| StoreError::InvalidImport(format!("unexpected member shape: {}", err)))?;

        let mut seen_ids = std::collections::HashSet::new();
        for member in &members {
            if !seen_ids.insert(member.id.as_str()) {
                return Err(StoreError::InvalidImport(format!(
                    "duplicate member id: {}",
                    member.id
                )));
            }
            for policy in &member.policies {
                if policy.deductible_met < 0.0 || policy.out_of_pocket_met < 0.0 {
                    return Err(StoreError::InvalidImport(format!(
                        "negative policy amounts on member {}",
                        member.id
                    )));
                }
            }
        }

        self.members = members;
        self.persist();
        Ok(self.members.len())
    }

    // ========================================================================
    // PENDING ACTIONS
    // ========================================================================

    /// Deterministic follow-up rules over each member's policy assignments,
    /// sorted high > medium > low
    pub fn pending_actions(&self) -> Vec<PendingAction> {
        self.pending_actions_at(Utc::now().date_naive())
    }

    pub fn pending_actions_at(&self, today: NaiveDate) -> Vec<PendingAction> {
        let mut actions = Vec::new();

        for member in &self.members {
            if member.policies.is_empty() {
                actions.push(PendingAction {
                    member_id: member.id.clone(),
                    member_name: member.name.clone(),
                    priority: ActionPriority::Low,
                    action: "Add an insurance policy".to_string(),
                    detail: format!("{} has no coverage on file", member.name),
                });
                continue;
            }

            for policy in &member.policies {
                if let Some(percent) =
                    progress_percent(policy.deductible_met, &policy.policy_data, ANNUAL_DEDUCTIBLE_FIELD)
                {
                    // 80–99% window only; a met deductible needs no action
                    if (80.0..100.0).contains(&percent) {
                        actions.push(PendingAction {
                            member_id: member.id.clone(),
                            member_name: member.name.clone(),
                            priority: ActionPriority::Medium,
                            action: "Deductible nearly met".to_string(),
                            detail: format!(
                                "{} is at {:.0}% of the annual deductible; planned care will cost less after it is met",
                                member.name, percent
                            ),
                        });
                    }
                }

                if let Some(percent) = progress_percent(
                    policy.out_of_pocket_met,
                    &policy.policy_data,
                    ANNUAL_OUT_OF_POCKET_FIELD,
                ) {
                    if (80.0..100.0).contains(&percent) {
                        actions.push(PendingAction {
                            member_id: member.id.clone(),
                            member_name: member.name.clone(),
                            priority: ActionPriority::High,
                            action: "Out-of-pocket maximum nearly reached".to_string(),
                            detail: format!(
                                "{} is at {:.0}% of the out-of-pocket maximum; schedule necessary procedures now to maximize coverage",
                                member.name, percent
                            ),
                        });
                    }
                }

                if let Some(renewal) = policy
                    .policy_data
                    .get(RENEWAL_DATE_FIELD)
                    .and_then(Value::as_str)
                    .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
                {
                    let days_until = (renewal - today).num_days();
                    if (0..=RENEWAL_WINDOW_DAYS).contains(&days_until) {
                        actions.push(PendingAction {
                            member_id: member.id.clone(),
                            member_name: member.name.clone(),
                            priority: ActionPriority::Medium,
                            action: "Policy renewal approaching".to_string(),
                            detail: format!(
                                "Policy {} renews in {} day(s); review coverage options before the window closes",
                                policy.policy_id, days_until
                            ),
                        });
                    }
                }
            }
        }

        actions.sort_by_key(|action| action.priority.rank());
        actions
    }
}

/// Percent of an annual limit consumed, when the limit is present and positive
fn progress_percent(met: f64, policy_data: &Value, field: &str) -> Option<f64> {
    let annual = policy_data.get(field).and_then(Value::as_f64)?;
    if annual <= 0.0 {
        return None;
    }
    Some(met / annual * 100.0)
}

// ============================================================================
// TESTS
// ============================================================================
