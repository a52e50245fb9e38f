// 👪 Local Domain Records
// Two independent registries (family members, savings events) holding
// in-memory collections with write-through persistence. Persisted state is
// the sole source of truth across sessions; there is no server-side mirror.

pub mod member;
pub mod savings;

pub use member::{
    ActionPriority, FamilyMember, FamilyRegistry, MemberType, NewFamilyMember,
    PendingAction, PolicyAssignment, Relationship, FAMILY_STORAGE_KEY,
};
pub use savings::{
    NewSavingsEvent, SavingsCategory, SavingsEvent, SavingsRegistry, SAVINGS_STORAGE_KEY,
};

/// Schema version stamped on exported snapshots
pub const EXPORT_VERSION: u32 = 1;

/// Registry failures surfaced to callers
///
/// Storage read/write faults are logged and swallowed (the registry degrades
/// to in-memory operation); import rejection is the one error callers see.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Import payload was malformed or the wrong shape; existing state is
    /// left untouched
    #[error("invalid import data: {0}")]
    InvalidImport(String),

    #[error("export failed: {0}")]
    Export(String),
}
