// MedFin Core Library
// Exposes all modules for use in frontends and tests

pub mod api;
pub mod assistance;   // Assistance program matching
pub mod bills;        // Medical bill audit engine
pub mod config;
pub mod costs;        // Procedure cost estimation
pub mod entities;     // Family + savings records
pub mod insurance;    // Coverage model + analysis
pub mod jargon;       // Insurance jargon translation
pub mod navigation;   // Financial navigation planning
pub mod payments;     // Payment plan generation
pub mod schema;       // Backend response schemas + validation
pub mod storage;

// Re-export commonly used types
pub use api::{ApiClient, ApiError, FileUpload, RequestOptions, ResponseBody};
pub use assistance::{AssistanceMatch, AssistanceMatcher, AssistanceProgram};
pub use bills::{BillAnalysisIssue, BillAnalyzer, IssueSeverity, MedicalBill};
pub use config::Config;
pub use costs::{CostEstimate, CostEstimator, CoverageBreakdown};
pub use entities::{
    ActionPriority, FamilyMember, FamilyRegistry, MemberType, NewFamilyMember,
    NewSavingsEvent, PendingAction, PolicyAssignment, Relationship, SavingsCategory,
    SavingsEvent, SavingsRegistry, StoreError,
};
pub use insurance::{CoverageGap, InsuranceAnalyzer, InsuranceInfo, InsuranceType};
pub use jargon::JargonTranslator;
pub use navigation::{
    ActionItem, HardshipLevel, NavigationEngine, NavigationPlan, RiskLevel,
};
pub use payments::{PaymentPlanOption, PaymentPlanner};
pub use schema::{AppealLetter, ExtractedBill, ValidationError};
pub use storage::{FileStorage, MemoryStorage, SqliteStorage, Storage, StorageError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
