pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, DiscoverySettings, KeywordConfig};
pub use error::LeadScoutError;
pub use types::{
    canonicalize_name, is_senior_finance_hr_title, Account, Classification, Contact,
    ContactSummary, Disposition, ExclusionReason, FundingSignal, HiringSignal, Industry,
    LeadQueueEntry, NewsSignal, RegionBucket, RoleChangeSignal, ScoreBreakdown, TriggerMap,
    VendorChangeSignal,
};
