pub mod usage;

pub use usage::UsageTracker;
