// Base trait and utilities for source-specific normalizers
pub mod base;

// Individual normalizer implementations
pub mod government;
pub mod hardwarezone;
pub mod propertyguru;
pub mod reddit;

// Re-export the main components
pub use base::{BaseFields, FieldMap, MetricsNormalizer, NormalizerUtils, SourceNormalizer};
pub use government::GovernmentNormalizer;
pub use hardwarezone::HardwareZoneNormalizer;
pub use propertyguru::PropertyGuruNormalizer;
pub use reddit::RedditNormalizer;
