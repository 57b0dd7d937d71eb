pub mod feature_registry;
pub mod presentation;
pub mod types;
