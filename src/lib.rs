//! Nigeria GDP Predictor
//!
//! Serves a pre-trained GDP regression model over HTTP. Artifacts are loaded
//! once at startup; requests are validated against a fixed numeric schema,
//! scaled, run through the model and inverse-scaled. When the model cannot
//! answer, a single configured policy either degrades to a linear heuristic
//! or fails closed.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pipeline;
pub mod policy;
pub mod schema;

pub use artifacts::ArtifactBundle;
pub use config::AppConfig;
pub use handlers::AppState;
pub use policy::FallbackPolicy;
pub use schema::FeatureSet;
