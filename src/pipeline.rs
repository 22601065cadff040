//! Scale -> infer -> rescale.

use crate::artifacts::ArtifactBundle;
use crate::error::PipelineFailure;
use crate::schema::ValidatedInput;
use tracing::debug;

/// Run one validated request through the bundle and return GDP in
/// original units. Never substitutes a value on failure.
pub fn predict(bundle: &ArtifactBundle, input: &ValidatedInput) -> Result<f64, PipelineFailure> {
    let features = input.features();
    let scaled = bundle.transform_input(features.view())?;
    if scaled.iter().any(|v| !v.is_finite()) {
        return Err(PipelineFailure::NonFinite {
            stage: "input scaler",
        });
    }

    let raw = bundle.predict(scaled.view())?;
    if !raw.is_finite() {
        return Err(PipelineFailure::NonFinite { stage: "regressor" });
    }

    let gdp = bundle.transform_output(raw)?;
    if !gdp.is_finite() {
        return Err(PipelineFailure::NonFinite {
            stage: "output scaler",
        });
    }

    debug!(year = input.year(), scaled_prediction = raw, gdp, "Pipeline complete");
    Ok(gdp)
}
