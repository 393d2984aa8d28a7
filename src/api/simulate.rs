use axum::{
    extract::{Query, State},
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use std::time::Instant;
use validator::Validate;

use super::{error::ApiError, response::ApiResponse, AppState};
use crate::domain::OperationsGraph;
use crate::flow::{FlowPropagator, SimulationResult};
use crate::simulation::SimulatedSensorSource;

#[derive(Debug, Deserialize)]
pub struct SimulateQuery {
    /// Readings per tag; the configured default when absent
    pub readings: Option<usize>,
}

/// POST /simulate - Run the facility graph through gap filling and flow propagation
pub async fn simulate(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<SimulateQuery>, ApiError>,
    WithRejection(Json(ops), _): WithRejection<Json<OperationsGraph>, ApiError>,
) -> Result<ApiResponse<SimulationResult>, ApiError> {
    ops.validate()?;

    let sim = &state.config.simulation;
    let readings = query.readings.unwrap_or(sim.default_readings);
    if readings > sim.max_readings {
        return Err(ApiError::BadRequest(format!(
            "readings must not exceed {}, got {readings}",
            sim.max_readings
        )));
    }

    let settings = sim.settings(readings);
    let seed = sim.seed;
    let started = Instant::now();

    let result = tokio::task::spawn_blocking(move || {
        let mut source = SimulatedSensorSource::new(seed);
        FlowPropagator::new(settings).propagate(&ops, &mut source)
    })
    .await??;

    let duration_ms = started.elapsed().as_millis() as u64;
    tracing::debug!(run_id = %result.run_id, duration_ms, readings, "simulate request served");

    Ok(ApiResponse::success(result).with_duration(duration_ms))
}
