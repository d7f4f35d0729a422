use axum::{routing::post, Json, Router};
use tracing::{debug, instrument};

use crate::{
    multiplication::{
        dto::Operands,
        services::{generate_times_table_grid, TimesTableEntry},
    },
    state::AppState,
};

pub fn multiplication_routes() -> Router<AppState> {
    Router::new().route("/multiplication", post(create_multiplication_dataset))
}

/// POST /multiplication: the times table for the default quiz operands.
#[instrument]
pub async fn create_multiplication_dataset() -> Json<Vec<TimesTableEntry>> {
    let grid = generate_times_table_grid(&Operands::default());
    debug!(entries = grid.len(), "times table generated");
    Json(grid)
}
