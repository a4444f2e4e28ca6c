use axum::{extract::State, Extension, Json};
use dealhub_core::{StoreStats, UsageReport};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

pub(super) async fn get_usage(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<UsageReport>>, ApiError> {
    let database = match state.aggregator.sink() {
        Some(sink) => sink.stats().await,
        None => StoreStats::default(),
    };

    let data = UsageReport {
        providers: state.aggregator.usage().snapshot(),
        cache: state.translator.stats().await,
        database,
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
