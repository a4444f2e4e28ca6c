use axum::{
    extract::{Query, State},
    Extension, Json,
};
use dealhub_core::{SearchFilters, SearchRequest, SearchResponse, SortField};
use dealhub_pipeline::AggregateError;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    pub q: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub max_price: Option<Decimal>,
    pub min_discount: Option<u8>,
    pub sort: Option<String>,
    pub limit: Option<usize>,
}

impl SearchQuery {
    fn into_request(self) -> Result<SearchRequest, String> {
        let query = self
            .q
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .ok_or_else(|| "query parameter 'q' is required".to_string())?;

        let sort = match self.sort.as_deref().map(str::trim) {
            None | Some("") => SortField::default(),
            Some(raw) => raw.parse::<SortField>()?,
        };

        Ok(SearchRequest {
            query,
            filters: SearchFilters {
                brand: non_blank(self.brand),
                category: non_blank(self.category),
                max_price: self.max_price,
                min_discount: self.min_discount,
            },
            sort,
            limit: self.limit,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(super) async fn search_deals(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<SearchResponse>>, ApiError> {
    let request = query
        .into_request()
        .map_err(|message| ApiError::new(req_id.0.clone(), "validation_error", message))?;

    let data = state
        .aggregator
        .search(&request)
        .await
        .map_err(|e| map_aggregate_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn map_aggregate_error(request_id: String, error: &AggregateError) -> ApiError {
    match error {
        AggregateError::NoSourcesConfigured => {
            tracing::warn!("search requested but no sources are configured");
            ApiError::new(request_id, "service_unavailable", error.to_string())
        }
        other => {
            tracing::error!(error = %other, "aggregate search failed");
            ApiError::new(request_id, "internal_error", "aggregate search failed")
        }
    }
}
