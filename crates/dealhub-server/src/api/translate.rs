use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

/// Upper bound on texts per request.
const MAX_TEXTS: usize = 100;

#[derive(Debug, Deserialize)]
pub(super) struct TranslateBody {
    pub texts: Vec<String>,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Serialize)]
pub(super) struct TranslateData {
    translations: Vec<String>,
    source_lang: String,
    target_lang: String,
}

pub(super) async fn translate_texts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<TranslateBody>,
) -> Result<Json<ApiResponse<TranslateData>>, ApiError> {
    if body.source_lang.trim().is_empty() || body.target_lang.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "source_lang and target_lang are required",
        ));
    }
    if body.texts.len() > MAX_TEXTS {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("at most {MAX_TEXTS} texts per request"),
        ));
    }

    let translations = state
        .translator
        .batch_translate(&body.texts, &body.source_lang, &body.target_lang)
        .await;

    Ok(Json(ApiResponse {
        data: TranslateData {
            translations,
            source_lang: body.source_lang.trim().to_lowercase(),
            target_lang: body.target_lang.trim().to_lowercase(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
