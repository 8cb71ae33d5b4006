use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::form::{clean_int, FormError, FormSchema, ListForm, STANDARD_LIST_TYPE};
use crate::host::{AccessControl, RecordStore};
use crate::models::*;
use crate::view::{
    view_activity, JsonRenderer, RenderedTemplate, RequestContext, Services, ViewError, ViewPage,
};

type ApiError = (StatusCode, String);

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
fn internal_error(e: impl std::fmt::Display) -> ApiError {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn view_error(e: ViewError) -> ApiError {
    match e {
        ViewError::CourseModuleNotFound(_)
        | ViewError::CourseMisconfigured(_)
        | ViewError::InvalidCourseModule(_) => {
            tracing::warn!("View failed: {}", e);
            (StatusCode::NOT_FOUND, e.to_string())
        }
        ViewError::AccessDenied => (StatusCode::FORBIDDEN, e.to_string()),
        ViewError::Internal(e) => internal_error(e),
    }
}

fn form_error(e: FormError) -> Response {
    match e {
        FormError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
        FormError::UnknownListType(_) | FormError::Construction(_) => {
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

fn access_denied() -> ApiError {
    (StatusCode::FORBIDDEN, "Access denied".to_string())
}

/// Resolve a course module and its activity, and require `capability` there.
fn module_context(
    state: &AppState,
    ctx: &RequestContext,
    cmid: i64,
    capability: Capability,
) -> Result<(CourseModule, Activity), ApiError> {
    let cm = state
        .db
        .get_course_module(cmid)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Course module not found".to_string()))?;

    if !state
        .db
        .has_capability(ctx.userid, capability, cm.id)
        .map_err(internal_error)?
    {
        tracing::warn!(userid = ctx.userid, cmid, "Missing capability {}", capability.as_str());
        return Err(access_denied());
    }

    let activity = state
        .db
        .get_activity(cm.instance)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "Activity not found".to_string()))?;

    Ok((cm, activity))
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// View
// ============================================================

pub async fn view_module(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(cmid): Path<i64>,
) -> Result<Json<ViewPage<RenderedTemplate>>, ApiError> {
    view_activity(
        &ctx,
        &state.site,
        Services::from_backend(&state.db),
        &JsonRenderer,
        cmid,
    )
    .map(Json)
    .map_err(view_error)
}

// ============================================================
// Lists
// ============================================================

pub async fn list_lists(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(cmid): Path<i64>,
) -> Result<Json<Vec<List>>, ApiError> {
    let (cm, _) = module_context(&state, &ctx, cmid, Capability::Manage)?;
    state
        .db
        .get_lists_by_module(cm.id)
        .map(Json)
        .map_err(internal_error)
}

/// Query parameters for the list form.
#[derive(Debug, Deserialize)]
pub struct ListFormQuery {
    /// List type tag. Defaults to the standard list type.
    #[serde(rename = "type")]
    pub list_type: Option<String>,
    /// List to edit. Omit for a new list.
    pub listid: Option<i64>,
}

impl ListFormQuery {
    fn tag(&self) -> &str {
        self.list_type.as_deref().unwrap_or(STANDARD_LIST_TYPE)
    }
}

#[derive(Debug, Serialize)]
pub struct ListFormResponse<'a> {
    pub list_type: &'a str,
    pub standard: bool,
    pub form: &'a FormSchema,
}

fn list_in_module(state: &AppState, listid: i64, cmid: i64) -> Result<List, ApiError> {
    state
        .db
        .get_list(listid)
        .map_err(internal_error)?
        .filter(|l| l.moduleid == cmid)
        .ok_or((StatusCode::NOT_FOUND, "List not found".to_string()))
}

pub async fn get_list_form(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(cmid): Path<i64>,
    Query(query): Query<ListFormQuery>,
) -> Result<Response, ApiError> {
    let (cm, activity) = module_context(&state, &ctx, cmid, Capability::Manage)?;

    let mut form = match state.list_types.form_for(query.tag()) {
        Ok(form) => form,
        Err(e) => return Ok(form_error(e)),
    };

    let itemid = query.listid.unwrap_or(0);
    match form.construction_override(itemid, &activity) {
        Ok(true) => {}
        Ok(false) => return Ok(StatusCode::NO_CONTENT.into_response()),
        Err(e) => return Ok(form_error(e)),
    }

    let data: ListFormData = if itemid > 0 {
        list_in_module(&state, itemid, cm.id)?.into()
    } else {
        ListFormData {
            courseid: cm.course,
            moduleid: cm.id,
            ..Default::default()
        }
    };
    form.set_data(&data);

    Ok(Json(form_response(&form)).into_response())
}

fn form_response(form: &ListForm) -> ListFormResponse<'_> {
    ListFormResponse {
        list_type: form.list_type(),
        standard: form.is_standard(),
        form: form.schema(),
    }
}

/// Submitted values arrive as JSON; the form cleans them from their text form.
fn submission_values(body: HashMap<String, serde_json::Value>) -> HashMap<String, String> {
    body.into_iter()
        .map(|(k, v)| {
            let text = match v {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                serde_json::Value::Bool(b) => (if b { "1" } else { "0" }).to_string(),
                other => other.to_string(),
            };
            (k, text)
        })
        .collect()
}

pub async fn submit_list_form(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(cmid): Path<i64>,
    Query(query): Query<ListFormQuery>,
    Json(body): Json<HashMap<String, serde_json::Value>>,
) -> Result<Response, ApiError> {
    let (cm, activity) = module_context(&state, &ctx, cmid, Capability::Manage)?;
    let submitted = submission_values(body);

    let form = match state.list_types.form_for(query.tag()) {
        Ok(form) => form,
        Err(e) => return Ok(form_error(e)),
    };

    let itemid = submitted.get("id").map(|s| clean_int(s)).unwrap_or(0);
    match form.construction_override(itemid, &activity) {
        Ok(true) => {}
        Ok(false) => return Ok(StatusCode::NO_CONTENT.into_response()),
        Err(e) => return Ok(form_error(e)),
    }

    let mut data = match form.validate(&submitted) {
        Ok(data) => data,
        Err(e) => return Ok(form_error(e)),
    };
    // Lists always belong to the module they are submitted to.
    data.courseid = cm.course;
    data.moduleid = cm.id;

    if data.id > 0 {
        list_in_module(&state, data.id, cm.id)?;
        let list = state
            .db
            .update_list(data.id, data)
            .map_err(internal_error)?
            .ok_or((StatusCode::NOT_FOUND, "List not found".to_string()))?;
        tracing::info!(listid = list.id, cmid, "Updated list");
        Ok(Json(list).into_response())
    } else {
        let list = state.db.create_list(data).map_err(internal_error)?;
        tracing::info!(listid = list.id, cmid, "Created list");
        Ok((StatusCode::CREATED, Json(list)).into_response())
    }
}

pub async fn list_levels(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(listid): Path<i64>,
) -> Result<Json<Vec<Level>>, ApiError> {
    let list = state
        .db
        .get_list(listid)
        .map_err(internal_error)?
        .ok_or((StatusCode::NOT_FOUND, "List not found".to_string()))?;

    if !state
        .db
        .has_capability(ctx.userid, Capability::Manage, list.moduleid)
        .map_err(internal_error)?
    {
        return Err(access_denied());
    }

    state
        .db
        .get_levels_for_list(list.id)
        .map(Json)
        .map_err(internal_error)
}
