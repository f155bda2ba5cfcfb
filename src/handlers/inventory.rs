// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::{double_option, validate_not_blank},
    middleware::{
        i18n::Locale,
        session::{RequireAdmin, SessionUser},
    },
    models::{
        dashboard::CategoryWithCount,
        inventory::{
            Category, Item, ItemAssignment, ItemFilter, ItemPatch, ItemStatus, ItemType,
            LoanReceipt, MaintenanceInput, MaintenanceLog, NewItem,
        },
    },
};

// =============================================================================
//  1. CATEGORIAS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryPayload {
    // Vazio/ausente vira "Ny kategori"
    #[schema(example = "Handverktyg")]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "Beskrivningen är för lång."))]
    pub description: Option<String>,
}

// POST /api/categories
#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "Inventory",
    request_body = CreateCategoryPayload,
    responses(
        (status = 201, description = "Kategori skapad", body = Category),
        (status = 403, description = "Kräver administratör")
    ),
    security(("session" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireAdmin,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let category = app_state
        .catalog_service
        .create_category(payload.name.as_deref(), payload.description.as_deref())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(category)))
}

// GET /api/categories
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Inventory",
    responses(
        (status = 200, description = "Kategorier med antal objekt", body = Vec<CategoryWithCount>)
    )
)]
pub async fn get_all_categories(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let categories = app_state
        .query_service
        .categories_with_counts()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(categories)))
}

// =============================================================================
//  2. ITENS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemPayload {
    #[validate(custom(function = "validate_not_blank"))]
    #[schema(example = "Borrmaskin Bosch")]
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    #[schema(example = "BOS-18V-001")]
    pub serial_number: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub last_checked: Option<NaiveDate>,
    pub item_type: Option<ItemType>,
}

impl From<CreateItemPayload> for NewItem {
    fn from(p: CreateItemPayload) -> Self {
        NewItem {
            name: p.name.trim().to_string(),
            description: p.description,
            category_id: p.category_id,
            serial_number: p.serial_number,
            purchase_date: p.purchase_date,
            last_checked: p.last_checked,
            item_type: p.item_type,
        }
    }
}

// POST /api/items
#[utoipa::path(
    post,
    path = "/api/items",
    tag = "Inventory",
    request_body = CreateItemPayload,
    responses(
        (status = 201, description = "Objekt skapat", body = Item),
        (status = 404, description = "Kategorin finns inte")
    ),
    security(("session" = []))
)]
pub async fn create_item(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireAdmin(admin): RequireAdmin,
    Json(payload): Json<CreateItemPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let item = app_state
        .lifecycle_service
        .create_item(payload.into(), admin.id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(item)))
}

// GET /api/items?categoryId=&status=&itemType=
#[utoipa::path(
    get,
    path = "/api/items",
    tag = "Inventory",
    params(ItemFilter),
    responses(
        (status = 200, description = "Objekt (filter kombineras med AND)", body = Vec<Item>)
    )
)]
pub async fn get_all_items(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<ItemFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let items = app_state
        .query_service
        .items_filtered(&filter)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(items)))
}

// Ausente = mantém; `null` = limpa (nos campos opcionais)
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemPayload {
    #[validate(custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub category_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub serial_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub purchase_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub last_checked: Option<Option<NaiveDate>>,
    pub item_type: Option<ItemType>,
}

impl From<UpdateItemPayload> for ItemPatch {
    fn from(p: UpdateItemPayload) -> Self {
        ItemPatch {
            name: p.name.map(|n| n.trim().to_string()),
            description: p.description,
            category_id: p.category_id,
            serial_number: p.serial_number,
            purchase_date: p.purchase_date,
            last_checked: p.last_checked,
            item_type: p.item_type,
        }
    }
}

// PATCH /api/items/{id}
#[utoipa::path(
    patch,
    path = "/api/items/{id}",
    tag = "Inventory",
    request_body = UpdateItemPayload,
    responses(
        (status = 200, description = "Objekt uppdaterat", body = Item),
        (status = 404, description = "Objektet eller kategorin finns inte")
    ),
    params(
        ("id" = Uuid, Path, description = "Objektets id")
    ),
    security(("session" = []))
)]
pub async fn update_item(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireAdmin(admin): RequireAdmin,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateItemPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let item = app_state
        .lifecycle_service
        .update_item(item_id, payload.into(), admin.id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(item)))
}

// =============================================================================
//  3. UTLÅNING (CHECKOUT / CHECKIN)
// =============================================================================

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPayload {
    // Ausente = o próprio usuário da sessão pega o item
    pub user_id: Option<Uuid>,
}

// POST /api/items/{id}/checkout
#[utoipa::path(
    post,
    path = "/api/items/{id}/checkout",
    tag = "Inventory",
    request_body = CheckoutPayload,
    responses(
        (status = 200, description = "Objektet har checkats ut", body = LoanReceipt),
        (status = 404, description = "Objektet eller användaren finns inte"),
        (status = 409, description = "Objektet är redan utcheckat eller otillgängligt")
    ),
    params(
        ("id" = Uuid, Path, description = "Objektets id")
    ),
    security(("session" = []))
)]
pub async fn checkout_item(
    State(app_state): State<AppState>,
    locale: Locale,
    SessionUser(session): SessionUser,
    Path(item_id): Path<Uuid>,
    payload: Option<Json<CheckoutPayload>>,
) -> Result<impl IntoResponse, ApiError> {
    let borrower = payload
        .and_then(|Json(p)| p.user_id)
        .unwrap_or(session.id);

    let receipt = app_state
        .lifecycle_service
        .checkout(item_id, borrower)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(receipt)))
}

// POST /api/items/{id}/checkin
#[utoipa::path(
    post,
    path = "/api/items/{id}/checkin",
    tag = "Inventory",
    responses(
        (status = 200, description = "Objektet har checkats in", body = LoanReceipt),
        (status = 409, description = "Objektet är inte utcheckat")
    ),
    params(
        ("id" = Uuid, Path, description = "Objektets id")
    ),
    security(("session" = []))
)]
pub async fn checkin_item(
    State(app_state): State<AppState>,
    locale: Locale,
    _session: SessionUser,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = app_state
        .lifecycle_service
        .checkin(item_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(receipt)))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusPayload {
    #[schema(example = "maintenance")]
    pub status: ItemStatus,
}

// POST /api/items/{id}/status
#[utoipa::path(
    post,
    path = "/api/items/{id}/status",
    tag = "Inventory",
    request_body = SetStatusPayload,
    responses(
        (status = 200, description = "Status ändrad", body = Item),
        (status = 422, description = "Otillåten statusändring")
    ),
    params(
        ("id" = Uuid, Path, description = "Objektets id")
    ),
    security(("session" = []))
)]
pub async fn set_item_status(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireAdmin(admin): RequireAdmin,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<SetStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let item = app_state
        .lifecycle_service
        .set_status_override(item_id, payload.status, admin.id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(item)))
}

// =============================================================================
//  4. UNDERHÅLL (MANUTENÇÃO)
// =============================================================================

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogMaintenancePayload {
    // Ausente = o usuário da sessão fez a manutenção
    pub user_id: Option<Uuid>,
    pub maintenance_date: Option<NaiveDate>,
    #[validate(length(max = 2000, message = "Beskrivningen är för lång."))]
    #[schema(example = "Byte av kolborstar")]
    pub description: Option<String>,
    pub next_maintenance_date: Option<NaiveDate>,
}

// POST /api/items/{id}/maintenance
#[utoipa::path(
    post,
    path = "/api/items/{id}/maintenance",
    tag = "Inventory",
    request_body = LogMaintenancePayload,
    responses(
        (status = 201, description = "Underhåll registrerat", body = MaintenanceLog)
    ),
    params(
        ("id" = Uuid, Path, description = "Objektets id")
    ),
    security(("session" = []))
)]
pub async fn log_maintenance(
    State(app_state): State<AppState>,
    locale: Locale,
    SessionUser(session): SessionUser,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<LogMaintenancePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let input = MaintenanceInput {
        user_id: Some(payload.user_id.unwrap_or(session.id)),
        maintenance_date: payload.maintenance_date,
        description: payload.description,
        next_maintenance_date: payload.next_maintenance_date,
    };

    let log = app_state
        .lifecycle_service
        .log_maintenance(item_id, input)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(log)))
}

// GET /api/items/{id}/maintenance
#[utoipa::path(
    get,
    path = "/api/items/{id}/maintenance",
    tag = "Inventory",
    responses(
        (status = 200, description = "Underhållshistorik för objektet", body = Vec<MaintenanceLog>)
    ),
    params(("id" = Uuid, Path, description = "Objektets id"))
)]
pub async fn get_item_maintenance(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let logs = app_state
        .query_service
        .maintenance_history(Some(item_id))
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(logs)))
}

// GET /api/maintenance
#[utoipa::path(
    get,
    path = "/api/maintenance",
    tag = "Inventory",
    responses(
        (status = 200, description = "All underhållshistorik", body = Vec<MaintenanceLog>)
    )
)]
pub async fn get_all_maintenance(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let logs = app_state
        .query_service
        .maintenance_history(None)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(logs)))
}

// =============================================================================
//  5. EMPRÉSTIMOS (LEITURA)
// =============================================================================

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AssignmentsQuery {
    pub user_id: Option<Uuid>,
    // true = só devolvidos; padrão = só abertos
    #[serde(default)]
    pub returned: bool,
}

// GET /api/assignments?userId=&returned=
#[utoipa::path(
    get,
    path = "/api/assignments",
    tag = "Inventory",
    params(AssignmentsQuery),
    responses(
        (status = 200, description = "Aktiva eller återlämnade utlåningar", body = Vec<ItemAssignment>)
    )
)]
pub async fn get_assignments(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<AssignmentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let assignments = if query.returned {
        app_state.query_service.closed_assignments(query.user_id).await
    } else {
        app_state.query_service.open_assignments(query.user_id).await
    }
    .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::OK, Json(assignments)))
}
