use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit_best_effort,
    dto::disputes::{DisputeList, ResolveDisputeRequest},
    dto::transactions::TransactionList,
    entity::{
        disputes::{ActiveModel as DisputeActive, Column as DisputeCol, Entity as Disputes},
        listings::{ActiveModel as ListingActive, Entity as Listings},
        transactions::{Column as TrxCol, Entity as Transactions},
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Dispute, Listing, Transaction},
    response::{ApiResponse, Meta},
    routes::admin::{BanUserRequest, ListingStatusRequest},
    routes::params::{DisputeListQuery, TransactionListQuery},
    services::dispute_service::dispute_from_entity,
    services::listing_service::listing_from_entity,
    services::transaction_service::transaction_from_entity,
    state::AppState,
};

pub async fn list_all_transactions(
    state: &AppState,
    user: &AuthUser,
    query: TransactionListQuery,
) -> AppResult<ApiResponse<TransactionList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(TrxCol::StatusOrder.eq(status.clone()));
    }

    let finder = Transactions::find()
        .filter(condition)
        .order_by_desc(TrxCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(transaction_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Transactions",
        TransactionList { items },
        Some(meta),
    ))
}

pub async fn get_transaction_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Transaction>> {
    ensure_admin(user)?;
    let trx = Transactions::find_by_id(id).one(&state.orm).await?;
    match trx {
        Some(t) => Ok(ApiResponse::success(
            "Transaction",
            transaction_from_entity(t),
            Some(Meta::empty()),
        )),
        None => Err(AppError::NotFound),
    }
}

pub async fn list_disputes(
    state: &AppState,
    user: &AuthUser,
    query: DisputeListQuery,
) -> AppResult<ApiResponse<DisputeList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(DisputeCol::Status.eq(status.clone()));
    }

    let finder = Disputes::find()
        .filter(condition)
        .order_by_desc(DisputeCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(dispute_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Disputes",
        DisputeList { items },
        Some(meta),
    ))
}

/// Adjudicate a dispute. The transaction state machine is deliberately not
/// touched here: a refund is settled at the gateway by the operator, and
/// the audit row keeps the linkage visible.
pub async fn resolve_dispute(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ResolveDisputeRequest,
) -> AppResult<ApiResponse<Dispute>> {
    ensure_admin(user)?;
    if payload.status != "resolved" && payload.status != "refunded" {
        return Err(AppError::BadRequest(
            "Status must be 'resolved' or 'refunded'".into(),
        ));
    }

    let dispute = Disputes::find_by_id(id).one(&state.orm).await?;
    let dispute = match dispute {
        Some(d) => d,
        None => return Err(AppError::NotFound),
    };
    if dispute.status != "pending" {
        return Err(AppError::BadRequest("Dispute already adjudicated".into()));
    }

    let mut active: DisputeActive = dispute.into();
    active.status = Set(payload.status.clone());
    active.resolved_by = Set(Some(user.user_id));
    active.updated_at = Set(Utc::now().into());
    let dispute = active.update(&state.orm).await?;

    log_audit_best_effort(
        &state.pool,
        Some(user.user_id),
        "dispute_resolve",
        Some("disputes"),
        Some(serde_json::json!({
            "dispute_id": dispute.id,
            "transaction_id": dispute.transaction_id,
            "status": dispute.status,
        })),
    )
    .await;

    Ok(ApiResponse::success(
        "Dispute updated",
        dispute_from_entity(dispute),
        Some(Meta::empty()),
    ))
}

pub async fn set_user_banned(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: BanUserRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let target = Users::find_by_id(id).one(&state.orm).await?;
    let target = match target {
        Some(u) => u,
        None => return Err(AppError::NotFound),
    };
    if target.role == "superadmin" {
        return Err(AppError::Forbidden);
    }
    // Only a superadmin may ban another admin.
    if target.role == "admin" && user.role != "superadmin" {
        return Err(AppError::Forbidden);
    }

    let target_id = target.id;
    let mut active: UserActive = target.into();
    active.banned = Set(payload.banned);
    active.update(&state.orm).await?;

    log_audit_best_effort(
        &state.pool,
        Some(user.user_id),
        if payload.banned { "user_ban" } else { "user_unban" },
        Some("users"),
        Some(serde_json::json!({ "user_id": target_id })),
    )
    .await;

    Ok(ApiResponse::success(
        "User updated",
        serde_json::json!({ "user_id": target_id, "banned": payload.banned }),
        Some(Meta::empty()),
    ))
}

pub async fn set_listing_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ListingStatusRequest,
) -> AppResult<ApiResponse<Listing>> {
    ensure_admin(user)?;
    if payload.status != "active" && payload.status != "suspended" {
        return Err(AppError::BadRequest(
            "Status must be 'active' or 'suspended'".into(),
        ));
    }

    let listing = Listings::find_by_id(id).one(&state.orm).await?;
    let listing = match listing {
        Some(l) => l,
        None => return Err(AppError::NotFound),
    };

    let mut active: ListingActive = listing.into();
    active.status = Set(payload.status.clone());
    active.updated_at = Set(Utc::now().into());
    let listing = active.update(&state.orm).await?;

    log_audit_best_effort(
        &state.pool,
        Some(user.user_id),
        "listing_moderate",
        Some("listings"),
        Some(serde_json::json!({ "listing_id": listing.id, "status": listing.status })),
    )
    .await;

    Ok(ApiResponse::success(
        "Listing updated",
        listing_from_entity(listing),
        Some(Meta::empty()),
    ))
}
