use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit_best_effort,
    dto::transactions::{
        CreateTransactionRequest, InvoiceUrlResponse, TransactionList, WebhookAck, WebhookPayload,
    },
    entity::{
        listings::{Column as ListingCol, Entity as Listings},
        transactions::{
            ActiveModel as TrxActive, Column as TrxCol, Entity as Transactions,
            Model as TrxModel,
        },
    },
    error::{AppError, AppResult},
    gateway::{CreateInvoiceRequest, external_id_for, parse_external_id},
    middleware::auth::{AuthUser, ensure_admin},
    models::{OrderStatus, PaymentStatus, Transaction, is_admin_role},
    response::{ApiResponse, Meta},
    routes::params::TransactionListQuery,
    services::auth_service,
    state::AppState,
};

/// Payment-status value the gateway sends for a settled invoice.
pub const GATEWAY_PAID_STATUS: &str = "PAID";

/// Create a pending transaction, decrementing listing stock atomically.
///
/// The stock check and decrement are a single conditional UPDATE
/// (`stock = stock - qty WHERE stock >= qty`) inside one database
/// transaction; a zero affected-row count is the overselling signal. No
/// optimistic-locking loop exists above this, the database is the sole
/// arbiter of concurrent checkouts.
///
/// Banned buyers are refused regardless of their token, and a repeated
/// `idempotency_key` returns the first attempt's row rather than selling
/// the item twice.
pub async fn create_transaction(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTransactionRequest,
) -> AppResult<ApiResponse<Transaction>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest("Quantity must be positive".into()));
    }

    // The JWT says nothing about bans issued after login.
    auth_service::ensure_not_banned(&state.pool, user.user_id).await?;

    // A resubmitted key means the first attempt already went through; hand
    // back that transaction instead of decrementing stock again.
    if let Some(key) = payload.idempotency_key {
        if let Some(existing) = find_by_idempotency_key(state, user.user_id, key).await? {
            return Ok(created_response(existing));
        }
    }

    let txn = state.orm.begin().await?;

    let listing = Listings::find_by_id(payload.listing_id).one(&txn).await?;
    let listing = match listing {
        Some(l) => l,
        None => return Err(AppError::NotFound),
    };
    if listing.status != "active" {
        return Err(AppError::BadRequest("Listing is not active".into()));
    }
    if listing.seller_id == user.user_id {
        return Err(AppError::BadRequest("Cannot buy your own listing".into()));
    }

    let result = Listings::update_many()
        .col_expr(
            ListingCol::Stock,
            Expr::col(ListingCol::Stock).sub(payload.quantity),
        )
        .filter(
            Condition::all()
                .add(ListingCol::Id.eq(listing.id))
                .add(ListingCol::Stock.gte(payload.quantity)),
        )
        .exec(&txn)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::InsufficientStock);
    }

    let amount = listing.price * (payload.quantity as i64);

    let inserted = TrxActive {
        id: Set(Uuid::new_v4()),
        listing_id: Set(listing.id),
        buyer_id: Set(user.user_id),
        seller_id: Set(listing.seller_id),
        quantity: Set(payload.quantity),
        amount: Set(amount),
        status_order: Set(OrderStatus::Pending.as_str().into()),
        status_payment: Set(PaymentStatus::Unpaid.as_str().into()),
        payment_link_url: Set(None),
        idempotency_key: Set(payload.idempotency_key),
        paid_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await;

    let trx = match inserted {
        Ok(t) => t,
        Err(err) => {
            // Two concurrent submits with the same key can both pass the
            // lookup above; the unique index lets exactly one insert win.
            // Rolling back undoes this attempt's decrement, then the
            // winner's row is returned.
            txn.rollback().await?;
            if let Some(key) = payload.idempotency_key {
                if let Some(existing) = find_by_idempotency_key(state, user.user_id, key).await? {
                    return Ok(created_response(existing));
                }
            }
            return Err(err.into());
        }
    };

    txn.commit().await?;

    log_audit_best_effort(
        &state.pool,
        Some(user.user_id),
        "transaction_create",
        Some("transactions"),
        Some(serde_json::json!({ "transaction_id": trx.id, "listing_id": listing.id })),
    )
    .await;

    Ok(created_response(trx))
}

fn created_response(trx: TrxModel) -> ApiResponse<Transaction> {
    ApiResponse::success(
        "Transaction created",
        transaction_from_entity(trx),
        Some(Meta::empty()),
    )
}

async fn find_by_idempotency_key(
    state: &AppState,
    buyer_id: Uuid,
    key: Uuid,
) -> AppResult<Option<TrxModel>> {
    Ok(Transactions::find()
        .filter(TrxCol::BuyerId.eq(buyer_id))
        .filter(TrxCol::IdempotencyKey.eq(key))
        .one(&state.orm)
        .await?)
}

/// Mint a hosted payment page for a pending transaction and persist its URL.
pub async fn request_invoice(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<InvoiceUrlResponse>> {
    let trx = Transactions::find_by_id(id).one(&state.orm).await?;
    let trx = match trx {
        Some(t) => t,
        None => return Err(AppError::NotFound),
    };
    if trx.buyer_id != user.user_id {
        return Err(AppError::Forbidden);
    }
    if trx.status_payment == PaymentStatus::Paid.as_str() {
        return Err(AppError::BadRequest("Transaction already paid".into()));
    }

    // A URL was already minted; the external reference is deterministic, so
    // there is nothing to gain from asking the gateway again.
    if let Some(url) = trx.payment_link_url.clone() {
        return Ok(ApiResponse::success(
            "Invoice ready",
            InvoiceUrlResponse { payment_url: url },
            Some(Meta::empty()),
        ));
    }

    let listing = Listings::find_by_id(trx.listing_id).one(&state.orm).await?;
    let listing = match listing {
        Some(l) => l,
        None => return Err(AppError::NotFound),
    };

    let payer_email = auth_service::email_for(&state.pool, trx.buyer_id).await?;
    let base = state.config.public_base_url.trim_end_matches('/');

    let invoice = state
        .gateway
        .create_invoice(&CreateInvoiceRequest {
            external_id: external_id_for(trx.id),
            payer_email,
            description: format!("{} x{}", listing.title, trx.quantity),
            amount: trx.amount,
            success_redirect_url: format!("{base}/checkout/success?trx={}", trx.id),
            failure_redirect_url: format!("{base}/checkout/failed?trx={}", trx.id),
            callback_url: format!("{base}/api/webhooks/payment"),
        })
        .await?;

    // The invoice now exists at the gateway. If this update fails the two
    // sides disagree until an operator reconciles them, so surface it with
    // a distinct message rather than a generic 500.
    let mut active: TrxActive = trx.into();
    active.payment_link_url = Set(Some(invoice.invoice_url.clone()));
    active.updated_at = Set(Utc::now().into());
    active
        .update(&state.orm)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, transaction_id = %id, "invoice minted but not persisted");
            AppError::Internal(anyhow::anyhow!("failed to update transaction"))
        })?;

    Ok(ApiResponse::success(
        "Invoice created",
        InvoiceUrlResponse {
            payment_url: invoice.invoice_url,
        },
        Some(Meta::empty()),
    ))
}

/// Webhook reconciliation. Only the gateway's PAID signal advances state;
/// every other status is recorded and acknowledged so the gateway stops
/// retrying. Replayed PAID callbacks are no-ops.
pub async fn handle_webhook(
    state: &AppState,
    payload: WebhookPayload,
) -> AppResult<ApiResponse<WebhookAck>> {
    let transaction_id = parse_external_id(&payload.external_id)?;

    if payload.status != GATEWAY_PAID_STATUS {
        tracing::warn!(
            external_id = %payload.external_id,
            status = %payload.status,
            "ignoring unrecognized webhook status"
        );
        log_audit_best_effort(
            &state.pool,
            None,
            "webhook_ignored",
            Some("transactions"),
            Some(serde_json::json!({
                "transaction_id": transaction_id,
                "status": payload.status,
            })),
        )
        .await;
        return Ok(ack());
    }

    let trx = Transactions::find_by_id(transaction_id).one(&state.orm).await?;
    let trx = match trx {
        Some(t) => t,
        None => {
            // A stray callback; acknowledging beats a gateway retry storm.
            tracing::warn!(%transaction_id, "webhook for unknown transaction");
            log_audit_best_effort(
                &state.pool,
                None,
                "webhook_unknown_transaction",
                Some("transactions"),
                Some(serde_json::json!({ "transaction_id": transaction_id })),
            )
            .await;
            return Ok(ack());
        }
    };

    // Replays land here once the first delivery has settled the payment.
    // Re-applying would also regress status_order after a later deliver,
    // so a settled transaction is left untouched.
    if trx.status_payment == PaymentStatus::Paid.as_str() {
        tracing::debug!(%transaction_id, "webhook replay for settled transaction");
        return Ok(ack());
    }

    let mut active: TrxActive = trx.into();
    active.status_payment = Set(PaymentStatus::Paid.as_str().into());
    active.status_order = Set(OrderStatus::Paid.as_str().into());
    active.paid_at = Set(Some(Utc::now().into()));
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    tracing::info!(%transaction_id, "payment settled via webhook");
    Ok(ack())
}

fn ack() -> ApiResponse<WebhookAck> {
    ApiResponse::success("OK", WebhookAck { success: true }, Some(Meta::empty()))
}

/// Seller marks a paid transaction as delivered.
pub async fn deliver(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Transaction>> {
    let trx = find_transaction(state, id).await?;
    if trx.seller_id != user.user_id {
        return Err(AppError::Forbidden);
    }
    if trx.status_order != OrderStatus::Paid.as_str() {
        return Err(AppError::BadRequest("Order not paid".into()));
    }

    let trx = set_order_status(state, trx, OrderStatus::Delivered).await?;

    log_audit_best_effort(
        &state.pool,
        Some(user.user_id),
        "transaction_deliver",
        Some("transactions"),
        Some(serde_json::json!({ "transaction_id": trx.id })),
    )
    .await;
    notify_party(
        state,
        trx.buyer_id,
        "Your order was delivered",
        &format!(
            "The seller marked order {} as delivered. Please confirm receipt.",
            trx.id
        ),
    )
    .await;

    Ok(ApiResponse::success(
        "Order delivered",
        transaction_from_entity(trx),
        Some(Meta::empty()),
    ))
}

/// Buyer confirms receipt of a delivered transaction.
pub async fn confirm(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Transaction>> {
    let trx = find_transaction(state, id).await?;
    if trx.buyer_id != user.user_id {
        return Err(AppError::Forbidden);
    }
    if trx.status_order != OrderStatus::Delivered.as_str() {
        return Err(AppError::BadRequest("Order not delivered yet".into()));
    }

    let trx = set_order_status(state, trx, OrderStatus::Confirmed).await?;

    log_audit_best_effort(
        &state.pool,
        Some(user.user_id),
        "transaction_confirm",
        Some("transactions"),
        Some(serde_json::json!({ "transaction_id": trx.id })),
    )
    .await;
    notify_party(
        state,
        trx.seller_id,
        "Buyer confirmed your delivery",
        &format!("Order {} was confirmed by the buyer and awaits approval.", trx.id),
    )
    .await;

    Ok(ApiResponse::success(
        "Order confirmed",
        transaction_from_entity(trx),
        Some(Meta::empty()),
    ))
}

/// Admin releases a confirmed transaction; terminal state.
pub async fn approve(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Transaction>> {
    ensure_admin(user)?;
    let trx = find_transaction(state, id).await?;
    if trx.status_order != OrderStatus::Confirmed.as_str() {
        return Err(AppError::BadRequest("Order not confirmed by buyer".into()));
    }

    let trx = set_order_status(state, trx, OrderStatus::Approved).await?;

    log_audit_best_effort(
        &state.pool,
        Some(user.user_id),
        "transaction_approve",
        Some("transactions"),
        Some(serde_json::json!({ "transaction_id": trx.id })),
    )
    .await;
    notify_party(
        state,
        trx.seller_id,
        "Order approved",
        &format!("Order {} was approved. Funds are released.", trx.id),
    )
    .await;

    Ok(ApiResponse::success(
        "Order approved",
        transaction_from_entity(trx),
        Some(Meta::empty()),
    ))
}

pub async fn list_transactions(
    state: &AppState,
    user: &AuthUser,
    query: TransactionListQuery,
) -> AppResult<ApiResponse<TransactionList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all().add(
        Condition::any()
            .add(TrxCol::BuyerId.eq(user.user_id))
            .add(TrxCol::SellerId.eq(user.user_id)),
    );
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

pub async fn get_transaction(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Transaction>> {
    let trx = find_transaction(state, id).await?;
    let is_party = trx.buyer_id == user.user_id || trx.seller_id == user.user_id;
    if !is_party && !is_admin_role(&user.role) {
        return Err(AppError::Forbidden);
    }
    Ok(ApiResponse::success(
        "Transaction",
        transaction_from_entity(trx),
        Some(Meta::empty()),
    ))
}

async fn find_transaction(state: &AppState, id: Uuid) -> AppResult<TrxModel> {
    let trx = Transactions::find_by_id(id).one(&state.orm).await?;
    match trx {
        Some(t) => Ok(t),
        None => Err(AppError::NotFound),
    }
}

async fn set_order_status(
    state: &AppState,
    trx: TrxModel,
    status: OrderStatus,
) -> AppResult<TrxModel> {
    let mut active: TrxActive = trx.into();
    active.status_order = Set(status.as_str().into());
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(&state.orm).await?)
}

async fn notify_party(state: &AppState, user_id: Uuid, subject: &str, body: &str) {
    match auth_service::email_for(&state.pool, user_id).await {
        Ok(email) => {
            state
                .notifier
                .send(&state.pool, user_id, &email, subject, body)
                .await;
        }
        Err(err) => {
            tracing::warn!(error = %err, %user_id, "could not resolve email for notification");
        }
    }
}

pub fn transaction_from_entity(model: TrxModel) -> Transaction {
    Transaction {
        id: model.id,
        listing_id: model.listing_id,
        buyer_id: model.buyer_id,
        seller_id: model.seller_id,
        quantity: model.quantity,
        amount: model.amount,
        status_order: model.status_order,
        status_payment: model.status_payment,
        payment_link_url: model.payment_link_url,
        paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
