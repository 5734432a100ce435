mod common;

use common::*;
use gamemart_api::{
    dto::transactions::{CreateTransactionRequest, WebhookPayload},
    error::AppError,
    middleware::auth::AuthUser,
    services::transaction_service,
    state::AppState,
};
use uuid::Uuid;

async fn pending_transaction(
    state: &AppState,
    seller: &AuthUser,
    buyer: &AuthUser,
    title: &str,
) -> anyhow::Result<Uuid> {
    let listing_id = create_listing(state, seller.user_id, title, 1000, 5).await?;
    let resp = transaction_service::create_transaction(
        state,
        buyer,
        CreateTransactionRequest {
            listing_id,
            quantity: 1,
            idempotency_key: None,
        },
    )
    .await?;
    Ok(resp.data.unwrap().id)
}

async fn settle_payment(state: &AppState, trx_id: Uuid) -> anyhow::Result<()> {
    transaction_service::handle_webhook(
        state,
        WebhookPayload {
            external_id: format!("trx-{trx_id}"),
            status: "PAID".into(),
        },
    )
    .await?;
    Ok(())
}

#[tokio::test]
async fn transitions_require_their_predecessor_state() -> anyhow::Result<()> {
    let Some(state) = setup_state("http://127.0.0.1:1").await? else {
        return Ok(());
    };

    let seller = create_user(&state, "user", "sm-seller@example.com").await?;
    let buyer = create_user(&state, "user", "sm-buyer@example.com").await?;
    let admin = create_user(&state, "admin", "sm-admin@example.com").await?;

    let trx_id = pending_transaction(&state, &seller, &buyer, "SM item").await?;

    // deliver requires paid
    let err = transaction_service::deliver(&state, &seller, trx_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref m) if m == "Order not paid"));
    assert_eq!(order_status(&state, trx_id).await?.0, "pending");

    settle_payment(&state, trx_id).await?;

    // confirm requires delivered
    let err = transaction_service::confirm(&state, &buyer, trx_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref m) if m == "Order not delivered yet"));
    assert_eq!(order_status(&state, trx_id).await?.0, "paid");

    // approve requires confirmed
    let err = transaction_service::approve(&state, &admin, trx_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(ref m) if m == "Order not confirmed by buyer"));
    assert_eq!(order_status(&state, trx_id).await?.0, "paid");

    Ok(())
}

#[tokio::test]
async fn transitions_enforce_roles_and_ownership() -> anyhow::Result<()> {
    let Some(state) = setup_state("http://127.0.0.1:1").await? else {
        return Ok(());
    };

    let seller = create_user(&state, "user", "role-seller@example.com").await?;
    let buyer = create_user(&state, "user", "role-buyer@example.com").await?;
    let stranger = create_user(&state, "user", "role-stranger@example.com").await?;

    let trx_id = pending_transaction(&state, &seller, &buyer, "Role item").await?;
    settle_payment(&state, trx_id).await?;

    // Only the seller may deliver.
    let err = transaction_service::deliver(&state, &buyer, trx_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    assert_eq!(order_status(&state, trx_id).await?.0, "paid");

    transaction_service::deliver(&state, &seller, trx_id).await?;

    // Only the buyer may confirm.
    let err = transaction_service::confirm(&state, &stranger, trx_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    assert_eq!(order_status(&state, trx_id).await?.0, "delivered");

    transaction_service::confirm(&state, &buyer, trx_id).await?;

    // Approve is admin-only; state stays confirmed on the failed attempt.
    let err = transaction_service::approve(&state, &buyer, trx_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    assert_eq!(order_status(&state, trx_id).await?.0, "confirmed");

    Ok(())
}

#[tokio::test]
async fn unrecognized_webhook_status_is_recorded_not_applied() -> anyhow::Result<()> {
    let Some(state) = setup_state("http://127.0.0.1:1").await? else {
        return Ok(());
    };

    let seller = create_user(&state, "user", "wh-seller@example.com").await?;
    let buyer = create_user(&state, "user", "wh-buyer@example.com").await?;
    let trx_id = pending_transaction(&state, &seller, &buyer, "WH item").await?;

    let ack = transaction_service::handle_webhook(
        &state,
        WebhookPayload {
            external_id: format!("trx-{trx_id}"),
            status: "EXPIRED".into(),
        },
    )
    .await?;
    assert!(ack.data.unwrap().success);

    // State untouched, but the ignored callback left a trace.
    assert_eq!(
        order_status(&state, trx_id).await?,
        ("pending".into(), "unpaid".into())
    );
    let recorded: (i64,) =
        sqlx::query_as("SELECT count(*) FROM audit_logs WHERE action = 'webhook_ignored'")
            .fetch_one(&state.pool)
            .await?;
    assert_eq!(recorded.0, 1);

    Ok(())
}

#[tokio::test]
async fn webhook_rejects_malformed_external_id() -> anyhow::Result<()> {
    let Some(state) = setup_state("http://127.0.0.1:1").await? else {
        return Ok(());
    };

    let err = transaction_service::handle_webhook(
        &state,
        WebhookPayload {
            external_id: "order-12345".into(),
            status: "PAID".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    Ok(())
}

#[tokio::test]
async fn banned_buyer_cannot_check_out() -> anyhow::Result<()> {
    let Some(state) = setup_state("http://127.0.0.1:1").await? else {
        return Ok(());
    };

    let seller = create_user(&state, "user", "ban-seller@example.com").await?;
    let buyer = create_user(&state, "user", "ban-buyer@example.com").await?;
    let listing_id = create_listing(&state, seller.user_id, "Ban item", 1000, 5).await?;

    // Ban lands after login; the buyer still holds a valid token.
    sqlx::query("UPDATE users SET banned = TRUE WHERE id = $1")
        .bind(buyer.user_id)
        .execute(&state.pool)
        .await?;

    let err = transaction_service::create_transaction(
        &state,
        &buyer,
        CreateTransactionRequest {
            listing_id,
            quantity: 1,
            idempotency_key: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    assert_eq!(stock_of(&state, listing_id).await?, 5);

    Ok(())
}

#[tokio::test]
async fn buying_own_listing_is_rejected() -> anyhow::Result<()> {
    let Some(state) = setup_state("http://127.0.0.1:1").await? else {
        return Ok(());
    };

    let seller = create_user(&state, "user", "own-seller@example.com").await?;
    let listing_id = create_listing(&state, seller.user_id, "Own item", 1000, 5).await?;

    let err = transaction_service::create_transaction(
        &state,
        &seller,
        CreateTransactionRequest {
            listing_id,
            quantity: 1,
            idempotency_key: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(stock_of(&state, listing_id).await?, 5);

    Ok(())
}
