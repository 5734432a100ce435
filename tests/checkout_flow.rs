mod common;

use common::*;
use gamemart_api::{
    dto::transactions::{CreateTransactionRequest, WebhookPayload},
    error::AppError,
    services::transaction_service,
};
use uuid::Uuid;

// Full escrow flow: create -> invoice -> webhook PAID -> deliver -> confirm
// -> approve, with stock and audit assertions along the way.
#[tokio::test]
async fn checkout_happy_path_reaches_approved() -> anyhow::Result<()> {
    let gateway_url = spawn_mock_gateway().await?;
    let Some(state) = setup_state(&gateway_url).await? else {
        return Ok(());
    };

    let seller = create_user(&state, "user", "seller@example.com").await?;
    let buyer = create_user(&state, "user", "buyer@example.com").await?;
    let admin = create_user(&state, "admin", "admin@example.com").await?;

    let listing_id = create_listing(&state, seller.user_id, "Abyss Greatsword", 1000, 5).await?;

    // Create: stock 5 -> 4, pending/unpaid.
    let resp = transaction_service::create_transaction(
        &state,
        &buyer,
        CreateTransactionRequest {
            listing_id,
            quantity: 1,
            idempotency_key: None,
        },
    )
    .await?;
    let trx = resp.data.unwrap();
    assert_eq!(trx.status_order, "pending");
    assert_eq!(trx.status_payment, "unpaid");
    assert_eq!(trx.amount, 1000);
    assert_eq!(stock_of(&state, listing_id).await?, 4);

    // Invoice: URL minted at the mock gateway and persisted.
    let invoice = transaction_service::request_invoice(&state, &buyer, trx.id).await?;
    let payment_url = invoice.data.unwrap().payment_url;
    assert!(payment_url.contains(&format!("trx-{}", trx.id)));

    let persisted: (Option<String>,) =
        sqlx::query_as("SELECT payment_link_url FROM transactions WHERE id = $1")
            .bind(trx.id)
            .fetch_one(&state.pool)
            .await?;
    assert_eq!(persisted.0.as_deref(), Some(payment_url.as_str()));

    // Asking again returns the stored URL without re-minting.
    let again = transaction_service::request_invoice(&state, &buyer, trx.id).await?;
    assert_eq!(again.data.unwrap().payment_url, payment_url);

    // Webhook settles the payment.
    let payload = WebhookPayload {
        external_id: format!("trx-{}", trx.id),
        status: "PAID".into(),
    };
    let ack = transaction_service::handle_webhook(&state, payload.clone()).await?;
    assert!(ack.data.unwrap().success);
    assert_eq!(
        order_status(&state, trx.id).await?,
        ("paid".into(), "paid".into())
    );

    // Replay must be a no-op, not an error.
    transaction_service::handle_webhook(&state, payload).await?;
    assert_eq!(
        order_status(&state, trx.id).await?,
        ("paid".into(), "paid".into())
    );

    // Seller delivers, buyer confirms, admin approves.
    transaction_service::deliver(&state, &seller, trx.id).await?;
    assert_eq!(order_status(&state, trx.id).await?.0, "delivered");

    transaction_service::confirm(&state, &buyer, trx.id).await?;
    assert_eq!(order_status(&state, trx.id).await?.0, "confirmed");

    let audits: (i64,) = sqlx::query_as(
        "SELECT count(*) FROM audit_logs WHERE action = 'transaction_confirm' AND user_id = $1",
    )
    .bind(buyer.user_id)
    .fetch_one(&state.pool)
    .await?;
    assert_eq!(audits.0, 1, "confirm must leave an audit row");

    transaction_service::approve(&state, &admin, trx.id).await?;
    assert_eq!(order_status(&state, trx.id).await?.0, "approved");

    Ok(())
}

#[tokio::test]
async fn checkout_with_no_stock_fails_cleanly() -> anyhow::Result<()> {
    let Some(state) = setup_state("http://127.0.0.1:1").await? else {
        return Ok(());
    };

    let seller = create_user(&state, "user", "seller2@example.com").await?;
    let buyer = create_user(&state, "user", "buyer2@example.com").await?;
    let listing_id = create_listing(&state, seller.user_id, "Sold-out relic", 1000, 0).await?;

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

    assert!(matches!(err, AppError::InsufficientStock));
    assert_eq!(stock_of(&state, listing_id).await?, 0);
    assert_eq!(transaction_count(&state, listing_id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn double_submit_with_same_key_sells_once() -> anyhow::Result<()> {
    let Some(state) = setup_state("http://127.0.0.1:1").await? else {
        return Ok(());
    };

    let seller = create_user(&state, "user", "seller4@example.com").await?;
    let buyer = create_user(&state, "user", "buyer4@example.com").await?;
    let listing_id = create_listing(&state, seller.user_id, "Twice-clicked item", 800, 5).await?;

    let key = Uuid::new_v4();
    let first = transaction_service::create_transaction(
        &state,
        &buyer,
        CreateTransactionRequest {
            listing_id,
            quantity: 2,
            idempotency_key: Some(key),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(stock_of(&state, listing_id).await?, 3);

    // The retry lands on the same row; stock stays where it was.
    let second = transaction_service::create_transaction(
        &state,
        &buyer,
        CreateTransactionRequest {
            listing_id,
            quantity: 2,
            idempotency_key: Some(key),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(stock_of(&state, listing_id).await?, 3);
    assert_eq!(transaction_count(&state, listing_id).await?, 1);

    // A fresh key is a genuine second purchase.
    transaction_service::create_transaction(
        &state,
        &buyer,
        CreateTransactionRequest {
            listing_id,
            quantity: 1,
            idempotency_key: Some(Uuid::new_v4()),
        },
    )
    .await?;
    assert_eq!(stock_of(&state, listing_id).await?, 2);
    assert_eq!(transaction_count(&state, listing_id).await?, 2);

    Ok(())
}

#[tokio::test]
async fn oversized_quantity_does_not_decrement() -> anyhow::Result<()> {
    let Some(state) = setup_state("http://127.0.0.1:1").await? else {
        return Ok(());
    };

    let seller = create_user(&state, "user", "seller3@example.com").await?;
    let buyer = create_user(&state, "user", "buyer3@example.com").await?;
    let listing_id = create_listing(&state, seller.user_id, "Scarce item", 500, 3).await?;

    let err = transaction_service::create_transaction(
        &state,
        &buyer,
        CreateTransactionRequest {
            listing_id,
            quantity: 4,
            idempotency_key: None,
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::InsufficientStock));
    assert_eq!(stock_of(&state, listing_id).await?, 3);
    assert_eq!(transaction_count(&state, listing_id).await?, 0);

    // A valid purchase still goes through afterwards.
    transaction_service::create_transaction(
        &state,
        &buyer,
        CreateTransactionRequest {
            listing_id,
            quantity: 3,
            idempotency_key: None,
        },
    )
    .await?;
    assert_eq!(stock_of(&state, listing_id).await?, 0);
    assert_eq!(transaction_count(&state, listing_id).await?, 1);

    Ok(())
}
