mod common;

use common::*;
use gamemart_api::{
    dto::{
        disputes::{CreateDisputeRequest, ResolveDisputeRequest},
        reviews::CreateReviewRequest,
        transactions::{CreateTransactionRequest, WebhookPayload},
        wishlist::AddWishlistRequest,
    },
    error::AppError,
    middleware::auth::AuthUser,
    routes::admin::{BanUserRequest, ListingStatusRequest},
    services::{admin_service, dispute_service, review_service, transaction_service,
        wishlist_service},
    state::AppState,
};
use uuid::Uuid;

async fn approved_transaction(
    state: &AppState,
    seller: &AuthUser,
    buyer: &AuthUser,
    admin: &AuthUser,
    title: &str,
) -> anyhow::Result<Uuid> {
    let listing_id = create_listing(state, seller.user_id, title, 2000, 5).await?;
    let trx = transaction_service::create_transaction(
        state,
        buyer,
        CreateTransactionRequest {
            listing_id,
            quantity: 1,
            idempotency_key: None,
        },
    )
    .await?
    .data
    .unwrap();
    transaction_service::handle_webhook(
        state,
        WebhookPayload {
            external_id: format!("trx-{}", trx.id),
            status: "PAID".into(),
        },
    )
    .await?;
    transaction_service::deliver(state, seller, trx.id).await?;
    transaction_service::confirm(state, buyer, trx.id).await?;
    transaction_service::approve(state, admin, trx.id).await?;
    Ok(trx.id)
}

#[tokio::test]
async fn reviews_once_per_party_after_approval() -> anyhow::Result<()> {
    let Some(state) = setup_state("http://127.0.0.1:1").await? else {
        return Ok(());
    };

    let seller = create_user(&state, "user", "rv-seller@example.com").await?;
    let buyer = create_user(&state, "user", "rv-buyer@example.com").await?;
    let admin = create_user(&state, "admin", "rv-admin@example.com").await?;

    let trx_id = approved_transaction(&state, &seller, &buyer, &admin, "Review item").await?;

    let review = review_service::create_review(
        &state,
        &buyer,
        CreateReviewRequest {
            transaction_id: trx_id,
            rating: 5,
            comment: Some("fast delivery".into()),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(review.reviewee_id, seller.user_id);

    // Second review by the same reviewer is rejected.
    let err = review_service::create_review(
        &state,
        &buyer,
        CreateReviewRequest {
            transaction_id: trx_id,
            rating: 1,
            comment: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // The seller may leave their own review of the buyer.
    let review = review_service::create_review(
        &state,
        &seller,
        CreateReviewRequest {
            transaction_id: trx_id,
            rating: 4,
            comment: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(review.reviewee_id, buyer.user_id);

    let received = review_service::list_reviews_for_user(&state, seller.user_id)
        .await?
        .data
        .unwrap();
    assert_eq!(received.items.len(), 1);

    Ok(())
}

#[tokio::test]
async fn review_requires_completed_transaction_and_membership() -> anyhow::Result<()> {
    let Some(state) = setup_state("http://127.0.0.1:1").await? else {
        return Ok(());
    };

    let seller = create_user(&state, "user", "rv2-seller@example.com").await?;
    let buyer = create_user(&state, "user", "rv2-buyer@example.com").await?;
    let stranger = create_user(&state, "user", "rv2-stranger@example.com").await?;

    let listing_id = create_listing(&state, seller.user_id, "Pending item", 2000, 5).await?;
    let trx = transaction_service::create_transaction(
        &state,
        &buyer,
        CreateTransactionRequest {
            listing_id,
            quantity: 1,
            idempotency_key: None,
        },
    )
    .await?
    .data
    .unwrap();

    let err = review_service::create_review(
        &state,
        &buyer,
        CreateReviewRequest {
            transaction_id: trx.id,
            rating: 3,
            comment: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = review_service::create_review(
        &state,
        &stranger,
        CreateReviewRequest {
            transaction_id: trx.id,
            rating: 3,
            comment: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    Ok(())
}

#[tokio::test]
async fn dispute_lifecycle_leaves_transaction_untouched() -> anyhow::Result<()> {
    let Some(state) = setup_state("http://127.0.0.1:1").await? else {
        return Ok(());
    };

    let seller = create_user(&state, "user", "dp-seller@example.com").await?;
    let buyer = create_user(&state, "user", "dp-buyer@example.com").await?;
    let admin = create_user(&state, "admin", "dp-admin@example.com").await?;

    let listing_id = create_listing(&state, seller.user_id, "Disputed item", 2000, 5).await?;
    let trx = transaction_service::create_transaction(
        &state,
        &buyer,
        CreateTransactionRequest {
            listing_id,
            quantity: 1,
            idempotency_key: None,
        },
    )
    .await?
    .data
    .unwrap();

    // Too-short reason and malformed evidence are rejected.
    let err = dispute_service::create_dispute(
        &state,
        &buyer,
        CreateDisputeRequest {
            transaction_id: trx.id,
            reason: "bad".into(),
            evidence_url: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let dispute = dispute_service::create_dispute(
        &state,
        &buyer,
        CreateDisputeRequest {
            transaction_id: trx.id,
            reason: "seller never handed over the item".into(),
            evidence_url: Some("https://imgur.com/proof.png".into()),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(dispute.status, "pending");

    // Non-admin cannot adjudicate.
    let err = admin_service::resolve_dispute(
        &state,
        &buyer,
        dispute.id,
        ResolveDisputeRequest {
            status: "refunded".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let resolved = admin_service::resolve_dispute(
        &state,
        &admin,
        dispute.id,
        ResolveDisputeRequest {
            status: "refunded".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(resolved.status, "refunded");
    assert_eq!(resolved.resolved_by, Some(admin.user_id));

    // Adjudication does not drive the order state machine.
    assert_eq!(order_status(&state, trx.id).await?.0, "pending");

    // Re-adjudication is rejected.
    let err = admin_service::resolve_dispute(
        &state,
        &admin,
        dispute.id,
        ResolveDisputeRequest {
            status: "resolved".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    Ok(())
}

#[tokio::test]
async fn wishlist_pair_is_unique() -> anyhow::Result<()> {
    let Some(state) = setup_state("http://127.0.0.1:1").await? else {
        return Ok(());
    };

    let seller = create_user(&state, "user", "wl-seller@example.com").await?;
    let user = create_user(&state, "user", "wl-user@example.com").await?;
    let listing_id = create_listing(&state, seller.user_id, "Wished item", 2000, 5).await?;

    wishlist_service::add_to_wishlist(&state.pool, &user, AddWishlistRequest { listing_id })
        .await?;
    // Duplicate add is a no-op.
    wishlist_service::add_to_wishlist(&state.pool, &user, AddWishlistRequest { listing_id })
        .await?;

    let list = wishlist_service::list_wishlist(&state.pool, &user)
        .await?
        .data
        .unwrap();
    assert_eq!(list.items.len(), 1);

    wishlist_service::remove_from_wishlist(&state.pool, &user, listing_id).await?;
    let err = wishlist_service::remove_from_wishlist(&state.pool, &user, listing_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}

#[tokio::test]
async fn admin_moderation_and_bans() -> anyhow::Result<()> {
    let Some(state) = setup_state("http://127.0.0.1:1").await? else {
        return Ok(());
    };

    let seller = create_user(&state, "user", "mod-seller@example.com").await?;
    let buyer = create_user(&state, "user", "mod-buyer@example.com").await?;
    let admin = create_user(&state, "admin", "mod-admin@example.com").await?;

    let listing_id = create_listing(&state, seller.user_id, "Suspicious item", 2000, 5).await?;

    let listing = admin_service::set_listing_status(
        &state,
        &admin,
        listing_id,
        ListingStatusRequest {
            status: "suspended".into(),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(listing.status, "suspended");

    // Suspended listings cannot be bought.
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
    assert!(matches!(err, AppError::BadRequest(_)));

    // Admin bans the seller; a plain user cannot ban anyone.
    let err = admin_service::set_user_banned(
        &state,
        &buyer,
        seller.user_id,
        BanUserRequest { banned: true },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    admin_service::set_user_banned(
        &state,
        &admin,
        seller.user_id,
        BanUserRequest { banned: true },
    )
    .await?;
    let banned: (bool,) = sqlx::query_as("SELECT banned FROM users WHERE id = $1")
        .bind(seller.user_id)
        .fetch_one(&state.pool)
        .await?;
    assert!(banned.0);

    Ok(())
}
