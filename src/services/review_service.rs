use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    dto::reviews::{CreateReviewRequest, ReviewList},
    entity::{
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews,
            Model as ReviewModel},
        transactions::Entity as Transactions,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{OrderStatus, Review},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// One review per transaction per reviewer, only after the escrow flow
/// completed. There is deliberately no update or delete path.
pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest("Rating must be between 1 and 5".into()));
    }

    let trx = Transactions::find_by_id(payload.transaction_id)
        .one(&state.orm)
        .await?;
    let trx = match trx {
        Some(t) => t,
        None => return Err(AppError::NotFound),
    };

    let reviewee_id = if trx.buyer_id == user.user_id {
        trx.seller_id
    } else if trx.seller_id == user.user_id {
        trx.buyer_id
    } else {
        return Err(AppError::Forbidden);
    };

    if trx.status_order != OrderStatus::Approved.as_str() {
        return Err(AppError::BadRequest(
            "Transaction is not completed yet".into(),
        ));
    }

    let existing = Reviews::find()
        .filter(
            Condition::all()
                .add(ReviewCol::TransactionId.eq(trx.id))
                .add(ReviewCol::ReviewerId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest(
            "Transaction already reviewed".into(),
        ));
    }

    let review = ReviewActive {
        id: Set(Uuid::new_v4()),
        transaction_id: Set(trx.id),
        reviewer_id: Set(user.user_id),
        reviewee_id: Set(reviewee_id),
        rating: Set(payload.rating),
        comment: Set(payload.comment),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Review submitted",
        review_from_entity(review),
        Some(Meta::empty()),
    ))
}

/// Reviews received by a user, newest first. Public.
pub async fn list_reviews_for_user(
    state: &AppState,
    user_id: Uuid,
) -> AppResult<ApiResponse<ReviewList>> {
    let items = Reviews::find()
        .filter(ReviewCol::RevieweeId.eq(user_id))
        .order_by_desc(ReviewCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(review_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Reviews",
        ReviewList { items },
        Some(Meta::empty()),
    ))
}

pub fn review_from_entity(model: ReviewModel) -> Review {
    Review {
        id: model.id,
        transaction_id: model.transaction_id,
        reviewer_id: model.reviewer_id,
        reviewee_id: model.reviewee_id,
        rating: model.rating,
        comment: model.comment,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
