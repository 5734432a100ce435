use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    dto::disputes::{CreateDisputeRequest, DisputeList},
    entity::{
        disputes::{ActiveModel as DisputeActive, Column as DisputeCol, Entity as Disputes,
            Model as DisputeModel},
        transactions::Entity as Transactions,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Dispute,
    response::{ApiResponse, Meta},
    state::AppState,
};

const MIN_REASON_LEN: usize = 10;

pub async fn create_dispute(
    state: &AppState,
    user: &AuthUser,
    payload: CreateDisputeRequest,
) -> AppResult<ApiResponse<Dispute>> {
    validate_reason(&payload.reason)?;
    if let Some(url) = payload.evidence_url.as_deref() {
        validate_evidence_url(url)?;
    }

    let trx = Transactions::find_by_id(payload.transaction_id)
        .one(&state.orm)
        .await?;
    let trx = match trx {
        Some(t) => t,
        None => return Err(AppError::NotFound),
    };
    if trx.buyer_id != user.user_id && trx.seller_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    let dispute = DisputeActive {
        id: Set(Uuid::new_v4()),
        transaction_id: Set(trx.id),
        user_id: Set(user.user_id),
        reason: Set(payload.reason),
        evidence_url: Set(payload.evidence_url),
        status: Set("pending".into()),
        resolved_by: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Dispute submitted",
        dispute_from_entity(dispute),
        Some(Meta::empty()),
    ))
}

pub async fn list_own_disputes(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DisputeList>> {
    let items = Disputes::find()
        .filter(Condition::all().add(DisputeCol::UserId.eq(user.user_id)))
        .order_by_desc(DisputeCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(dispute_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Disputes",
        DisputeList { items },
        Some(Meta::empty()),
    ))
}

fn validate_reason(reason: &str) -> Result<(), AppError> {
    if reason.trim().chars().count() < MIN_REASON_LEN {
        return Err(AppError::BadRequest(format!(
            "Reason must be at least {MIN_REASON_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_evidence_url(url: &str) -> Result<(), AppError> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|_| AppError::BadRequest("Evidence URL is not a valid URL".into()))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AppError::BadRequest(
            "Evidence URL must use http or https".into(),
        ));
    }
    Ok(())
}

pub fn dispute_from_entity(model: DisputeModel) -> Dispute {
    use chrono::Utc;
    Dispute {
        id: model.id,
        transaction_id: model.transaction_id,
        user_id: model.user_id,
        reason: model.reason,
        evidence_url: model.evidence_url,
        status: model.status,
        resolved_by: model.resolved_by,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_length_enforced() {
        assert!(validate_reason("too short").is_err());
        assert!(validate_reason("item was never delivered to my account").is_ok());
    }

    #[test]
    fn evidence_url_must_be_well_formed() {
        assert!(validate_evidence_url("not a url").is_err());
        assert!(validate_evidence_url("ftp://example.com/x").is_err());
        assert!(validate_evidence_url("https://imgur.com/proof.png").is_ok());
    }
}
