use axum::{Json, Router, routing::post};
use gamemart_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    entity::listings::ActiveModel as ListingActive,
    middleware::auth::AuthUser,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set, Statement};
use uuid::Uuid;

/// Build an AppState against the test database, or None when no database is
/// configured in the environment. Tables are truncated between runs.
pub async fn setup_state(gateway_base_url: &str) -> anyhow::Result<Option<AppState>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests."
                );
                return Ok(None);
            }
        };

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;

    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE notifications, audit_logs, reviews, disputes, cart_items, \
         wishlist_items, transactions, listings, users RESTART IDENTITY CASCADE",
    ))
    .await?;

    let config = AppConfig {
        database_url,
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-jwt-secret".into(),
        public_base_url: "http://localhost:3000".into(),
        gateway_base_url: gateway_base_url.to_string(),
        gateway_secret_key: "test-secret".into(),
        gateway_callback_token: None,
        notifier_url: None,
    };

    Ok(Some(AppState::new(pool, orm, config)?))
}

pub async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, email, username, password_hash, role) VALUES ($1, $2, $3, 'dummy', $4)",
    )
    .bind(id)
    .bind(email)
    .bind(email.split('@').next().unwrap_or("user"))
    .bind(role)
    .execute(&state.pool)
    .await?;

    Ok(AuthUser {
        user_id: id,
        role: role.into(),
    })
}

pub async fn create_listing(
    state: &AppState,
    seller_id: Uuid,
    title: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<Uuid> {
    let listing = ListingActive {
        id: Set(Uuid::new_v4()),
        seller_id: Set(seller_id),
        title: Set(title.into()),
        description: Set(Some("test listing".into())),
        game: Set("Ragnarok Online".into()),
        category: Set("item".into()),
        price: Set(price),
        stock: Set(stock),
        status: Set("active".into()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(listing.id)
}

/// Spawn a stand-in for the gateway's hosted-invoice API on an ephemeral
/// port and return its base URL.
pub async fn spawn_mock_gateway() -> anyhow::Result<String> {
    let app = Router::new().route(
        "/v2/invoices",
        post(|Json(body): Json<serde_json::Value>| async move {
            let external_id = body["external_id"].as_str().unwrap_or("unknown").to_string();
            Json(serde_json::json!({
                "invoice_url": format!("https://pay.example.test/{external_id}")
            }))
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

pub async fn stock_of(state: &AppState, listing_id: Uuid) -> anyhow::Result<i32> {
    let row: (i32,) = sqlx::query_as("SELECT stock FROM listings WHERE id = $1")
        .bind(listing_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(row.0)
}

pub async fn transaction_count(state: &AppState, listing_id: Uuid) -> anyhow::Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT count(*) FROM transactions WHERE listing_id = $1")
        .bind(listing_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(row.0)
}

pub async fn order_status(state: &AppState, transaction_id: Uuid) -> anyhow::Result<(String, String)> {
    let row: (String, String) =
        sqlx::query_as("SELECT status_order, status_payment FROM transactions WHERE id = $1")
            .bind(transaction_id)
            .fetch_one(&state.pool)
            .await?;
    Ok(row)
}
