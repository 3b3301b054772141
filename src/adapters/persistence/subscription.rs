use async_trait::async_trait;
use sqlx::Row;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::subscription::{
        CreateSubscriptionInput, SubscriptionRepo, SubscriptionUpdate,
    },
    domain::entities::subscription::{Subscription, SubscriptionStatus},
};

fn row_to_subscription(row: &sqlx::postgres::PgRow) -> Subscription {
    let status: String = row.get("paddle_status");
    Subscription {
        id: row.get("id"),
        customer_id: row.get("customer_id"),
        name: row.get("name"),
        paddle_id: row.get("paddle_id"),
        paddle_status: SubscriptionStatus::from_paddle(&status),
        paddle_plan: row.get("paddle_plan"),
        quantity: row.get("quantity"),
        trial_ends_at: row.get("trial_ends_at"),
        paused_from: row.get("paused_from"),
        ends_at: row.get("ends_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, customer_id, name, paddle_id, paddle_status, paddle_plan, quantity,
    trial_ends_at, paused_from, ends_at, created_at, updated_at
"#;

#[async_trait]
impl SubscriptionRepo for PostgresPersistence {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_subscription))
    }

    async fn get_by_paddle_id(&self, paddle_id: i64) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE paddle_id = $1 ORDER BY id DESC LIMIT 1",
            SELECT_COLS
        ))
        .bind(paddle_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_subscription))
    }

    async fn list_by_customer(&self, customer_id: i64) -> AppResult<Vec<Subscription>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE customer_id = $1 ORDER BY created_at DESC, id DESC",
            SELECT_COLS
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_subscription).collect())
    }

    async fn upsert(&self, input: &CreateSubscriptionInput) -> AppResult<Subscription> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO subscriptions
                (customer_id, name, paddle_id, paddle_status, paddle_plan, quantity, trial_ends_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (customer_id, paddle_id) DO UPDATE SET
                name = EXCLUDED.name,
                paddle_status = EXCLUDED.paddle_status,
                paddle_plan = EXCLUDED.paddle_plan,
                quantity = EXCLUDED.quantity,
                trial_ends_at = EXCLUDED.trial_ends_at,
                updated_at = CURRENT_TIMESTAMP
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(input.customer_id)
        .bind(&input.name)
        .bind(input.paddle_id)
        .bind(input.paddle_status.as_ref())
        .bind(input.paddle_plan)
        .bind(input.quantity)
        .bind(input.trial_ends_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_subscription(&row))
    }

    async fn update(&self, id: i64, update: &SubscriptionUpdate) -> AppResult<Subscription> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE subscriptions SET
                paddle_status = $2,
                paddle_plan = $3,
                quantity = $4,
                trial_ends_at = $5,
                paused_from = $6,
                ends_at = $7,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(id)
        .bind(update.paddle_status.as_ref())
        .bind(update.paddle_plan)
        .bind(update.quantity)
        .bind(update.trial_ends_at)
        .bind(update.paused_from)
        .bind(update.ends_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        row.as_ref().map(row_to_subscription).ok_or(AppError::NotFound)
    }
}
