use async_trait::async_trait;
use sqlx::Row;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::customer::CustomerRepo,
    domain::entities::customer::Customer,
};

fn row_to_customer(row: &sqlx::postgres::PgRow) -> Customer {
    Customer {
        id: row.get("id"),
        paddle_email: row.get("paddle_email"),
        paddle_id: row.get("paddle_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = "id, paddle_email, paddle_id, created_at, updated_at";

#[async_trait]
impl CustomerRepo for PostgresPersistence {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<Customer>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM customers WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_customer))
    }

    async fn get_by_email(&self, paddle_email: &str) -> AppResult<Option<Customer>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM customers WHERE paddle_email = $1",
            SELECT_COLS
        ))
        .bind(paddle_email)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_customer))
    }

    async fn create(&self, paddle_email: &str) -> AppResult<Customer> {
        let row = sqlx::query(&format!(
            "INSERT INTO customers (paddle_email) VALUES ($1) RETURNING {}",
            SELECT_COLS
        ))
        .bind(paddle_email)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_customer(&row))
    }

    async fn set_paddle_id(&self, id: i64, paddle_id: i64) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE customers SET paddle_id = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $1",
        )
        .bind(id)
        .bind(paddle_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
