/// A billable customer. Its `id` is the owner key carried in passthrough.
#[derive(Debug, Clone)]
pub struct Customer {
    pub id: i64,
    pub paddle_email: String,
    /// Paddle user id, known once the first checkout completes.
    pub paddle_id: Option<i64>,
    pub created_at: Option<chrono::NaiveDateTime>,
    pub updated_at: Option<chrono::NaiveDateTime>,
}
