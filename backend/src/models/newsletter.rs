use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterSubscriber {
    pub id: Uuid,
    pub email: String,
    pub subscribed_at: NaiveDateTime,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Subscribed,
    Reactivated,
}

#[derive(Debug, Deserialize, Validate)]
pub struct Subscribe {
    #[validate(email(message = "is not a valid email address"))]
    pub email: String,
}
