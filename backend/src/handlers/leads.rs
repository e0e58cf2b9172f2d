//! Checkout lead capture: remembers who asked about a car, creating a customer account
//! on first contact.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{hash_password, random_password};
use crate::error::{ApiJson, ApiResult};
use crate::models::{EnquiryType, NewEnquiry, NewUserRecord, User, UserRole};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LeadCapture {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub name: String,
    /// Doubles as the account username.
    #[validate(length(min = 3, max = 50, message = "must be between 3 and 50 characters"))]
    pub phone: String,
    #[serde(default)]
    #[validate(email(message = "is not a valid email address"))]
    pub email: Option<String>,
    #[serde(alias = "vehicle_id")]
    pub vehicle_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl LeadCapture {
    fn email_or_placeholder(&self) -> String {
        self.email
            .clone()
            .unwrap_or_else(|| format!("{}@placeholder.com", self.phone))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadCaptured {
    pub message: &'static str,
    pub user_id: Uuid,
    pub is_new_user: bool,
}

async fn find_or_create(state: &AppState, lead: &LeadCapture) -> ApiResult<(User, bool)> {
    if let Some(user) = state.store.find_user_by_username(&lead.phone).await? {
        return Ok((user, false));
    }
    if let Some(email) = &lead.email {
        if let Some(user) = state.store.find_user_by_email(email).await? {
            return Ok((user, false));
        }
    }

    let record = NewUserRecord {
        username: lead.phone.clone(),
        email: lead.email_or_placeholder(),
        password_hash: hash_password(&random_password())?,
        full_name: Some(lead.name.clone()),
        role: UserRole::Customer,
    };
    let user = state.store.create_user(record).await?;
    log::info!("created customer account {} from a lead", user.id);
    Ok((user, true))
}

/// The enquiry is a side record; failing to write it never fails the capture.
async fn record_enquiry(state: &AppState, lead: &LeadCapture) {
    let vehicle_id = match Uuid::parse_str(&lead.vehicle_id) {
        Ok(id) => match state.store.get_vehicle(id).await {
            Ok(_) => Some(id),
            Err(err) => {
                log::warn!("lead references vehicle {id} which could not be loaded: {err}");
                None
            }
        },
        Err(_) => None,
    };
    let enquiry = NewEnquiry {
        vehicle_id,
        customer_name: lead.name.clone(),
        customer_email: lead.email_or_placeholder(),
        customer_phone: lead.phone.clone(),
        message: Some(
            lead.message
                .clone()
                .unwrap_or_else(|| format!("Interested in vehicle {}", lead.vehicle_id)),
        ),
        enquiry_type: EnquiryType::Purchase,
    };

    let result = match enquiry.validate() {
        Ok(()) => state.store.create_enquiry(enquiry).await.map(|_| ()),
        Err(errors) => Err(errors.into()),
    };
    if let Err(err) = result {
        log::warn!("failed to log enquiry for lead {}: {err}", lead.phone);
    }
}

pub async fn capture(
    State(state): State<AppState>,
    ApiJson(lead): ApiJson<LeadCapture>,
) -> ApiResult<ApiJson<LeadCaptured>> {
    lead.validate()?;
    let (user, is_new_user) = find_or_create(&state, &lead).await?;
    record_enquiry(&state, &lead).await;
    Ok(ApiJson(LeadCaptured {
        message: "Lead captured successfully",
        user_id: user.id,
        is_new_user,
    }))
}
