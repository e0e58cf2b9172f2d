use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

text_enum!(ServiceType {
    SellOnBehalf => "sell_on_behalf",
    DirectPurchase => "direct_purchase",
});

text_enum!(SellRequestStatus {
    Pending => "pending",
    Reviewing => "reviewing",
    Valued => "valued",
    Accepted => "accepted",
    Rejected => "rejected",
});

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellRequest {
    pub id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_year: i32,
    pub mileage: Option<i32>,
    pub condition: Option<String>,
    pub asking_price: Option<f64>,
    pub description: Option<String>,
    pub service_type: ServiceType,
    pub status: SellRequestStatus,
    pub valuation_amount: Option<f64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub images: Vec<SellRequestImage>,
}

impl SellRequest {
    /// Records an offer; the request moves to `valued`.
    pub fn set_valuation(&mut self, amount: f64, now: NaiveDateTime) {
        self.valuation_amount = Some(amount);
        self.status = SellRequestStatus::Valued;
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SellRequestImage {
    pub id: Uuid,
    pub sell_request_id: Uuid,
    pub image_url: String,
    pub uploaded_at: NaiveDateTime,
}

fn default_service_type() -> ServiceType {
    ServiceType::SellOnBehalf
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewSellRequest {
    #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
    pub customer_name: String,
    #[validate(email(message = "is not a valid email address"))]
    pub customer_email: String,
    #[validate(length(min = 10, max = 20, message = "must be between 10 and 20 characters"))]
    pub customer_phone: String,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub vehicle_make: String,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub vehicle_model: String,
    #[validate(range(min = 1900, max = 2030, message = "must be between 1900 and 2030"))]
    pub vehicle_year: i32,
    #[serde(default)]
    #[validate(range(min = 0, message = "must not be negative"))]
    pub mileage: Option<i32>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub condition: Option<String>,
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, message = "must be greater than 0"))]
    pub asking_price: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_service_type")]
    pub service_type: ServiceType,
}

impl NewSellRequest {
    pub fn into_sell_request(self, id: Uuid, now: NaiveDateTime) -> SellRequest {
        SellRequest {
            id,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            vehicle_make: self.vehicle_make,
            vehicle_model: self.vehicle_model,
            vehicle_year: self.vehicle_year,
            mileage: self.mileage,
            condition: self.condition,
            asking_price: self.asking_price,
            description: self.description,
            service_type: self.service_type,
            status: SellRequestStatus::Pending,
            valuation_amount: None,
            created_at: now,
            updated_at: now,
            images: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SellRequestStatusUpdate {
    pub status: SellRequestStatus,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Valuation {
    #[serde(alias = "valuation_amount")]
    #[validate(range(exclusive_min = 0.0, message = "must be greater than 0"))]
    pub valuation_amount: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> NewSellRequest {
        serde_json::from_str(
            r#"{
                "customerName": "Otieno",
                "customerEmail": "otieno@example.com",
                "customerPhone": "0722000111",
                "vehicleMake": "Subaru",
                "vehicleModel": "Forester",
                "vehicleYear": 2014
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn new_requests_start_pending() {
        let new = payload();
        assert!(new.validate().is_ok());
        assert_eq!(new.service_type, ServiceType::SellOnBehalf);

        let now = chrono::Utc::now().naive_utc();
        let mut request = new.into_sell_request(Uuid::new_v4(), now);
        assert_eq!(request.status, SellRequestStatus::Pending);

        request.set_valuation(1_200_000.0, now);
        assert_eq!(request.status, SellRequestStatus::Valued);
        assert_eq!(request.valuation_amount, Some(1_200_000.0));
    }

    #[test]
    fn asking_price_must_be_positive() {
        let mut new = payload();
        new.asking_price = Some(0.0);
        assert!(new.validate().is_err());
        new.asking_price = None;
        new.vehicle_year = 1899;
        assert!(new.validate().is_err());
        assert!(Valuation { valuation_amount: -5.0 }.validate().is_err());
    }
}
