use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

text_enum!(EnquiryType {
    Purchase => "purchase",
    TestDrive => "test_drive",
    Finance => "finance",
    General => "general",
});

text_enum!(EnquiryStatus {
    New => "new",
    Contacted => "contacted",
    Qualified => "qualified",
    Closed => "closed",
});

impl EnquiryStatus {
    /// Whether moving an enquiry into this status counts as a response to the customer.
    pub fn marks_response(self) -> bool {
        !matches!(self, EnquiryStatus::New)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Enquiry {
    pub id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub message: Option<String>,
    pub enquiry_type: EnquiryType,
    pub status: EnquiryStatus,
    pub created_at: NaiveDateTime,
    pub responded_at: Option<NaiveDateTime>,
    /// Set when the linked vehicle still exists.
    pub vehicle_title: Option<String>,
}

impl Enquiry {
    pub fn set_status(&mut self, status: EnquiryStatus, now: NaiveDateTime) {
        self.status = status;
        if status.marks_response() {
            self.responded_at = Some(now);
        }
    }
}

fn default_enquiry_type() -> EnquiryType {
    EnquiryType::Purchase
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEnquiry {
    #[serde(default)]
    pub vehicle_id: Option<Uuid>,
    #[validate(length(min = 2, max = 100, message = "must be between 2 and 100 characters"))]
    pub customer_name: String,
    #[validate(email(message = "is not a valid email address"))]
    pub customer_email: String,
    #[validate(length(min = 10, max = 20, message = "must be between 10 and 20 characters"))]
    pub customer_phone: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "default_enquiry_type")]
    pub enquiry_type: EnquiryType,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnquiryFilter {
    pub status: Option<EnquiryStatus>,
    #[serde(alias = "enquiry_type")]
    pub enquiry_type: Option<EnquiryType>,
}

impl EnquiryFilter {
    pub fn matches(&self, enquiry: &Enquiry) -> bool {
        self.status.is_none_or(|s| s == enquiry.status)
            && self.enquiry_type.is_none_or(|t| t == enquiry.enquiry_type)
    }
}

#[derive(Debug, Deserialize)]
pub struct EnquiryStatusUpdate {
    pub status: EnquiryStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn responding_statuses_stamp_responded_at() {
        let now = Utc::now().naive_utc();
        let mut enquiry = Enquiry {
            id: Uuid::new_v4(),
            vehicle_id: None,
            customer_name: "Jane".into(),
            customer_email: "jane@example.com".into(),
            customer_phone: "0712345678".into(),
            message: None,
            enquiry_type: EnquiryType::General,
            status: EnquiryStatus::New,
            created_at: now,
            responded_at: None,
            vehicle_title: None,
        };

        enquiry.set_status(EnquiryStatus::New, now);
        assert_eq!(enquiry.responded_at, None);

        enquiry.set_status(EnquiryStatus::Qualified, now);
        assert_eq!(enquiry.status, EnquiryStatus::Qualified);
        assert_eq!(enquiry.responded_at, Some(now));
    }

    #[test]
    fn contact_details_are_checked() {
        let new: NewEnquiry = serde_json::from_str(
            r#"{"customerName": "J", "customerEmail": "jane@example.com", "customerPhone": "0712345678"}"#,
        )
        .unwrap();
        assert_eq!(new.enquiry_type, EnquiryType::Purchase);
        assert!(new.validate().is_err());

        let mut new = NewEnquiry {
            customer_name: "Jane".into(),
            ..new
        };
        assert!(new.validate().is_ok());

        new.customer_phone = "071234".into();
        assert!(new.validate().is_err());
        new.customer_phone = "0712345678".into();
        new.customer_email = "jane.example.com".into();
        let errors = new.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("customer_email"));
    }
}
