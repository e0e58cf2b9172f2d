use serde::{Deserialize, Deserializer};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} value `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a closed set of values stored as text, with serde names matching the stored text.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::models::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::models::UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

pub mod brand;
pub mod enquiry;
pub mod newsletter;
pub mod sell_request;
pub mod stats;
pub mod user;
pub mod vehicle;

pub use brand::{Brand, BrandUpdate, NewBrand};
pub use enquiry::{
    Enquiry, EnquiryFilter, EnquiryStatus, EnquiryStatusUpdate, EnquiryType, NewEnquiry,
};
pub use newsletter::{NewsletterSubscriber, Subscribe, SubscribeOutcome};
pub use sell_request::{
    NewSellRequest, SellRequest, SellRequestImage, SellRequestStatus, SellRequestStatusUpdate,
    ServiceType, Valuation,
};
pub use stats::{DashboardCounts, DashboardStats, PublicStats};
pub use user::{
    LoginRequest, NewUser, NewUserRecord, TokenResponse, User, UserRole, UserUpdate, MAX_ADMINS,
};
pub use vehicle::{
    AvailabilityStatus, BodyType, Condition, Currency, FuelType, NewVehicle, Transmission,
    Vehicle, VehicleImage, VehicleResponse, VehicleUpdate,
};

/// Deserializes a field that distinguishes "absent" (`None`) from "explicitly null"
/// (`Some(None)`). Pair with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_enum_parses_stored_text() {
        assert_eq!(
            "direct_import".parse::<AvailabilityStatus>(),
            Ok(AvailabilityStatus::DirectImport)
        );
        let err = "Truck".parse::<BodyType>().unwrap_err();
        assert_eq!(err.kind, "BodyType");
    }
}
