use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::double_option;

text_enum!(Currency {
    Ksh => "KSH",
    Usd => "USD",
    Gbp => "GBP",
    Jpy => "JPY",
});

text_enum!(BodyType {
    Suv => "SUV",
    Sedan => "Sedan",
    Hatchback => "Hatchback",
    Pickup => "Pickup",
    Convertible => "Convertible",
    Van => "Van",
    Wagon => "Wagon",
    Coupe => "Coupe",
});

text_enum!(Transmission {
    Automatic => "Automatic",
    Manual => "Manual",
});

text_enum!(FuelType {
    Petrol => "Petrol",
    Diesel => "Diesel",
    Hybrid => "Hybrid",
    Electric => "Electric",
});

text_enum!(Condition {
    Excellent => "Excellent",
    Good => "Good",
    Fair => "Fair",
});

text_enum!(AvailabilityStatus {
    Available => "available",
    DirectImport => "direct_import",
    Sold => "sold",
    Reserved => "reserved",
});

impl AvailabilityStatus {
    /// Statuses shown on the storefront as purchasable.
    pub const ON_SALE: [AvailabilityStatus; 2] =
        [AvailabilityStatus::Available, AvailabilityStatus::DirectImport];

    pub fn is_on_sale(self) -> bool {
        Self::ON_SALE.contains(&self)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub trim: Option<String>,
    pub price: f64,
    pub currency: Currency,
    pub mileage: Option<i32>,
    pub body_type: Option<BodyType>,
    pub transmission: Option<Transmission>,
    pub fuel_type: Option<FuelType>,
    pub condition: Option<Condition>,
    pub color: Option<String>,
    pub engine_capacity: Option<String>,
    pub availability_status: AvailabilityStatus,
    pub location: Option<String>,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub is_featured: bool,
    pub views_count: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    /// Sorted by display order.
    pub images: Vec<VehicleImage>,
}

impl Vehicle {
    pub fn title(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }

    /// The image flagged primary, falling back to the first image.
    pub fn primary_image(&self) -> Option<&str> {
        self.images
            .iter()
            .find(|img| img.is_primary)
            .or_else(|| self.images.first())
            .map(|img| img.image_url.as_str())
    }
}

/// API shape of a vehicle: the stored fields plus the derived title and primary image.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleResponse {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub title: String,
    pub primary_image: Option<String>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            title: vehicle.title(),
            primary_image: vehicle.primary_image().map(str::to_owned),
            vehicle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleImage {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub image_url: String,
    pub is_primary: bool,
    pub display_order: i32,
    pub uploaded_at: NaiveDateTime,
}

fn default_currency() -> Currency {
    Currency::Ksh
}

fn default_condition() -> Option<Condition> {
    Some(Condition::Good)
}

fn default_availability() -> AvailabilityStatus {
    AvailabilityStatus::Available
}

fn default_location() -> Option<String> {
    Some("Kenya".to_string())
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewVehicle {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub make: String,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub model: String,
    #[validate(range(min = 1900, max = 2030, message = "must be between 1900 and 2030"))]
    pub year: i32,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub trim: Option<String>,
    #[validate(range(exclusive_min = 0.0, message = "must be greater than 0"))]
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: Currency,
    #[serde(default)]
    #[validate(range(min = 0, message = "must not be negative"))]
    pub mileage: Option<i32>,
    #[serde(default)]
    pub body_type: Option<BodyType>,
    #[serde(default)]
    pub transmission: Option<Transmission>,
    #[serde(default)]
    pub fuel_type: Option<FuelType>,
    #[serde(default = "default_condition")]
    pub condition: Option<Condition>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub color: Option<String>,
    #[serde(default)]
    #[validate(length(max = 20))]
    pub engine_capacity: Option<String>,
    #[serde(default = "default_availability")]
    pub availability_status: AvailabilityStatus,
    #[serde(default = "default_location")]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
}

impl NewVehicle {
    /// A minimal listing with the storefront defaults applied.
    pub fn basic(make: &str, model: &str, year: i32, price: f64) -> Self {
        Self {
            make: make.to_string(),
            model: model.to_string(),
            year,
            trim: None,
            price,
            currency: default_currency(),
            mileage: None,
            body_type: None,
            transmission: None,
            fuel_type: None,
            condition: default_condition(),
            color: None,
            engine_capacity: None,
            availability_status: default_availability(),
            location: default_location(),
            description: None,
            features: Vec::new(),
            is_featured: false,
        }
    }

    pub fn into_vehicle(self, id: Uuid, now: NaiveDateTime) -> Vehicle {
        Vehicle {
            id,
            make: self.make,
            model: self.model,
            year: self.year,
            trim: self.trim,
            price: self.price,
            currency: self.currency,
            mileage: self.mileage,
            body_type: self.body_type,
            transmission: self.transmission,
            fuel_type: self.fuel_type,
            condition: self.condition,
            color: self.color,
            engine_capacity: self.engine_capacity,
            availability_status: self.availability_status,
            location: self.location,
            description: self.description,
            features: self.features,
            is_featured: self.is_featured,
            views_count: 0,
            created_at: now,
            updated_at: now,
            images: Vec::new(),
        }
    }
}

/// Partial update: `None` leaves a field untouched. Nullable columns use a nested option so
/// that `Some(None)` clears the value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VehicleUpdate {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub make: Option<String>,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub model: Option<String>,
    #[validate(range(min = 1900, max = 2030, message = "must be between 1900 and 2030"))]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 50))]
    pub trim: Option<Option<String>>,
    #[validate(range(exclusive_min = 0.0, message = "must be greater than 0"))]
    pub price: Option<f64>,
    pub currency: Option<Currency>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(range(min = 0, message = "must not be negative"))]
    pub mileage: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub body_type: Option<Option<BodyType>>,
    #[serde(default, deserialize_with = "double_option")]
    pub transmission: Option<Option<Transmission>>,
    #[serde(default, deserialize_with = "double_option")]
    pub fuel_type: Option<Option<FuelType>>,
    #[serde(default, deserialize_with = "double_option")]
    pub condition: Option<Option<Condition>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 50))]
    pub color: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 20))]
    pub engine_capacity: Option<Option<String>>,
    pub availability_status: Option<AvailabilityStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub features: Option<Vec<String>>,
    pub is_featured: Option<bool>,
}

impl VehicleUpdate {
    /// Copies every supplied field onto `vehicle`.
    pub fn apply(self, vehicle: &mut Vehicle) {
        fn set<T>(target: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *target = value;
            }
        }

        set(&mut vehicle.make, self.make);
        set(&mut vehicle.model, self.model);
        set(&mut vehicle.year, self.year);
        set(&mut vehicle.trim, self.trim);
        set(&mut vehicle.price, self.price);
        set(&mut vehicle.currency, self.currency);
        set(&mut vehicle.mileage, self.mileage);
        set(&mut vehicle.body_type, self.body_type);
        set(&mut vehicle.transmission, self.transmission);
        set(&mut vehicle.fuel_type, self.fuel_type);
        set(&mut vehicle.condition, self.condition);
        set(&mut vehicle.color, self.color);
        set(&mut vehicle.engine_capacity, self.engine_capacity);
        set(&mut vehicle.availability_status, self.availability_status);
        set(&mut vehicle.location, self.location);
        set(&mut vehicle.description, self.description);
        set(&mut vehicle.features, self.features);
        set(&mut vehicle.is_featured, self.is_featured);
    }
}
