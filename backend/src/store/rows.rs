//! Diesel row types and their conversions to the API models. Enumerations are stored as
//! text and parsed back on the way out; a value that does not parse is reported as corrupt.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::models::{
    Brand, BrandUpdate, Enquiry, NewsletterSubscriber, SellRequest, SellRequestImage, User,
    UserUpdate, Vehicle, VehicleImage, VehicleUpdate,
};
use crate::schema::{
    brands, enquiries, newsletter_subscribers, sell_request_images, sell_requests, users,
    vehicle_images, vehicles,
};

fn text<T: ToString>(value: T) -> String {
    value.to_string()
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = vehicles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VehicleRow {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub trim: Option<String>,
    pub price: f64,
    pub currency: String,
    pub mileage: Option<i32>,
    pub body_type: Option<String>,
    pub transmission: Option<String>,
    pub fuel_type: Option<String>,
    pub condition: Option<String>,
    pub color: Option<String>,
    pub engine_capacity: Option<String>,
    pub availability_status: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub is_featured: bool,
    pub views_count: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl VehicleRow {
    pub fn into_vehicle(self, images: Vec<VehicleImageRow>) -> ApiResult<Vehicle> {
        let mut images: Vec<VehicleImage> = images.into_iter().map(Into::into).collect();
        images.sort_by_key(|img| img.display_order);
        Ok(Vehicle {
            id: self.id,
            make: self.make,
            model: self.model,
            year: self.year,
            trim: self.trim,
            price: self.price,
            currency: self.currency.parse()?,
            mileage: self.mileage,
            body_type: self.body_type.map(|v| v.parse()).transpose()?,
            transmission: self.transmission.map(|v| v.parse()).transpose()?,
            fuel_type: self.fuel_type.map(|v| v.parse()).transpose()?,
            condition: self.condition.map(|v| v.parse()).transpose()?,
            color: self.color,
            engine_capacity: self.engine_capacity,
            availability_status: self.availability_status.parse()?,
            location: self.location,
            description: self.description,
            features: self.features,
            is_featured: self.is_featured,
            views_count: self.views_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
            images,
        })
    }
}

impl From<&Vehicle> for VehicleRow {
    fn from(v: &Vehicle) -> Self {
        Self {
            id: v.id,
            make: v.make.clone(),
            model: v.model.clone(),
            year: v.year,
            trim: v.trim.clone(),
            price: v.price,
            currency: text(v.currency),
            mileage: v.mileage,
            body_type: v.body_type.map(text),
            transmission: v.transmission.map(text),
            fuel_type: v.fuel_type.map(text),
            condition: v.condition.map(text),
            color: v.color.clone(),
            engine_capacity: v.engine_capacity.clone(),
            availability_status: text(v.availability_status),
            location: v.location.clone(),
            description: v.description.clone(),
            features: v.features.clone(),
            is_featured: v.is_featured,
            views_count: v.views_count,
            created_at: v.created_at,
            updated_at: v.updated_at,
        }
    }
}

/// Only the supplied fields are written; `updated_at` always is.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = vehicles)]
pub struct VehicleChangeset {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub trim: Option<Option<String>>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub mileage: Option<Option<i32>>,
    pub body_type: Option<Option<String>>,
    pub transmission: Option<Option<String>>,
    pub fuel_type: Option<Option<String>>,
    pub condition: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub engine_capacity: Option<Option<String>>,
    pub availability_status: Option<String>,
    pub location: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub features: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub updated_at: NaiveDateTime,
}

impl VehicleChangeset {
    pub fn new(update: VehicleUpdate, now: NaiveDateTime) -> Self {
        Self {
            make: update.make,
            model: update.model,
            year: update.year,
            trim: update.trim,
            price: update.price,
            currency: update.currency.map(text),
            mileage: update.mileage,
            body_type: update.body_type.map(|v| v.map(text)),
            transmission: update.transmission.map(|v| v.map(text)),
            fuel_type: update.fuel_type.map(|v| v.map(text)),
            condition: update.condition.map(|v| v.map(text)),
            color: update.color,
            engine_capacity: update.engine_capacity,
            availability_status: update.availability_status.map(text),
            location: update.location,
            description: update.description,
            features: update.features,
            is_featured: update.is_featured,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, Insertable)]
#[diesel(belongs_to(VehicleRow, foreign_key = vehicle_id))]
#[diesel(table_name = vehicle_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VehicleImageRow {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub image_url: String,
    pub is_primary: bool,
    pub display_order: i32,
    pub uploaded_at: NaiveDateTime,
}

impl From<VehicleImageRow> for VehicleImage {
    fn from(row: VehicleImageRow) -> Self {
        Self {
            id: row.id,
            vehicle_id: row.vehicle_id,
            image_url: row.image_url,
            is_primary: row.is_primary,
            display_order: row.display_order,
            uploaded_at: row.uploaded_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = enquiries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EnquiryRow {
    pub id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub message: Option<String>,
    pub enquiry_type: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub responded_at: Option<NaiveDateTime>,
}

impl EnquiryRow {
    pub fn into_enquiry(self, vehicle_title: Option<String>) -> ApiResult<Enquiry> {
        Ok(Enquiry {
            id: self.id,
            vehicle_id: self.vehicle_id,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            message: self.message,
            enquiry_type: self.enquiry_type.parse()?,
            status: self.status.parse()?,
            created_at: self.created_at,
            responded_at: self.responded_at,
            vehicle_title,
        })
    }
}

impl From<&Enquiry> for EnquiryRow {
    fn from(e: &Enquiry) -> Self {
        Self {
            id: e.id,
            vehicle_id: e.vehicle_id,
            customer_name: e.customer_name.clone(),
            customer_email: e.customer_email.clone(),
            customer_phone: e.customer_phone.clone(),
            message: e.message.clone(),
            enquiry_type: text(e.enquiry_type),
            status: text(e.status),
            created_at: e.created_at,
            responded_at: e.responded_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = sell_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SellRequestRow {
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
    pub service_type: String,
    pub status: String,
    pub valuation_amount: Option<f64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl SellRequestRow {
    pub fn into_sell_request(self, images: Vec<SellRequestImageRow>) -> ApiResult<SellRequest> {
        Ok(SellRequest {
            id: self.id,
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
            service_type: self.service_type.parse()?,
            status: self.status.parse()?,
            valuation_amount: self.valuation_amount,
            created_at: self.created_at,
            updated_at: self.updated_at,
            images: images.into_iter().map(Into::into).collect(),
        })
    }
}

impl From<&SellRequest> for SellRequestRow {
    fn from(r: &SellRequest) -> Self {
        Self {
            id: r.id,
            customer_name: r.customer_name.clone(),
            customer_email: r.customer_email.clone(),
            customer_phone: r.customer_phone.clone(),
            vehicle_make: r.vehicle_make.clone(),
            vehicle_model: r.vehicle_model.clone(),
            vehicle_year: r.vehicle_year,
            mileage: r.mileage,
            condition: r.condition.clone(),
            asking_price: r.asking_price,
            description: r.description.clone(),
            service_type: text(r.service_type),
            status: text(r.status),
            valuation_amount: r.valuation_amount,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, Insertable)]
#[diesel(belongs_to(SellRequestRow, foreign_key = sell_request_id))]
#[diesel(table_name = sell_request_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SellRequestImageRow {
    pub id: Uuid,
    pub sell_request_id: Uuid,
    pub image_url: String,
    pub uploaded_at: NaiveDateTime,
}

impl From<SellRequestImageRow> for SellRequestImage {
    fn from(row: SellRequestImageRow) -> Self {
        Self {
            id: row.id,
            sell_request_id: row.sell_request_id,
            image_url: row.image_url,
            uploaded_at: row.uploaded_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = brands)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BrandRow {
    pub id: Uuid,
    pub name: String,
    pub logo_url: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
}

impl From<BrandRow> for Brand {
    fn from(row: BrandRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            logo_url: row.logo_url,
            display_order: row.display_order,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = brands)]
pub struct BrandChangeset {
    pub name: Option<String>,
    pub logo_url: Option<Option<String>>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl From<BrandUpdate> for BrandChangeset {
    fn from(update: BrandUpdate) -> Self {
        Self {
            name: update.name,
            logo_url: update.logo_url,
            display_order: update.display_order,
            is_active: update.is_active,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub full_name: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub last_login: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl UserRow {
    pub fn into_user(self) -> ApiResult<User> {
        Ok(User {
            id: self.id,
            username: self.username,
            email: self.email,
            password_hash: self.hashed_password,
            full_name: self.full_name,
            role: self.role.parse()?,
            is_active: self.is_active,
            last_login: self.last_login,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            hashed_password: u.password_hash.clone(),
            full_name: u.full_name.clone(),
            role: text(u.role),
            is_active: u.is_active,
            last_login: u.last_login,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserChangeset {
    pub username: Option<String>,
    pub email: Option<String>,
    pub full_name: Option<Option<String>>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub updated_at: NaiveDateTime,
}

impl UserChangeset {
    pub fn new(update: UserUpdate, now: NaiveDateTime) -> Self {
        Self {
            username: update.username,
            email: update.email,
            full_name: update.full_name,
            role: update.role.map(text),
            is_active: update.is_active,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = newsletter_subscribers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubscriberRow {
    pub id: Uuid,
    pub email: String,
    pub subscribed_at: NaiveDateTime,
    pub is_active: bool,
}

impl From<&NewsletterSubscriber> for SubscriberRow {
    fn from(s: &NewsletterSubscriber) -> Self {
        Self {
            id: s.id,
            email: s.email.clone(),
            subscribed_at: s.subscribed_at,
            is_active: s.is_active,
        }
    }
}
