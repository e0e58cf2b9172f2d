//! Persistence seam. Handlers only see [`Store`]; `db::connect` picks the implementation.

pub mod memory;
pub mod postgres;
mod rows;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::listing::{ListingQuery, PageRequest};
use crate::models::{
    Brand, BrandUpdate, DashboardCounts, Enquiry, EnquiryFilter, EnquiryStatus, NewBrand,
    NewEnquiry, NewSellRequest, NewUserRecord, NewVehicle, PublicStats, SellRequest,
    SellRequestImage, SellRequestStatus, SubscribeOutcome, User, UserUpdate, Vehicle,
    VehicleImage, VehicleUpdate,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub(crate) fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Filtered, sorted page of vehicles plus the size of the whole filtered set.
    async fn list_vehicles(&self, query: &ListingQuery) -> ApiResult<(Vec<Vehicle>, i64)>;
    async fn featured_vehicles(&self, limit: i64) -> ApiResult<Vec<Vehicle>>;
    async fn recent_vehicles(&self, limit: i64) -> ApiResult<Vec<Vehicle>>;
    async fn vehicle_makes(&self) -> ApiResult<Vec<String>>;
    async fn vehicle_models(&self, make: &str) -> ApiResult<Vec<String>>;
    async fn get_vehicle(&self, id: Uuid) -> ApiResult<Vehicle>;
    async fn create_vehicle(&self, new: NewVehicle) -> ApiResult<Vehicle>;
    async fn update_vehicle(&self, id: Uuid, update: VehicleUpdate) -> ApiResult<Vehicle>;
    /// Removes the vehicle and its images, returning the removed images.
    async fn delete_vehicle(&self, id: Uuid) -> ApiResult<Vec<VehicleImage>>;
    async fn increment_views(&self, id: Uuid) -> ApiResult<Vehicle>;
    async fn toggle_featured(&self, id: Uuid) -> ApiResult<Vehicle>;
    /// Appends an image after the existing ones. A primary image demotes any previous one.
    async fn add_vehicle_image(
        &self,
        vehicle_id: Uuid,
        image_url: String,
        is_primary: bool,
    ) -> ApiResult<VehicleImage>;
    async fn get_vehicle_image(&self, id: Uuid) -> ApiResult<VehicleImage>;
    async fn delete_vehicle_image(&self, id: Uuid) -> ApiResult<VehicleImage>;

    /// Newest first.
    async fn list_enquiries(
        &self,
        filter: EnquiryFilter,
        page: PageRequest,
    ) -> ApiResult<(Vec<Enquiry>, i64)>;
    async fn get_enquiry(&self, id: Uuid) -> ApiResult<Enquiry>;
    async fn create_enquiry(&self, new: NewEnquiry) -> ApiResult<Enquiry>;
    async fn update_enquiry_status(&self, id: Uuid, status: EnquiryStatus) -> ApiResult<Enquiry>;
    async fn delete_enquiry(&self, id: Uuid) -> ApiResult<()>;

    /// Newest first.
    async fn list_sell_requests(
        &self,
        status: Option<SellRequestStatus>,
        page: PageRequest,
    ) -> ApiResult<(Vec<SellRequest>, i64)>;
    async fn get_sell_request(&self, id: Uuid) -> ApiResult<SellRequest>;
    async fn create_sell_request(&self, new: NewSellRequest) -> ApiResult<SellRequest>;
    async fn update_sell_request_status(
        &self,
        id: Uuid,
        status: SellRequestStatus,
    ) -> ApiResult<SellRequest>;
    async fn set_valuation(&self, id: Uuid, amount: f64) -> ApiResult<SellRequest>;
    async fn delete_sell_request(&self, id: Uuid) -> ApiResult<Vec<SellRequestImage>>;
    async fn add_sell_request_image(
        &self,
        sell_request_id: Uuid,
        image_url: String,
    ) -> ApiResult<SellRequestImage>;

    /// Ordered by display order, then name.
    async fn list_brands(&self, active_only: bool) -> ApiResult<Vec<Brand>>;
    async fn create_brand(&self, new: NewBrand) -> ApiResult<Brand>;
    async fn update_brand(&self, id: Uuid, update: BrandUpdate) -> ApiResult<Brand>;
    async fn delete_brand(&self, id: Uuid) -> ApiResult<()>;

    /// Newest first.
    async fn list_users(&self) -> ApiResult<Vec<User>>;
    async fn get_user(&self, id: Uuid) -> ApiResult<User>;
    async fn find_user_by_email(&self, email: &str) -> ApiResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> ApiResult<Option<User>>;
    async fn create_user(&self, new: NewUserRecord) -> ApiResult<User>;
    async fn update_user(&self, id: Uuid, update: UserUpdate) -> ApiResult<User>;
    async fn record_login(&self, id: Uuid) -> ApiResult<()>;
    async fn count_admins(&self) -> ApiResult<i64>;

    /// Conflict when the address is already subscribed and active.
    async fn subscribe(&self, email: &str) -> ApiResult<SubscribeOutcome>;

    async fn public_stats(&self) -> ApiResult<PublicStats>;
    async fn dashboard_counts(&self, now: NaiveDateTime) -> ApiResult<DashboardCounts>;
}

pub(crate) const DUPLICATE_USER: &str = "User with this email or username already exists";
pub(crate) const ALREADY_SUBSCRIBED: &str = "You are already subscribed!";

pub(crate) fn duplicate_brand(name: &str) -> String {
    format!("Brand '{name}' already exists")
}
