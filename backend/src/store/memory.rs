//! In-process store used by tests and `DATABASE_URL=memory://` runs. Cascades that Postgres
//! performs through foreign keys are done by hand here.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{duplicate_brand, now, Store, ALREADY_SUBSCRIBED, DUPLICATE_USER};
use crate::error::{ApiError, ApiResult};
use crate::listing::{compare, ListingQuery, PageRequest, SortKey, SortOrder};
use crate::models::{
    AvailabilityStatus, Brand, BrandUpdate, DashboardCounts, Enquiry, EnquiryFilter,
    EnquiryStatus, NewBrand, NewEnquiry, NewSellRequest, NewUserRecord, NewVehicle,
    NewsletterSubscriber, PublicStats, SellRequest, SellRequestImage, SellRequestStatus,
    SubscribeOutcome, User, UserRole, UserUpdate, Vehicle, VehicleImage, VehicleUpdate,
};

#[derive(Default)]
struct Tables {
    vehicles: HashMap<Uuid, Vehicle>,
    enquiries: HashMap<Uuid, Enquiry>,
    sell_requests: HashMap<Uuid, SellRequest>,
    brands: HashMap<Uuid, Brand>,
    users: HashMap<Uuid, User>,
    subscribers: HashMap<Uuid, NewsletterSubscriber>,
}

impl Tables {
    fn vehicle(&self, id: Uuid) -> ApiResult<&Vehicle> {
        self.vehicles
            .get(&id)
            .ok_or_else(|| ApiError::not_found("Vehicle"))
    }

    fn vehicle_mut(&mut self, id: Uuid) -> ApiResult<&mut Vehicle> {
        self.vehicles
            .get_mut(&id)
            .ok_or_else(|| ApiError::not_found("Vehicle"))
    }

    fn sell_request_mut(&mut self, id: Uuid) -> ApiResult<&mut SellRequest> {
        self.sell_requests
            .get_mut(&id)
            .ok_or_else(|| ApiError::not_found("Sell request"))
    }

    fn with_vehicle_title(&self, mut enquiry: Enquiry) -> Enquiry {
        enquiry.vehicle_title = enquiry
            .vehicle_id
            .and_then(|id| self.vehicles.get(&id))
            .map(Vehicle::title);
        enquiry
    }

    fn sorted_vehicles(&self, keep: impl Fn(&Vehicle) -> bool, limit: i64) -> Vec<Vehicle> {
        let mut items: Vec<&Vehicle> = self.vehicles.values().filter(|v| keep(v)).collect();
        items.sort_by(|a, b| compare(a, b, SortKey::CreatedAt, SortOrder::Desc));
        items
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect()
    }

    fn user_clash(
        &self,
        except: Option<Uuid>,
        email: Option<&str>,
        username: Option<&str>,
    ) -> bool {
        self.users.values().any(|u| {
            Some(u.id) != except
                && (email == Some(u.email.as_str()) || username == Some(u.username.as_str()))
        })
    }

    fn brand_clash(&self, except: Option<Uuid>, name: &str) -> bool {
        self.brands
            .values()
            .any(|b| Some(b.id) != except && b.name == name)
    }
}

/// Sorts newest first with the id as tie-break and cuts out one page.
fn newest_page<T: Clone>(
    mut items: Vec<T>,
    created_at: impl Fn(&T) -> (NaiveDateTime, Uuid),
    page: PageRequest,
) -> (Vec<T>, i64) {
    items.sort_by(|a, b| {
        let (a_at, a_id) = created_at(a);
        let (b_at, b_id) = created_at(b);
        b_at.cmp(&a_at).then(a_id.cmp(&b_id))
    });
    let total = items.len() as i64;
    (page.slice(&items), total)
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_vehicles(&self, query: &ListingQuery) -> ApiResult<(Vec<Vehicle>, i64)> {
        let tables = self.tables.read().await;
        let mut matching: Vec<&Vehicle> = tables
            .vehicles
            .values()
            .filter(|v| query.filter.matches(v))
            .collect();
        matching.sort_by(|a, b| compare(a, b, query.sort, query.order));
        let total = matching.len() as i64;
        Ok((query.page.slice(&matching).into_iter().cloned().collect(), total))
    }

    async fn featured_vehicles(&self, limit: i64) -> ApiResult<Vec<Vehicle>> {
        let tables = self.tables.read().await;
        Ok(tables.sorted_vehicles(
            |v| v.is_featured && v.availability_status.is_on_sale(),
            limit,
        ))
    }

    async fn recent_vehicles(&self, limit: i64) -> ApiResult<Vec<Vehicle>> {
        let tables = self.tables.read().await;
        Ok(tables.sorted_vehicles(|v| v.availability_status.is_on_sale(), limit))
    }

    async fn vehicle_makes(&self) -> ApiResult<Vec<String>> {
        let tables = self.tables.read().await;
        let mut makes: Vec<String> = tables.vehicles.values().map(|v| v.make.clone()).collect();
        makes.sort();
        makes.dedup();
        Ok(makes)
    }

    async fn vehicle_models(&self, make: &str) -> ApiResult<Vec<String>> {
        let needle = make.to_lowercase();
        let tables = self.tables.read().await;
        let mut models: Vec<String> = tables
            .vehicles
            .values()
            .filter(|v| v.make.to_lowercase().contains(&needle))
            .map(|v| v.model.clone())
            .collect();
        models.sort();
        models.dedup();
        Ok(models)
    }

    async fn get_vehicle(&self, id: Uuid) -> ApiResult<Vehicle> {
        self.tables.read().await.vehicle(id).cloned()
    }

    async fn create_vehicle(&self, new: NewVehicle) -> ApiResult<Vehicle> {
        let vehicle = new.into_vehicle(Uuid::new_v4(), now());
        self.tables
            .write()
            .await
            .vehicles
            .insert(vehicle.id, vehicle.clone());
        Ok(vehicle)
    }

    async fn update_vehicle(&self, id: Uuid, update: VehicleUpdate) -> ApiResult<Vehicle> {
        let mut tables = self.tables.write().await;
        let vehicle = tables.vehicle_mut(id)?;
        update.apply(vehicle);
        vehicle.updated_at = now();
        Ok(vehicle.clone())
    }

    async fn delete_vehicle(&self, id: Uuid) -> ApiResult<Vec<VehicleImage>> {
        let mut tables = self.tables.write().await;
        let vehicle = tables
            .vehicles
            .remove(&id)
            .ok_or_else(|| ApiError::not_found("Vehicle"))?;
        for enquiry in tables.enquiries.values_mut() {
            if enquiry.vehicle_id == Some(id) {
                enquiry.vehicle_id = None;
            }
        }
        Ok(vehicle.images)
    }

    async fn increment_views(&self, id: Uuid) -> ApiResult<Vehicle> {
        let mut tables = self.tables.write().await;
        let vehicle = tables.vehicle_mut(id)?;
        vehicle.views_count += 1;
        Ok(vehicle.clone())
    }

    async fn toggle_featured(&self, id: Uuid) -> ApiResult<Vehicle> {
        let mut tables = self.tables.write().await;
        let vehicle = tables.vehicle_mut(id)?;
        vehicle.is_featured = !vehicle.is_featured;
        vehicle.updated_at = now();
        Ok(vehicle.clone())
    }

    async fn add_vehicle_image(
        &self,
        vehicle_id: Uuid,
        image_url: String,
        is_primary: bool,
    ) -> ApiResult<VehicleImage> {
        let mut tables = self.tables.write().await;
        let vehicle = tables.vehicle_mut(vehicle_id)?;
        if is_primary {
            for image in &mut vehicle.images {
                image.is_primary = false;
            }
        }
        let image = VehicleImage {
            id: Uuid::new_v4(),
            vehicle_id,
            image_url,
            is_primary,
            display_order: vehicle.images.len() as i32,
            uploaded_at: now(),
        };
        vehicle.images.push(image.clone());
        Ok(image)
    }

    async fn get_vehicle_image(&self, id: Uuid) -> ApiResult<VehicleImage> {
        let tables = self.tables.read().await;
        tables
            .vehicles
            .values()
            .flat_map(|v| v.images.iter())
            .find(|img| img.id == id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Image"))
    }

    async fn delete_vehicle_image(&self, id: Uuid) -> ApiResult<VehicleImage> {
        let mut tables = self.tables.write().await;
        for vehicle in tables.vehicles.values_mut() {
            if let Some(pos) = vehicle.images.iter().position(|img| img.id == id) {
                return Ok(vehicle.images.remove(pos));
            }
        }
        Err(ApiError::not_found("Image"))
    }

    async fn list_enquiries(
        &self,
        filter: EnquiryFilter,
        page: PageRequest,
    ) -> ApiResult<(Vec<Enquiry>, i64)> {
        let tables = self.tables.read().await;
        let matching: Vec<Enquiry> = tables
            .enquiries
            .values()
            .filter(|e| filter.matches(e))
            .map(|e| tables.with_vehicle_title(e.clone()))
            .collect();
        Ok(newest_page(matching, |e| (e.created_at, e.id), page))
    }

    async fn get_enquiry(&self, id: Uuid) -> ApiResult<Enquiry> {
        let tables = self.tables.read().await;
        let enquiry = tables
            .enquiries
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Enquiry"))?;
        Ok(tables.with_vehicle_title(enquiry))
    }

    async fn create_enquiry(&self, new: NewEnquiry) -> ApiResult<Enquiry> {
        let mut tables = self.tables.write().await;
        if let Some(vehicle_id) = new.vehicle_id {
            tables.vehicle(vehicle_id)?;
        }
        let enquiry = Enquiry {
            id: Uuid::new_v4(),
            vehicle_id: new.vehicle_id,
            customer_name: new.customer_name,
            customer_email: new.customer_email,
            customer_phone: new.customer_phone,
            message: new.message,
            enquiry_type: new.enquiry_type,
            status: EnquiryStatus::New,
            created_at: now(),
            responded_at: None,
            vehicle_title: None,
        };
        tables.enquiries.insert(enquiry.id, enquiry.clone());
        Ok(tables.with_vehicle_title(enquiry))
    }

    async fn update_enquiry_status(&self, id: Uuid, status: EnquiryStatus) -> ApiResult<Enquiry> {
        let mut tables = self.tables.write().await;
        let enquiry = tables
            .enquiries
            .get_mut(&id)
            .ok_or_else(|| ApiError::not_found("Enquiry"))?;
        enquiry.set_status(status, now());
        let enquiry = enquiry.clone();
        Ok(tables.with_vehicle_title(enquiry))
    }

    async fn delete_enquiry(&self, id: Uuid) -> ApiResult<()> {
        self.tables
            .write()
            .await
            .enquiries
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ApiError::not_found("Enquiry"))
    }

    async fn list_sell_requests(
        &self,
        status: Option<SellRequestStatus>,
        page: PageRequest,
    ) -> ApiResult<(Vec<SellRequest>, i64)> {
        let tables = self.tables.read().await;
        let matching: Vec<SellRequest> = tables
            .sell_requests
            .values()
            .filter(|r| status.is_none_or(|s| s == r.status))
            .cloned()
            .collect();
        Ok(newest_page(matching, |r| (r.created_at, r.id), page))
    }

    async fn get_sell_request(&self, id: Uuid) -> ApiResult<SellRequest> {
        self.tables
            .read()
            .await
            .sell_requests
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Sell request"))
    }

    async fn create_sell_request(&self, new: NewSellRequest) -> ApiResult<SellRequest> {
        let request = new.into_sell_request(Uuid::new_v4(), now());
        self.tables
            .write()
            .await
            .sell_requests
            .insert(request.id, request.clone());
        Ok(request)
    }

    async fn update_sell_request_status(
        &self,
        id: Uuid,
        status: SellRequestStatus,
    ) -> ApiResult<SellRequest> {
        let mut tables = self.tables.write().await;
        let request = tables.sell_request_mut(id)?;
        request.status = status;
        request.updated_at = now();
        Ok(request.clone())
    }

    async fn set_valuation(&self, id: Uuid, amount: f64) -> ApiResult<SellRequest> {
        let mut tables = self.tables.write().await;
        let request = tables.sell_request_mut(id)?;
        request.set_valuation(amount, now());
        Ok(request.clone())
    }

    async fn delete_sell_request(&self, id: Uuid) -> ApiResult<Vec<SellRequestImage>> {
        self.tables
            .write()
            .await
            .sell_requests
            .remove(&id)
            .map(|r| r.images)
            .ok_or_else(|| ApiError::not_found("Sell request"))
    }

    async fn add_sell_request_image(
        &self,
        sell_request_id: Uuid,
        image_url: String,
    ) -> ApiResult<SellRequestImage> {
        let mut tables = self.tables.write().await;
        let request = tables.sell_request_mut(sell_request_id)?;
        let image = SellRequestImage {
            id: Uuid::new_v4(),
            sell_request_id,
            image_url,
            uploaded_at: now(),
        };
        request.images.push(image.clone());
        Ok(image)
    }

    async fn list_brands(&self, active_only: bool) -> ApiResult<Vec<Brand>> {
        let tables = self.tables.read().await;
        let mut brands: Vec<Brand> = tables
            .brands
            .values()
            .filter(|b| !active_only || b.is_active)
            .cloned()
            .collect();
        brands.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(brands)
    }

    async fn create_brand(&self, new: NewBrand) -> ApiResult<Brand> {
        let mut tables = self.tables.write().await;
        if tables.brand_clash(None, &new.name) {
            return Err(ApiError::Conflict(duplicate_brand(&new.name)));
        }
        let brand = Brand {
            id: Uuid::new_v4(),
            name: new.name,
            logo_url: new.logo_url,
            display_order: new.display_order,
            is_active: new.is_active,
        };
        tables.brands.insert(brand.id, brand.clone());
        Ok(brand)
    }

    async fn update_brand(&self, id: Uuid, update: BrandUpdate) -> ApiResult<Brand> {
        let mut tables = self.tables.write().await;
        if let Some(name) = &update.name {
            if tables.brand_clash(Some(id), name) {
                return Err(ApiError::Conflict(duplicate_brand(name)));
            }
        }
        let brand = tables
            .brands
            .get_mut(&id)
            .ok_or_else(|| ApiError::not_found("Brand"))?;
        update.apply(brand);
        Ok(brand.clone())
    }

    async fn delete_brand(&self, id: Uuid) -> ApiResult<()> {
        self.tables
            .write()
            .await
            .brands
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ApiError::not_found("Brand"))
    }

    async fn list_users(&self) -> ApiResult<Vec<User>> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn get_user(&self, id: Uuid) -> ApiResult<User> {
        self.tables
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("User"))
    }

    async fn find_user_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> ApiResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, new: NewUserRecord) -> ApiResult<User> {
        let mut tables = self.tables.write().await;
        if tables.user_clash(None, Some(&new.email), Some(&new.username)) {
            return Err(ApiError::Conflict(DUPLICATE_USER.to_string()));
        }
        let user = new.into_user(Uuid::new_v4(), now());
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> ApiResult<User> {
        let mut tables = self.tables.write().await;
        if tables.user_clash(Some(id), update.email.as_deref(), update.username.as_deref()) {
            return Err(ApiError::Conflict(DUPLICATE_USER.to_string()));
        }
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| ApiError::not_found("User"))?;
        update.apply(user);
        user.updated_at = now();
        Ok(user.clone())
    }

    async fn record_login(&self, id: Uuid) -> ApiResult<()> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| ApiError::not_found("User"))?;
        user.last_login = Some(now());
        Ok(())
    }

    async fn count_admins(&self) -> ApiResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .filter(|u| u.role == UserRole::Admin)
            .count() as i64)
    }

    async fn subscribe(&self, email: &str) -> ApiResult<SubscribeOutcome> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.subscribers.values_mut().find(|s| s.email == email) {
            if existing.is_active {
                return Err(ApiError::Conflict(ALREADY_SUBSCRIBED.to_string()));
            }
            existing.is_active = true;
            return Ok(SubscribeOutcome::Reactivated);
        }
        let subscriber = NewsletterSubscriber {
            id: Uuid::new_v4(),
            email: email.to_string(),
            subscribed_at: now(),
            is_active: true,
        };
        tables.subscribers.insert(subscriber.id, subscriber);
        Ok(SubscribeOutcome::Subscribed)
    }

    async fn public_stats(&self) -> ApiResult<PublicStats> {
        let tables = self.tables.read().await;
        let vehicles = tables.vehicles.values();
        Ok(PublicStats {
            total_vehicles: tables.vehicles.len() as i64,
            total_brands: tables.brands.values().filter(|b| b.is_active).count() as i64,
            vehicles_available: vehicles
                .clone()
                .filter(|v| v.availability_status.is_on_sale())
                .count() as i64,
            vehicles_sold: vehicles
                .filter(|v| v.availability_status == AvailabilityStatus::Sold)
                .count() as i64,
        })
    }

    async fn dashboard_counts(&self, now: NaiveDateTime) -> ApiResult<DashboardCounts> {
        let tables = self.tables.read().await;
        let this_week_start = now - Duration::days(7);
        let last_week_start = now - Duration::days(14);
        let with_status = |status: AvailabilityStatus| {
            tables
                .vehicles
                .values()
                .filter(move |v| v.availability_status == status)
        };

        Ok(DashboardCounts {
            total_vehicles: tables.vehicles.len() as i64,
            vehicles_available: with_status(AvailabilityStatus::Available).count() as i64,
            vehicles_sold: with_status(AvailabilityStatus::Sold).count() as i64,
            featured_vehicles: tables.vehicles.values().filter(|v| v.is_featured).count() as i64,
            total_enquiries: tables.enquiries.len() as i64,
            new_enquiries: tables
                .enquiries
                .values()
                .filter(|e| e.status == EnquiryStatus::New)
                .count() as i64,
            enquiries_this_week: tables
                .enquiries
                .values()
                .filter(|e| e.created_at >= this_week_start)
                .count() as i64,
            enquiries_last_week: tables
                .enquiries
                .values()
                .filter(|e| e.created_at >= last_week_start && e.created_at < this_week_start)
                .count() as i64,
            total_sell_requests: tables.sell_requests.len() as i64,
            pending_sell_requests: tables
                .sell_requests
                .values()
                .filter(|r| r.status == SellRequestStatus::Pending)
                .count() as i64,
            total_views: tables
                .vehicles
                .values()
                .map(|v| i64::from(v.views_count))
                .sum(),
            total_inventory_value: with_status(AvailabilityStatus::Available)
                .map(|v| v.price)
                .sum(),
            sold_days: with_status(AvailabilityStatus::Sold)
                .map(|v| (v.updated_at - v.created_at).num_days())
                .collect(),
        })
    }
}
