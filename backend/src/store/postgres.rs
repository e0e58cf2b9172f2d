use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::pooled_connection::deadpool::Object;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use super::rows::{
    BrandChangeset, BrandRow, EnquiryRow, SellRequestImageRow, SellRequestRow, SubscriberRow,
    UserChangeset, UserRow, VehicleChangeset, VehicleImageRow, VehicleRow,
};
use super::{duplicate_brand, now, Store, ALREADY_SUBSCRIBED, DUPLICATE_USER};
use crate::db::PgPool;
use crate::error::{ApiError, ApiResult};
use crate::listing::{like_pattern, ListingQuery, PageRequest, SortKey, SortOrder, VehicleFilter};
use crate::models::{
    AvailabilityStatus, Brand, BrandUpdate, DashboardCounts, Enquiry, EnquiryFilter,
    EnquiryStatus, NewBrand, NewEnquiry, NewSellRequest, NewUserRecord, NewVehicle,
    NewsletterSubscriber, PublicStats, SellRequest, SellRequestImage, SellRequestStatus,
    SubscribeOutcome, User, UserRole, UserUpdate, Vehicle, VehicleImage, VehicleUpdate,
};
use crate::schema::{
    brands, enquiries, newsletter_subscribers, sell_request_images, sell_requests, users,
    vehicle_images, vehicles,
};

fn on_sale() -> Vec<&'static str> {
    AvailabilityStatus::ON_SALE
        .iter()
        .map(AvailabilityStatus::as_str)
        .collect()
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> ApiResult<Object<AsyncPgConnection>> {
        Ok(self.pool.get().await?)
    }
}

/// Applies every supplied predicate of `filter` to a fresh vehicles query.
fn filtered(filter: &VehicleFilter) -> vehicles::BoxedQuery<'static, Pg> {
    let mut query = vehicles::table.into_boxed();
    if let Some(make) = &filter.make {
        query = query.filter(vehicles::make.ilike(like_pattern(make)));
    }
    if let Some(model) = &filter.model {
        query = query.filter(vehicles::model.ilike(like_pattern(model)));
    }
    if let Some(location) = &filter.location {
        query = query.filter(vehicles::location.ilike(like_pattern(location)));
    }
    if let Some(min) = filter.price_min {
        query = query.filter(vehicles::price.ge(min));
    }
    if let Some(max) = filter.price_max {
        query = query.filter(vehicles::price.le(max));
    }
    if let Some(min) = filter.year_min {
        query = query.filter(vehicles::year.ge(min));
    }
    if let Some(max) = filter.year_max {
        query = query.filter(vehicles::year.le(max));
    }
    if let Some(body_type) = filter.body_type {
        query = query.filter(vehicles::body_type.eq(body_type.as_str()));
    }
    if let Some(transmission) = filter.transmission {
        query = query.filter(vehicles::transmission.eq(transmission.as_str()));
    }
    if let Some(fuel_type) = filter.fuel_type {
        query = query.filter(vehicles::fuel_type.eq(fuel_type.as_str()));
    }
    if let Some(status) = filter.availability_status {
        query = query.filter(vehicles::availability_status.eq(status.as_str()));
    }
    if let Some(featured) = filter.is_featured {
        query = query.filter(vehicles::is_featured.eq(featured));
    }
    if let Some(term) = &filter.search {
        let pattern = like_pattern(term);
        query = query.filter(
            vehicles::make
                .ilike(pattern.clone())
                .or(vehicles::model.ilike(pattern.clone()))
                .or(vehicles::description.ilike(pattern)),
        );
    }
    query
}

fn sorted(
    query: vehicles::BoxedQuery<'static, Pg>,
    key: SortKey,
    order: SortOrder,
) -> vehicles::BoxedQuery<'static, Pg> {
    let query = match (key, order) {
        (SortKey::CreatedAt, SortOrder::Asc) => query.order(vehicles::created_at.asc()),
        (SortKey::CreatedAt, SortOrder::Desc) => query.order(vehicles::created_at.desc()),
        (SortKey::Price, SortOrder::Asc) => query.order(vehicles::price.asc()),
        (SortKey::Price, SortOrder::Desc) => query.order(vehicles::price.desc()),
        (SortKey::Year, SortOrder::Asc) => query.order(vehicles::year.asc()),
        (SortKey::Year, SortOrder::Desc) => query.order(vehicles::year.desc()),
        // Postgres puts NULLs last ascending and first descending.
        (SortKey::Mileage, SortOrder::Asc) => query.order(vehicles::mileage.asc()),
        (SortKey::Mileage, SortOrder::Desc) => query.order(vehicles::mileage.desc()),
    };
    query.then_order_by(vehicles::id.asc())
}

async fn with_images(
    conn: &mut AsyncPgConnection,
    rows: Vec<VehicleRow>,
) -> ApiResult<Vec<Vehicle>> {
    let images = VehicleImageRow::belonging_to(&rows)
        .select(VehicleImageRow::as_select())
        .load(conn)
        .await?;
    images
        .grouped_by(&rows)
        .into_iter()
        .zip(rows)
        .map(|(images, row)| row.into_vehicle(images))
        .collect()
}

async fn load_vehicle(conn: &mut AsyncPgConnection, id: Uuid) -> ApiResult<Vehicle> {
    let row = vehicles::table
        .find(id)
        .select(VehicleRow::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::not_found("Vehicle"))?;
    let images = VehicleImageRow::belonging_to(&row)
        .select(VehicleImageRow::as_select())
        .load(conn)
        .await?;
    row.into_vehicle(images)
}

async fn vehicle_titles(
    conn: &mut AsyncPgConnection,
    ids: Vec<Uuid>,
) -> ApiResult<HashMap<Uuid, String>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Uuid, i32, String, String)> = vehicles::table
        .filter(vehicles::id.eq_any(ids))
        .select((vehicles::id, vehicles::year, vehicles::make, vehicles::model))
        .load(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(id, year, make, model)| (id, format!("{year} {make} {model}")))
        .collect())
}

async fn enquiries_with_titles(
    conn: &mut AsyncPgConnection,
    rows: Vec<EnquiryRow>,
) -> ApiResult<Vec<Enquiry>> {
    let ids = rows.iter().filter_map(|r| r.vehicle_id).collect();
    let titles = vehicle_titles(conn, ids).await?;
    rows.into_iter()
        .map(|row| {
            let title = row.vehicle_id.and_then(|id| titles.get(&id).cloned());
            row.into_enquiry(title)
        })
        .collect()
}

async fn one_enquiry(conn: &mut AsyncPgConnection, row: EnquiryRow) -> ApiResult<Enquiry> {
    enquiries_with_titles(conn, vec![row])
        .await?
        .pop()
        .ok_or_else(|| ApiError::Internal("enquiry vanished while loading".into()))
}

async fn with_sell_images(
    conn: &mut AsyncPgConnection,
    rows: Vec<SellRequestRow>,
) -> ApiResult<Vec<SellRequest>> {
    let images = SellRequestImageRow::belonging_to(&rows)
        .select(SellRequestImageRow::as_select())
        .order(sell_request_images::uploaded_at.asc())
        .load(conn)
        .await?;
    images
        .grouped_by(&rows)
        .into_iter()
        .zip(rows)
        .map(|(images, row)| row.into_sell_request(images))
        .collect()
}

async fn load_sell_request(conn: &mut AsyncPgConnection, id: Uuid) -> ApiResult<SellRequest> {
    let row = sell_requests::table
        .find(id)
        .select(SellRequestRow::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| ApiError::not_found("Sell request"))?;
    with_sell_images(conn, vec![row])
        .await?
        .pop()
        .ok_or_else(|| ApiError::not_found("Sell request"))
}

async fn count_vehicles_with_status(
    conn: &mut AsyncPgConnection,
    statuses: &[&'static str],
) -> ApiResult<i64> {
    Ok(vehicles::table
        .filter(vehicles::availability_status.eq_any(statuses.to_vec()))
        .count()
        .get_result(conn)
        .await?)
}

#[async_trait]
impl Store for PgStore {
    async fn list_vehicles(&self, query: &ListingQuery) -> ApiResult<(Vec<Vehicle>, i64)> {
        let mut conn = self.conn().await?;
        let total: i64 = filtered(&query.filter)
            .count()
            .get_result(&mut conn)
            .await?;
        let rows = sorted(filtered(&query.filter), query.sort, query.order)
            .offset(query.page.offset())
            .limit(query.page.page_size)
            .select(VehicleRow::as_select())
            .load(&mut conn)
            .await?;
        Ok((with_images(&mut conn, rows).await?, total))
    }

    async fn featured_vehicles(&self, limit: i64) -> ApiResult<Vec<Vehicle>> {
        let mut conn = self.conn().await?;
        let rows = vehicles::table
            .filter(vehicles::is_featured.eq(true))
            .filter(vehicles::availability_status.eq_any(on_sale()))
            .order((vehicles::created_at.desc(), vehicles::id.asc()))
            .limit(limit)
            .select(VehicleRow::as_select())
            .load(&mut conn)
            .await?;
        with_images(&mut conn, rows).await
    }

    async fn recent_vehicles(&self, limit: i64) -> ApiResult<Vec<Vehicle>> {
        let mut conn = self.conn().await?;
        let rows = vehicles::table
            .filter(vehicles::availability_status.eq_any(on_sale()))
            .order((vehicles::created_at.desc(), vehicles::id.asc()))
            .limit(limit)
            .select(VehicleRow::as_select())
            .load(&mut conn)
            .await?;
        with_images(&mut conn, rows).await
    }

    async fn vehicle_makes(&self) -> ApiResult<Vec<String>> {
        let mut conn = self.conn().await?;
        Ok(vehicles::table
            .select(vehicles::make)
            .distinct()
            .order(vehicles::make.asc())
            .load(&mut conn)
            .await?)
    }

    async fn vehicle_models(&self, make: &str) -> ApiResult<Vec<String>> {
        let mut conn = self.conn().await?;
        Ok(vehicles::table
            .filter(vehicles::make.ilike(like_pattern(make)))
            .select(vehicles::model)
            .distinct()
            .order(vehicles::model.asc())
            .load(&mut conn)
            .await?)
    }

    async fn get_vehicle(&self, id: Uuid) -> ApiResult<Vehicle> {
        let mut conn = self.conn().await?;
        load_vehicle(&mut conn, id).await
    }

    async fn create_vehicle(&self, new: NewVehicle) -> ApiResult<Vehicle> {
        let mut conn = self.conn().await?;
        let vehicle = new.into_vehicle(Uuid::new_v4(), now());
        diesel::insert_into(vehicles::table)
            .values(VehicleRow::from(&vehicle))
            .execute(&mut conn)
            .await?;
        Ok(vehicle)
    }

    async fn update_vehicle(&self, id: Uuid, update: VehicleUpdate) -> ApiResult<Vehicle> {
        let mut conn = self.conn().await?;
        let updated = diesel::update(vehicles::table.find(id))
            .set(VehicleChangeset::new(update, now()))
            .execute(&mut conn)
            .await?;
        if updated == 0 {
            return Err(ApiError::not_found("Vehicle"));
        }
        load_vehicle(&mut conn, id).await
    }

    async fn delete_vehicle(&self, id: Uuid) -> ApiResult<Vec<VehicleImage>> {
        let mut conn = self.conn().await?;
        conn.transaction::<_, ApiError, _>(|conn| {
            async move {
                let images: Vec<VehicleImageRow> = vehicle_images::table
                    .filter(vehicle_images::vehicle_id.eq(id))
                    .select(VehicleImageRow::as_select())
                    .load(conn)
                    .await?;
                // Images cascade and enquiries are detached by the foreign keys.
                let deleted = diesel::delete(vehicles::table.find(id))
                    .execute(conn)
                    .await?;
                if deleted == 0 {
                    return Err(ApiError::not_found("Vehicle"));
                }
                Ok(images.into_iter().map(Into::into).collect())
            }
            .scope_boxed()
        })
        .await
    }

    async fn increment_views(&self, id: Uuid) -> ApiResult<Vehicle> {
        let mut conn = self.conn().await?;
        let updated = diesel::update(vehicles::table.find(id))
            .set(vehicles::views_count.eq(vehicles::views_count + 1))
            .execute(&mut conn)
            .await?;
        if updated == 0 {
            return Err(ApiError::not_found("Vehicle"));
        }
        load_vehicle(&mut conn, id).await
    }

    async fn toggle_featured(&self, id: Uuid) -> ApiResult<Vehicle> {
        let mut conn = self.conn().await?;
        let updated = diesel::update(vehicles::table.find(id))
            .set((
                vehicles::is_featured.eq(diesel::dsl::not(vehicles::is_featured)),
                vehicles::updated_at.eq(now()),
            ))
            .execute(&mut conn)
            .await?;
        if updated == 0 {
            return Err(ApiError::not_found("Vehicle"));
        }
        load_vehicle(&mut conn, id).await
    }

    async fn add_vehicle_image(
        &self,
        vehicle_id: Uuid,
        image_url: String,
        is_primary: bool,
    ) -> ApiResult<VehicleImage> {
        let mut conn = self.conn().await?;
        let row = conn
            .transaction::<_, ApiError, _>(|conn| {
                async move {
                    let exists = vehicles::table
                        .find(vehicle_id)
                        .select(vehicles::id)
                        .first::<Uuid>(conn)
                        .await
                        .optional()?;
                    if exists.is_none() {
                        return Err(ApiError::not_found("Vehicle"));
                    }
                    if is_primary {
                        diesel::update(
                            vehicle_images::table
                                .filter(vehicle_images::vehicle_id.eq(vehicle_id))
                                .filter(vehicle_images::is_primary.eq(true)),
                        )
                        .set(vehicle_images::is_primary.eq(false))
                        .execute(conn)
                        .await?;
                    }
                    let existing: i64 = vehicle_images::table
                        .filter(vehicle_images::vehicle_id.eq(vehicle_id))
                        .count()
                        .get_result(conn)
                        .await?;
                    let row = VehicleImageRow {
                        id: Uuid::new_v4(),
                        vehicle_id,
                        image_url,
                        is_primary,
                        display_order: i32::try_from(existing).unwrap_or(i32::MAX),
                        uploaded_at: now(),
                    };
                    diesel::insert_into(vehicle_images::table)
                        .values(&row)
                        .execute(conn)
                        .await?;
                    Ok(row)
                }
                .scope_boxed()
            })
            .await?;
        Ok(row.into())
    }

    async fn get_vehicle_image(&self, id: Uuid) -> ApiResult<VehicleImage> {
        let mut conn = self.conn().await?;
        vehicle_images::table
            .find(id)
            .select(VehicleImageRow::as_select())
            .first(&mut conn)
            .await
            .optional()?
            .map(Into::into)
            .ok_or_else(|| ApiError::not_found("Image"))
    }

    async fn delete_vehicle_image(&self, id: Uuid) -> ApiResult<VehicleImage> {
        let mut conn = self.conn().await?;
        diesel::delete(vehicle_images::table.find(id))
            .returning(VehicleImageRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?
            .map(Into::into)
            .ok_or_else(|| ApiError::not_found("Image"))
    }

    async fn list_enquiries(
        &self,
        filter: EnquiryFilter,
        page: PageRequest,
    ) -> ApiResult<(Vec<Enquiry>, i64)> {
        let mut conn = self.conn().await?;
        let scoped = || {
            let mut query: enquiries::BoxedQuery<'static, Pg> = enquiries::table.into_boxed();
            if let Some(status) = filter.status {
                query = query.filter(enquiries::status.eq(status.as_str()));
            }
            if let Some(kind) = filter.enquiry_type {
                query = query.filter(enquiries::enquiry_type.eq(kind.as_str()));
            }
            query
        };
        let total: i64 = scoped().count().get_result(&mut conn).await?;
        let rows = scoped()
            .order((enquiries::created_at.desc(), enquiries::id.asc()))
            .offset(page.offset())
            .limit(page.page_size)
            .select(EnquiryRow::as_select())
            .load(&mut conn)
            .await?;
        Ok((enquiries_with_titles(&mut conn, rows).await?, total))
    }

    async fn get_enquiry(&self, id: Uuid) -> ApiResult<Enquiry> {
        let mut conn = self.conn().await?;
        let row = enquiries::table
            .find(id)
            .select(EnquiryRow::as_select())
            .first(&mut conn)
            .await
            .optional()?
            .ok_or_else(|| ApiError::not_found("Enquiry"))?;
        one_enquiry(&mut conn, row).await
    }

    async fn create_enquiry(&self, new: NewEnquiry) -> ApiResult<Enquiry> {
        let mut conn = self.conn().await?;
        let vehicle_title = match new.vehicle_id {
            Some(vehicle_id) => Some(load_vehicle(&mut conn, vehicle_id).await?.title()),
            None => None,
        };
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
            vehicle_title,
        };
        diesel::insert_into(enquiries::table)
            .values(EnquiryRow::from(&enquiry))
            .execute(&mut conn)
            .await?;
        Ok(enquiry)
    }

    async fn update_enquiry_status(&self, id: Uuid, status: EnquiryStatus) -> ApiResult<Enquiry> {
        let mut conn = self.conn().await?;
        let target = diesel::update(enquiries::table.find(id));
        let row = if status.marks_response() {
            target
                .set((
                    enquiries::status.eq(status.as_str()),
                    enquiries::responded_at.eq(now()),
                ))
                .returning(EnquiryRow::as_returning())
                .get_result(&mut conn)
                .await
        } else {
            target
                .set(enquiries::status.eq(status.as_str()))
                .returning(EnquiryRow::as_returning())
                .get_result(&mut conn)
                .await
        }
        .optional()?
        .ok_or_else(|| ApiError::not_found("Enquiry"))?;
        one_enquiry(&mut conn, row).await
    }

    async fn delete_enquiry(&self, id: Uuid) -> ApiResult<()> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(enquiries::table.find(id))
            .execute(&mut conn)
            .await?;
        if deleted == 0 {
            return Err(ApiError::not_found("Enquiry"));
        }
        Ok(())
    }

    async fn list_sell_requests(
        &self,
        status: Option<SellRequestStatus>,
        page: PageRequest,
    ) -> ApiResult<(Vec<SellRequest>, i64)> {
        let mut conn = self.conn().await?;
        let scoped = || {
            let mut query: sell_requests::BoxedQuery<'static, Pg> =
                sell_requests::table.into_boxed();
            if let Some(status) = status {
                query = query.filter(sell_requests::status.eq(status.as_str()));
            }
            query
        };
        let total: i64 = scoped().count().get_result(&mut conn).await?;
        let rows = scoped()
            .order((sell_requests::created_at.desc(), sell_requests::id.asc()))
            .offset(page.offset())
            .limit(page.page_size)
            .select(SellRequestRow::as_select())
            .load(&mut conn)
            .await?;
        Ok((with_sell_images(&mut conn, rows).await?, total))
    }

    async fn get_sell_request(&self, id: Uuid) -> ApiResult<SellRequest> {
        let mut conn = self.conn().await?;
        load_sell_request(&mut conn, id).await
    }

    async fn create_sell_request(&self, new: NewSellRequest) -> ApiResult<SellRequest> {
        let mut conn = self.conn().await?;
        let request = new.into_sell_request(Uuid::new_v4(), now());
        diesel::insert_into(sell_requests::table)
            .values(SellRequestRow::from(&request))
            .execute(&mut conn)
            .await?;
        Ok(request)
    }

    async fn update_sell_request_status(
        &self,
        id: Uuid,
        status: SellRequestStatus,
    ) -> ApiResult<SellRequest> {
        let mut conn = self.conn().await?;
        let updated = diesel::update(sell_requests::table.find(id))
            .set((
                sell_requests::status.eq(status.as_str()),
                sell_requests::updated_at.eq(now()),
            ))
            .execute(&mut conn)
            .await?;
        if updated == 0 {
            return Err(ApiError::not_found("Sell request"));
        }
        load_sell_request(&mut conn, id).await
    }

    async fn set_valuation(&self, id: Uuid, amount: f64) -> ApiResult<SellRequest> {
        let mut conn = self.conn().await?;
        let updated = diesel::update(sell_requests::table.find(id))
            .set((
                sell_requests::valuation_amount.eq(amount),
                sell_requests::status.eq(SellRequestStatus::Valued.as_str()),
                sell_requests::updated_at.eq(now()),
            ))
            .execute(&mut conn)
            .await?;
        if updated == 0 {
            return Err(ApiError::not_found("Sell request"));
        }
        load_sell_request(&mut conn, id).await
    }

    async fn delete_sell_request(&self, id: Uuid) -> ApiResult<Vec<SellRequestImage>> {
        let mut conn = self.conn().await?;
        conn.transaction::<_, ApiError, _>(|conn| {
            async move {
                let images: Vec<SellRequestImageRow> = sell_request_images::table
                    .filter(sell_request_images::sell_request_id.eq(id))
                    .select(SellRequestImageRow::as_select())
                    .load(conn)
                    .await?;
                let deleted = diesel::delete(sell_requests::table.find(id))
                    .execute(conn)
                    .await?;
                if deleted == 0 {
                    return Err(ApiError::not_found("Sell request"));
                }
                Ok(images.into_iter().map(Into::into).collect())
            }
            .scope_boxed()
        })
        .await
    }

    async fn add_sell_request_image(
        &self,
        sell_request_id: Uuid,
        image_url: String,
    ) -> ApiResult<SellRequestImage> {
        let mut conn = self.conn().await?;
        let exists = sell_requests::table
            .find(sell_request_id)
            .select(sell_requests::id)
            .first::<Uuid>(&mut conn)
            .await
            .optional()?;
        if exists.is_none() {
            return Err(ApiError::not_found("Sell request"));
        }
        let row = SellRequestImageRow {
            id: Uuid::new_v4(),
            sell_request_id,
            image_url,
            uploaded_at: now(),
        };
        diesel::insert_into(sell_request_images::table)
            .values(&row)
            .execute(&mut conn)
            .await?;
        Ok(row.into())
    }

    async fn list_brands(&self, active_only: bool) -> ApiResult<Vec<Brand>> {
        let mut conn = self.conn().await?;
        let mut query: brands::BoxedQuery<'static, Pg> = brands::table.into_boxed();
        if active_only {
            query = query.filter(brands::is_active.eq(true));
        }
        let rows = query
            .order((brands::display_order.asc(), brands::name.asc()))
            .select(BrandRow::as_select())
            .load(&mut conn)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_brand(&self, new: NewBrand) -> ApiResult<Brand> {
        let mut conn = self.conn().await?;
        let taken = brands::table
            .filter(brands::name.eq(&new.name))
            .count()
            .get_result::<i64>(&mut conn)
            .await?;
        if taken > 0 {
            return Err(ApiError::Conflict(duplicate_brand(&new.name)));
        }
        let row = BrandRow {
            id: Uuid::new_v4(),
            name: new.name,
            logo_url: new.logo_url,
            display_order: new.display_order,
            is_active: new.is_active,
        };
        diesel::insert_into(brands::table)
            .values(&row)
            .execute(&mut conn)
            .await?;
        Ok(row.into())
    }

    async fn update_brand(&self, id: Uuid, update: BrandUpdate) -> ApiResult<Brand> {
        let mut conn = self.conn().await?;
        if let Some(name) = &update.name {
            let taken = brands::table
                .filter(brands::name.eq(name))
                .filter(brands::id.ne(id))
                .count()
                .get_result::<i64>(&mut conn)
                .await?;
            if taken > 0 {
                return Err(ApiError::Conflict(duplicate_brand(name)));
            }
        }
        let row = if update.is_empty() {
            brands::table
                .find(id)
                .select(BrandRow::as_select())
                .first(&mut conn)
                .await
        } else {
            diesel::update(brands::table.find(id))
                .set(BrandChangeset::from(update))
                .returning(BrandRow::as_returning())
                .get_result(&mut conn)
                .await
        };
        row.optional()?
            .map(Into::into)
            .ok_or_else(|| ApiError::not_found("Brand"))
    }

    async fn delete_brand(&self, id: Uuid) -> ApiResult<()> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(brands::table.find(id))
            .execute(&mut conn)
            .await?;
        if deleted == 0 {
            return Err(ApiError::not_found("Brand"));
        }
        Ok(())
    }

    async fn list_users(&self) -> ApiResult<Vec<User>> {
        let mut conn = self.conn().await?;
        users::table
            .order((users::created_at.desc(), users::id.asc()))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await?
            .into_iter()
            .map(UserRow::into_user)
            .collect()
    }

    async fn get_user(&self, id: Uuid) -> ApiResult<User> {
        let mut conn = self.conn().await?;
        users::table
            .find(id)
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()?
            .ok_or_else(|| ApiError::not_found("User"))?
            .into_user()
    }

    async fn find_user_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let mut conn = self.conn().await?;
        users::table
            .filter(users::email.eq(email))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()?
            .map(UserRow::into_user)
            .transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> ApiResult<Option<User>> {
        let mut conn = self.conn().await?;
        users::table
            .filter(users::username.eq(username))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()?
            .map(UserRow::into_user)
            .transpose()
    }

    async fn create_user(&self, new: NewUserRecord) -> ApiResult<User> {
        let mut conn = self.conn().await?;
        let taken = users::table
            .filter(users::email.eq(&new.email).or(users::username.eq(&new.username)))
            .count()
            .get_result::<i64>(&mut conn)
            .await?;
        if taken > 0 {
            return Err(ApiError::Conflict(DUPLICATE_USER.to_string()));
        }
        let user = new.into_user(Uuid::new_v4(), now());
        diesel::insert_into(users::table)
            .values(UserRow::from(&user))
            .execute(&mut conn)
            .await?;
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, update: UserUpdate) -> ApiResult<User> {
        let mut conn = self.conn().await?;
        if update.email.is_some() || update.username.is_some() {
            let email = update.email.clone().unwrap_or_default();
            let username = update.username.clone().unwrap_or_default();
            let taken = users::table
                .filter(users::id.ne(id))
                .filter(users::email.eq(email).or(users::username.eq(username)))
                .count()
                .get_result::<i64>(&mut conn)
                .await?;
            if taken > 0 {
                return Err(ApiError::Conflict(DUPLICATE_USER.to_string()));
            }
        }
        diesel::update(users::table.find(id))
            .set(UserChangeset::new(update, now()))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()?
            .ok_or_else(|| ApiError::not_found("User"))?
            .into_user()
    }

    async fn record_login(&self, id: Uuid) -> ApiResult<()> {
        let mut conn = self.conn().await?;
        diesel::update(users::table.find(id))
            .set(users::last_login.eq(now()))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn count_admins(&self) -> ApiResult<i64> {
        let mut conn = self.conn().await?;
        Ok(users::table
            .filter(users::role.eq(UserRole::Admin.as_str()))
            .count()
            .get_result(&mut conn)
            .await?)
    }

    async fn subscribe(&self, email: &str) -> ApiResult<SubscribeOutcome> {
        let mut conn = self.conn().await?;
        let existing = newsletter_subscribers::table
            .filter(newsletter_subscribers::email.eq(email))
            .select(SubscriberRow::as_select())
            .first(&mut conn)
            .await
            .optional()?;
        match existing {
            Some(row) if row.is_active => Err(ApiError::Conflict(ALREADY_SUBSCRIBED.to_string())),
            Some(row) => {
                diesel::update(newsletter_subscribers::table.find(row.id))
                    .set(newsletter_subscribers::is_active.eq(true))
                    .execute(&mut conn)
                    .await?;
                Ok(SubscribeOutcome::Reactivated)
            }
            None => {
                let subscriber = NewsletterSubscriber {
                    id: Uuid::new_v4(),
                    email: email.to_string(),
                    subscribed_at: now(),
                    is_active: true,
                };
                diesel::insert_into(newsletter_subscribers::table)
                    .values(SubscriberRow::from(&subscriber))
                    .execute(&mut conn)
                    .await?;
                Ok(SubscribeOutcome::Subscribed)
            }
        }
    }

    async fn public_stats(&self) -> ApiResult<PublicStats> {
        let mut conn = self.conn().await?;
        Ok(PublicStats {
            total_vehicles: vehicles::table.count().get_result(&mut conn).await?,
            total_brands: brands::table
                .filter(brands::is_active.eq(true))
                .count()
                .get_result(&mut conn)
                .await?,
            vehicles_available: count_vehicles_with_status(&mut conn, &on_sale()).await?,
            vehicles_sold: count_vehicles_with_status(
                &mut conn,
                &[AvailabilityStatus::Sold.as_str()],
            )
            .await?,
        })
    }

    async fn dashboard_counts(&self, now: NaiveDateTime) -> ApiResult<DashboardCounts> {
        let mut conn = self.conn().await?;
        let this_week_start = now - Duration::days(7);
        let last_week_start = now - Duration::days(14);
        let available = AvailabilityStatus::Available.as_str();
        let sold = AvailabilityStatus::Sold.as_str();

        let total_views: Option<i64> = vehicles::table
            .select(diesel::dsl::sum(vehicles::views_count))
            .first(&mut conn)
            .await?;
        let total_inventory_value: Option<f64> = vehicles::table
            .filter(vehicles::availability_status.eq(available))
            .select(diesel::dsl::sum(vehicles::price))
            .first(&mut conn)
            .await?;
        let sold_spans: Vec<(NaiveDateTime, NaiveDateTime)> = vehicles::table
            .filter(vehicles::availability_status.eq(sold))
            .select((vehicles::created_at, vehicles::updated_at))
            .load(&mut conn)
            .await?;

        Ok(DashboardCounts {
            total_vehicles: vehicles::table.count().get_result(&mut conn).await?,
            vehicles_available: count_vehicles_with_status(&mut conn, &[available]).await?,
            vehicles_sold: count_vehicles_with_status(&mut conn, &[sold]).await?,
            featured_vehicles: vehicles::table
                .filter(vehicles::is_featured.eq(true))
                .count()
                .get_result(&mut conn)
                .await?,
            total_enquiries: enquiries::table.count().get_result(&mut conn).await?,
            new_enquiries: enquiries::table
                .filter(enquiries::status.eq(EnquiryStatus::New.as_str()))
                .count()
                .get_result(&mut conn)
                .await?,
            enquiries_this_week: enquiries::table
                .filter(enquiries::created_at.ge(this_week_start))
                .count()
                .get_result(&mut conn)
                .await?,
            enquiries_last_week: enquiries::table
                .filter(enquiries::created_at.ge(last_week_start))
                .filter(enquiries::created_at.lt(this_week_start))
                .count()
                .get_result(&mut conn)
                .await?,
            total_sell_requests: sell_requests::table.count().get_result(&mut conn).await?,
            pending_sell_requests: sell_requests::table
                .filter(sell_requests::status.eq(SellRequestStatus::Pending.as_str()))
                .count()
                .get_result(&mut conn)
                .await?,
            total_views: total_views.unwrap_or(0),
            total_inventory_value: total_inventory_value.unwrap_or(0.0),
            sold_days: sold_spans
                .into_iter()
                .map(|(created, updated)| (updated - created).num_days())
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BodyType;
    use diesel::debug_query;

    fn sql<Q: diesel::query_builder::QueryFragment<Pg>>(query: &Q) -> String {
        debug_query::<Pg, _>(query).to_string()
    }

    #[test]
    fn search_is_one_or_group_anded_with_the_other_filters() {
        let filter = VehicleFilter {
            make: Some("toyota".into()),
            price_min: Some(500_000.0),
            price_max: Some(900_000.0),
            search: Some("50%".into()),
            ..Default::default()
        };
        let rendered = sql(&sorted(filtered(&filter), SortKey::Price, SortOrder::Asc));

        assert!(rendered.contains(r#""vehicles"."make" ILIKE $1"#), "{rendered}");
        assert!(rendered.contains(r#""vehicles"."price" >= $2"#), "{rendered}");
        assert!(rendered.contains(r#""vehicles"."price" <= $3"#), "{rendered}");
        let search_group = concat!(
            r#" AND (("vehicles"."make" ILIKE $4 OR "vehicles"."model" ILIKE $5)"#,
            r#" OR "vehicles"."description" ILIKE $6)"#,
        );
        assert!(rendered.contains(search_group), "{rendered}");
        assert!(
            rendered.contains(r#"ORDER BY "vehicles"."price" ASC, "vehicles"."id" ASC"#),
            "{rendered}"
        );
        // Wildcards typed by the user are escaped in the bound pattern.
        assert!(rendered.contains(r#""%toyota%""#), "{rendered}");
        assert!(rendered.contains(r#""%50\\%%""#), "{rendered}");
    }

    #[test]
    fn every_sort_ends_with_the_id_tie_break() {
        for key in [SortKey::CreatedAt, SortKey::Price, SortKey::Year, SortKey::Mileage] {
            for order in [SortOrder::Asc, SortOrder::Desc] {
                let rendered = sql(&sorted(filtered(&VehicleFilter::default()), key, order));
                assert!(rendered.contains(r#", "vehicles"."id" ASC"#), "{rendered}");
                assert!(!rendered.contains("WHERE"), "{rendered}");
            }
        }

        // Relies on the Postgres default of NULLs last ascending, first descending.
        let rendered = sql(&sorted(
            filtered(&VehicleFilter::default()),
            SortKey::Mileage,
            SortOrder::Asc,
        ));
        assert!(
            rendered.contains(r#"ORDER BY "vehicles"."mileage" ASC, "vehicles"."id" ASC"#),
            "{rendered}"
        );
        assert!(!rendered.contains("NULLS"), "{rendered}");
    }

    #[test]
    fn exact_filters_bind_stored_text() {
        let filter = VehicleFilter {
            body_type: Some(BodyType::Suv),
            availability_status: Some(AvailabilityStatus::DirectImport),
            is_featured: Some(true),
            ..Default::default()
        };
        let rendered = sql(&filtered(&filter).count());

        assert!(rendered.starts_with("SELECT COUNT(*) FROM \"vehicles\""), "{rendered}");
        assert!(rendered.contains(r#""vehicles"."body_type" = $1"#), "{rendered}");
        assert!(rendered.contains(r#""vehicles"."availability_status" = $2"#), "{rendered}");
        assert!(rendered.contains(r#""vehicles"."is_featured" = $3"#), "{rendered}");
        assert!(rendered.contains(r#""SUV""#), "{rendered}");
        assert!(rendered.contains(r#""direct_import""#), "{rendered}");
        assert!(!rendered.contains("ORDER BY"), "{rendered}");
    }
}
