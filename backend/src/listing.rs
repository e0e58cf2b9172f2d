//! Filtering, sorting and paging of the vehicle inventory.
//!
//! [`ListingQuery`] is built from raw query parameters and is evaluated either in memory
//! ([`VehicleFilter::matches`] and [`compare`]) or translated to SQL by the Postgres store.
//! Both paths must agree: filters are ANDed, the free-text search ORs make, model and
//! description, and ties on the sort key fall back to the vehicle id.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::models::{AvailabilityStatus, BodyType, FuelType, Transmission, Vehicle};

pub const PUBLIC_PAGE_SIZE: i64 = 12;
pub const PUBLIC_MAX_PAGE_SIZE: i64 = 50;
pub const ADMIN_PAGE_SIZE: i64 = 20;
pub const ADMIN_MAX_PAGE_SIZE: i64 = 100;

/// Raw listing parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingParams {
    pub page: Option<i64>,
    #[serde(alias = "limit", alias = "page_size")]
    pub page_size: Option<i64>,
    pub make: Option<String>,
    pub model: Option<String>,
    #[serde(alias = "min_price")]
    pub price_min: Option<f64>,
    #[serde(alias = "max_price")]
    pub price_max: Option<f64>,
    #[serde(alias = "min_year")]
    pub year_min: Option<i32>,
    #[serde(alias = "max_year")]
    pub year_max: Option<i32>,
    #[serde(alias = "body_type")]
    pub body_type: Option<BodyType>,
    pub transmission: Option<Transmission>,
    #[serde(alias = "fuel_type")]
    pub fuel_type: Option<FuelType>,
    #[serde(alias = "availability_status")]
    pub availability_status: Option<AvailabilityStatus>,
    pub location: Option<String>,
    #[serde(alias = "is_featured")]
    pub is_featured: Option<bool>,
    #[serde(alias = "search")]
    pub free_text_search: Option<String>,
    #[serde(alias = "sort_by")]
    pub sort_by: Option<String>,
    #[serde(alias = "sort_order")]
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    CreatedAt,
    Price,
    Year,
    Mileage,
}

impl SortKey {
    /// Unknown keys fall back to [`SortKey::CreatedAt`].
    pub fn parse(raw: &str) -> Self {
        match raw {
            "price" => SortKey::Price,
            "year" => SortKey::Year,
            "mileage" => SortKey::Mileage,
            _ => SortKey::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }
}

/// Optional predicates over vehicles. Blank text filters are treated as absent.
#[derive(Debug, Clone, Default)]
pub struct VehicleFilter {
    pub make: Option<String>,
    pub model: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub body_type: Option<BodyType>,
    pub transmission: Option<Transmission>,
    pub fuel_type: Option<FuelType>,
    pub availability_status: Option<AvailabilityStatus>,
    pub location: Option<String>,
    pub is_featured: Option<bool>,
    pub search: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn text_matches(filter: Option<&str>, value: Option<&str>) -> bool {
    match filter {
        Some(needle) => value.is_some_and(|v| contains_ci(v, needle)),
        None => true,
    }
}

fn exact_matches<T: PartialEq>(filter: Option<T>, value: Option<T>) -> bool {
    match filter {
        Some(wanted) => value == Some(wanted),
        None => true,
    }
}

impl VehicleFilter {
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        text_matches(self.make.as_deref(), Some(vehicle.make.as_str()))
            && text_matches(self.model.as_deref(), Some(vehicle.model.as_str()))
            && text_matches(self.location.as_deref(), vehicle.location.as_deref())
            && self.price_min.is_none_or(|min| vehicle.price >= min)
            && self.price_max.is_none_or(|max| vehicle.price <= max)
            && self.year_min.is_none_or(|min| vehicle.year >= min)
            && self.year_max.is_none_or(|max| vehicle.year <= max)
            && exact_matches(self.body_type, vehicle.body_type)
            && exact_matches(self.transmission, vehicle.transmission)
            && exact_matches(self.fuel_type, vehicle.fuel_type)
            && exact_matches(self.availability_status, Some(vehicle.availability_status))
            && exact_matches(self.is_featured, Some(vehicle.is_featured))
            && self.search.as_deref().is_none_or(|term| {
                contains_ci(&vehicle.make, term)
                    || contains_ci(&vehicle.model, term)
                    || vehicle
                        .description
                        .as_deref()
                        .is_some_and(|d| contains_ci(d, term))
            })
    }
}

/// Orders two vehicles by `key`, breaking ties by id ascending whatever the direction.
/// A missing mileage counts as larger than any recorded one.
pub fn compare(a: &Vehicle, b: &Vehicle, key: SortKey, order: SortOrder) -> Ordering {
    let primary = match key {
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        SortKey::Price => a.price.total_cmp(&b.price),
        SortKey::Year => a.year.cmp(&b.year),
        SortKey::Mileage => match (a.mileage, b.mileage) {
            (Some(x), Some(y)) => x.cmp(&y),
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (None, None) => Ordering::Equal,
        },
    };
    let primary = match order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub fn new(
        page: Option<i64>,
        page_size: Option<i64>,
        default_size: i64,
        max_size: i64,
    ) -> Result<Self, ApiError> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(default_size);
        if page < 1 {
            return Err(ApiError::validation("page must be at least 1"));
        }
        if !(1..=max_size).contains(&page_size) {
            return Err(ApiError::validation(format!(
                "pageSize must be between 1 and {max_size}"
            )));
        }
        Ok(Self { page, page_size })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Slices an already sorted in-memory result.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let size = usize::try_from(self.page_size).unwrap_or(0);
        items.iter().skip(offset).take(size).cloned().collect()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub page_count: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
            page_count: page_count(total, request.page_size),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            page_count: self.page_count,
        }
    }
}

pub fn page_count(total: i64, page_size: i64) -> i64 {
    if page_size <= 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}

/// Wraps user input for a case-insensitive substring `LIKE`, escaping `\`, `%` and `_`.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(Debug, Clone, Default)]
pub struct ListingQuery {
    pub filter: VehicleFilter,
    pub sort: SortKey,
    pub order: SortOrder,
    pub page: PageRequest,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: PUBLIC_PAGE_SIZE,
        }
    }
}

impl ListingQuery {
    pub fn from_params(
        params: ListingParams,
        default_size: i64,
        max_size: i64,
    ) -> Result<Self, ApiError> {
        if let (Some(min), Some(max)) = (params.price_min, params.price_max) {
            if min > max {
                return Err(ApiError::validation("priceMin must not exceed priceMax"));
            }
        }
        let page = PageRequest::new(params.page, params.page_size, default_size, max_size)?;
        Ok(Self {
            filter: VehicleFilter {
                make: non_blank(params.make),
                model: non_blank(params.model),
                price_min: params.price_min,
                price_max: params.price_max,
                year_min: params.year_min,
                year_max: params.year_max,
                body_type: params.body_type,
                transmission: params.transmission,
                fuel_type: params.fuel_type,
                availability_status: params.availability_status,
                location: non_blank(params.location),
                is_featured: params.is_featured,
                search: non_blank(params.free_text_search),
            },
            sort: params.sort_by.as_deref().map(SortKey::parse).unwrap_or_default(),
            order: params
                .sort_order
                .as_deref()
                .map(SortOrder::parse)
                .unwrap_or_default(),
            page,
        })
    }
}

/// Bound for the short storefront lists (featured, recent).
#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

impl LimitParams {
    pub fn resolve(&self) -> Result<i64, ApiError> {
        let limit = self.limit.unwrap_or(8);
        if !(1..=20).contains(&limit) {
            return Err(ApiError::validation("limit must be between 1 and 20"));
        }
        Ok(limit)
    }
}
