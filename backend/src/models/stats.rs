use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicStats {
    pub total_vehicles: i64,
    pub total_brands: i64,
    /// Available plus direct-import stock.
    pub vehicles_available: i64,
    pub vehicles_sold: i64,
}

/// Raw aggregates gathered by a store for the back-office dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardCounts {
    pub total_vehicles: i64,
    pub vehicles_available: i64,
    pub vehicles_sold: i64,
    pub featured_vehicles: i64,
    pub total_enquiries: i64,
    pub new_enquiries: i64,
    pub enquiries_this_week: i64,
    pub enquiries_last_week: i64,
    pub total_sell_requests: i64,
    pub pending_sell_requests: i64,
    pub total_views: i64,
    pub total_inventory_value: f64,
    /// Whole days between listing and the last update, one entry per sold vehicle.
    pub sold_days: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_vehicles: i64,
    pub total_enquiries: i64,
    pub total_sell_requests: i64,
    pub new_enquiries: i64,
    pub pending_sell_requests: i64,
    pub vehicles_available: i64,
    pub vehicles_sold: i64,
    pub featured_vehicles: i64,
    pub total_views: i64,
    pub enquiries_wow: f64,
    pub conversion_rate: f64,
    pub avg_days_to_sell: f64,
    pub total_inventory_value: f64,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

impl DashboardStats {
    pub fn from_counts(counts: DashboardCounts) -> Self {
        let this_week = counts.enquiries_this_week as f64;
        let last_week = counts.enquiries_last_week as f64;
        let enquiries_wow = if counts.enquiries_last_week > 0 {
            (this_week - last_week) / last_week * 100.0
        } else if counts.enquiries_this_week > 0 {
            100.0
        } else {
            0.0
        };

        let conversion_rate = if counts.total_views > 0 {
            counts.total_enquiries as f64 / counts.total_views as f64 * 100.0
        } else {
            0.0
        };

        let avg_days_to_sell = if counts.sold_days.is_empty() {
            0.0
        } else {
            counts.sold_days.iter().sum::<i64>() as f64 / counts.sold_days.len() as f64
        };

        Self {
            total_vehicles: counts.total_vehicles,
            total_enquiries: counts.total_enquiries,
            total_sell_requests: counts.total_sell_requests,
            new_enquiries: counts.new_enquiries,
            pending_sell_requests: counts.pending_sell_requests,
            vehicles_available: counts.vehicles_available,
            vehicles_sold: counts.vehicles_sold,
            featured_vehicles: counts.featured_vehicles,
            total_views: counts.total_views,
            enquiries_wow: round_to(enquiries_wow, 1),
            conversion_rate: round_to(conversion_rate, 2),
            avg_days_to_sell: round_to(avg_days_to_sell, 1),
            total_inventory_value: counts.total_inventory_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_metrics_are_rounded() {
        let stats = DashboardStats::from_counts(DashboardCounts {
            total_enquiries: 1,
            total_views: 3,
            enquiries_this_week: 4,
            enquiries_last_week: 3,
            sold_days: vec![10, 5, 6],
            ..Default::default()
        });

        assert_eq!(stats.enquiries_wow, 33.3);
        assert_eq!(stats.conversion_rate, 33.33);
        assert_eq!(stats.avg_days_to_sell, 7.0);
    }

    #[test]
    fn first_week_of_enquiries_counts_as_full_growth() {
        let stats = DashboardStats::from_counts(DashboardCounts {
            enquiries_this_week: 2,
            ..Default::default()
        });
        assert_eq!(stats.enquiries_wow, 100.0);
        assert_eq!(stats.conversion_rate, 0.0);
        assert_eq!(stats.avg_days_to_sell, 0.0);
    }
}
