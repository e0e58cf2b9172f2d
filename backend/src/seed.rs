//! First-boot data: the bootstrap admin account and the storefront brand list.

use crate::auth::hash_password;
use crate::config::AppConfig;
use crate::error::ApiResult;
use crate::models::{NewBrand, NewUserRecord, UserRole};
use crate::store::Store;

pub const DEFAULT_BRANDS: [&str; 16] = [
    "Toyota",
    "Nissan",
    "Honda",
    "Mazda",
    "Subaru",
    "Mercedes-Benz",
    "BMW",
    "Audi",
    "Volkswagen",
    "Land Rover",
    "Mitsubishi",
    "Suzuki",
    "Isuzu",
    "Ford",
    "Hyundai",
    "Kia",
];

/// Creates the configured admin unless an account with that email already exists.
/// Returns whether an account was created.
pub async fn ensure_default_admin(store: &dyn Store, config: &AppConfig) -> ApiResult<bool> {
    if store.find_user_by_email(&config.admin_email).await?.is_some() {
        return Ok(false);
    }
    let admin = store
        .create_user(NewUserRecord {
            username: "admin".to_string(),
            email: config.admin_email.clone(),
            password_hash: hash_password(&config.admin_password)?,
            full_name: Some("System Administrator".to_string()),
            role: UserRole::Admin,
        })
        .await?;
    log::info!("default admin created: {}", admin.email);
    Ok(true)
}

/// Seeds [`DEFAULT_BRANDS`] in order, only into an empty brand table.
pub async fn seed_brands(store: &dyn Store) -> ApiResult<usize> {
    if !store.list_brands(false).await?.is_empty() {
        return Ok(0);
    }
    for (position, name) in (1..).zip(DEFAULT_BRANDS) {
        store.create_brand(NewBrand::named(name, position)).await?;
    }
    log::info!("seeded {} brands", DEFAULT_BRANDS.len());
    Ok(DEFAULT_BRANDS.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::collections::HashMap;

    fn config() -> AppConfig {
        let vars: HashMap<String, String> = [
            ("DATABASE_URL", "memory://"),
            ("JWT_SECRET", "secret"),
            ("ADMIN_EMAIL", "boss@example.com"),
            ("ADMIN_PASSWORD", "changeme123"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        AppConfig::from_map(vars).unwrap()
    }

    #[tokio::test]
    async fn default_admin_is_created_once() {
        let store = MemoryStore::new();
        let config = config();

        assert!(ensure_default_admin(&store, &config).await.unwrap());
        assert!(!ensure_default_admin(&store, &config).await.unwrap());

        let admin = store
            .find_user_by_email("boss@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert!(crate::auth::verify_password("changeme123", &admin.password_hash));
        assert_eq!(store.count_admins().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn brands_seed_only_into_an_empty_table() {
        let store = MemoryStore::new();
        assert_eq!(seed_brands(&store).await.unwrap(), 16);
        assert_eq!(seed_brands(&store).await.unwrap(), 0);

        let brands = store.list_brands(true).await.unwrap();
        assert_eq!(brands.len(), 16);
        assert_eq!(brands[0].name, "Toyota");
        assert_eq!(brands[0].display_order, 1);
        assert_eq!(brands[15].name, "Kia");
    }

    #[tokio::test]
    async fn existing_brands_block_seeding() {
        let store = MemoryStore::new();
        store.create_brand(NewBrand::named("Peugeot", 1)).await.unwrap();
        assert_eq!(seed_brands(&store).await.unwrap(), 0);
        assert_eq!(store.list_brands(false).await.unwrap().len(), 1);
    }
}
