use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::double_option;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub logo_url: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewBrand {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl NewBrand {
    pub fn named(name: &str, display_order: i32) -> Self {
        Self {
            name: name.to_string(),
            logo_url: None,
            display_order,
            is_active: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BrandUpdate {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub logo_url: Option<Option<String>>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl BrandUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.logo_url.is_none()
            && self.display_order.is_none()
            && self.is_active.is_none()
    }

    pub fn apply(self, brand: &mut Brand) {
        if let Some(name) = self.name {
            brand.name = name;
        }
        if let Some(logo_url) = self.logo_url {
            brand.logo_url = logo_url;
        }
        if let Some(display_order) = self.display_order {
            brand.display_order = display_order;
        }
        if let Some(is_active) = self.is_active {
            brand.is_active = is_active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_must_not_be_blank() {
        assert!(NewBrand::named("Peugeot", 1).validate().is_ok());
        assert!(NewBrand::named("", 1).validate().is_err());

        let rename: BrandUpdate = serde_json::from_str(r#"{"name": ""}"#).unwrap();
        assert!(rename.validate().is_err());
        let hide: BrandUpdate = serde_json::from_str(r#"{"isActive": false}"#).unwrap();
        assert!(hide.validate().is_ok());
        assert!(!hide.is_empty());
    }
}
