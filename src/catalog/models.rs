//! Catalog Domain Models

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CatalogError;
use crate::cart::pricing::Amount;

/// Minimum length of the descriptive text fields of a product.
const MIN_TEXT_LEN: usize = 3;

/// A product as listed in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub category: String,
    pub brand: String,
    pub description: String,

    /// Units available for sale
    pub stock: u32,

    pub images: Vec<String>,

    #[serde(default)]
    pub is_featured: bool,

    /// Optional wide image used on the home page carousel
    #[serde(default)]
    pub banner: Option<String>,

    pub price: Amount,

    #[serde(default)]
    pub rating: Decimal,

    #[serde(default)]
    pub num_reviews: u32,

    pub created_at: Timestamp,
}

impl Product {
    /// Checks the listing rules a product must satisfy before it is sold.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let invalid = |reason: String| CatalogError::Invalid {
            product: self.id.clone(),
            reason,
        };

        if self.id.trim().is_empty() {
            return Err(invalid("id is required".to_string()));
        }

        let texts = [
            ("name", &self.name),
            ("slug", &self.slug),
            ("category", &self.category),
            ("brand", &self.brand),
            ("description", &self.description),
        ];
        for (field, value) in texts {
            if value.trim().chars().count() < MIN_TEXT_LEN {
                return Err(invalid(format!(
                    "{field} must be at least {MIN_TEXT_LEN} characters"
                )));
            }
        }

        if self.images.iter().all(|image| image.trim().is_empty()) {
            return Err(invalid("at least one image is required".to_string()));
        }

        if self.rating < Decimal::ZERO || self.rating > Decimal::from(5) {
            return Err(invalid("rating must be between 0 and 5".to_string()));
        }

        Ok(())
    }
}
