//! Catalog loading: a JSON file when configured, the bundled sample
//! products otherwise.

use std::{collections::HashSet, path::Path};

use jiff::Timestamp;
use rust_decimal::Decimal;
use tracing::info;

use super::{models::Product, CatalogError};
use crate::cart::pricing::Amount;

/// Reads and validates the catalog at `path`, or returns the sample catalog
/// when no path is given.
pub async fn load_catalog(path: Option<&Path>) -> Result<Vec<Product>, CatalogError> {
    let products = match path {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| CatalogError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
            let products: Vec<Product> = serde_json::from_str(&raw)?;
            info!(path = %path.display(), count = products.len(), "loaded catalog file");
            products
        }
        None => {
            info!("no catalog file configured, using sample products");
            sample_products()
        }
    };

    check_catalog(&products)?;

    Ok(products)
}

/// Every product must be valid and ids and slugs must be unique.
pub fn check_catalog(products: &[Product]) -> Result<(), CatalogError> {
    let mut ids = HashSet::new();
    let mut slugs = HashSet::new();

    for product in products {
        product.validate()?;

        if !ids.insert(product.id.as_str()) {
            return Err(CatalogError::Duplicate(format!("id {}", product.id)));
        }
        if !slugs.insert(product.slug.as_str()) {
            return Err(CatalogError::Duplicate(format!("slug {}", product.slug)));
        }
    }

    Ok(())
}

struct Sample {
    id: &'static str,
    name: &'static str,
    slug: &'static str,
    category: &'static str,
    brand: &'static str,
    description: &'static str,
    price_cents: i64,
    rating_tenths: i64,
    num_reviews: u32,
    stock: u32,
    banner: Option<&'static str>,
}

const SAMPLES: [Sample; 6] = [
    Sample {
        id: "p1",
        name: "Polo Sporting Stretch Shirt",
        slug: "polo-sporting-stretch-shirt",
        category: "Men's Dress Shirts",
        brand: "Polo",
        description: "Classic Polo style with modern comfort",
        price_cents: 5999,
        rating_tenths: 45,
        num_reviews: 10,
        stock: 5,
        banner: Some("banner-1.jpg"),
    },
    Sample {
        id: "p2",
        name: "Brooks Brothers Long Sleeved Shirt",
        slug: "brooks-brothers-long-sleeved-shirt",
        category: "Men's Dress Shirts",
        brand: "Brooks Brothers",
        description: "Timeless style and premium comfort",
        price_cents: 8590,
        rating_tenths: 42,
        num_reviews: 8,
        stock: 10,
        banner: Some("banner-2.jpg"),
    },
    Sample {
        id: "p3",
        name: "Tommy Hilfiger Classic Fit Dress Shirt",
        slug: "tommy-hilfiger-classic-fit-dress-shirt",
        category: "Men's Dress Shirts",
        brand: "Tommy Hilfiger",
        description: "A perfect blend of sophistication and comfort",
        price_cents: 9995,
        rating_tenths: 49,
        num_reviews: 3,
        stock: 0,
        banner: None,
    },
    Sample {
        id: "p4",
        name: "Calvin Klein Slim Fit Stretch Shirt",
        slug: "calvin-klein-slim-fit-stretch-shirt",
        category: "Men's Dress Shirts",
        brand: "Calvin Klein",
        description: "Streamlined design with flexible stretch fabric",
        price_cents: 3995,
        rating_tenths: 36,
        num_reviews: 5,
        stock: 10,
        banner: None,
    },
    Sample {
        id: "p5",
        name: "Polo Ralph Lauren Oxford Shirt",
        slug: "polo-ralph-lauren-oxford-shirt",
        category: "Men's Dress Shirts",
        brand: "Polo",
        description: "Iconic Polo design with refined oxford fabric",
        price_cents: 7999,
        rating_tenths: 47,
        num_reviews: 18,
        stock: 6,
        banner: None,
    },
    Sample {
        id: "p6",
        name: "Polo Classic Pink Hoodie",
        slug: "polo-classic-pink-hoodie",
        category: "Men's Sweatshirts",
        brand: "Polo",
        description: "Soft, stylish, and perfect for laid-back days",
        price_cents: 9999,
        rating_tenths: 46,
        num_reviews: 12,
        stock: 8,
        banner: None,
    },
];

/// First sample product's listing date; each following one is a day newer.
const SAMPLE_EPOCH_SECONDS: i64 = 1_735_689_600;

pub fn sample_products() -> Vec<Product> {
    SAMPLES
        .iter()
        .zip(0_i64..)
        .map(|(sample, day)| Product {
            id: sample.id.to_string(),
            name: sample.name.to_string(),
            slug: sample.slug.to_string(),
            category: sample.category.to_string(),
            brand: sample.brand.to_string(),
            description: sample.description.to_string(),
            stock: sample.stock,
            images: vec![
                format!("/images/sample-products/{}-1.jpg", sample.id),
                format!("/images/sample-products/{}-2.jpg", sample.id),
            ],
            is_featured: sample.banner.is_some(),
            banner: sample.banner.map(str::to_string),
            price: Amount::from_decimal(Decimal::new(sample.price_cents, 2)),
            rating: Decimal::new(sample.rating_tenths, 1),
            num_reviews: sample.num_reviews,
            created_at: Timestamp::from_second(SAMPLE_EPOCH_SECONDS + day * 86_400)
                .unwrap_or(Timestamp::UNIX_EPOCH),
        })
        .collect()
}
