//! Carts service.
//!
//! Read-modify-write over a single cart. Every write goes through
//! [`NewCart`] or [`CartPatch`], both of which price their items on
//! construction, so totals cannot drift from the lines they describe.

use std::{future::Future, sync::Arc};

use tracing::{info, warn};

use super::{
    errors::CartError,
    models::{
        Cart, CartItem, CartItemInput, CartKey, CartPatch, CartState, CartUpdate, NewCart,
    },
};
use crate::{
    catalog::models::Product,
    store::{CartStore, ProductStore},
};

/// Write attempts made before a persistent conflict is reported.
pub const DEFAULT_MAX_WRITE_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartStore>,
    products: Arc<dyn ProductStore>,
    max_attempts: u32,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartStore>, products: Arc<dyn ProductStore>) -> Self {
        Self {
            carts,
            products,
            max_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
        }
    }

    /// Number of tries for a write that keeps losing optimistic-concurrency
    /// races. Clamped to at least one.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// The cart addressed by `key`, if one has been created.
    pub async fn get_cart(&self, key: &CartKey) -> Result<Option<Cart>, CartError> {
        Ok(self.carts.find_cart(key).await?)
    }

    /// Adds a product line, or one more unit of a line already in the cart.
    pub async fn add_item(
        &self,
        key: &CartKey,
        input: CartItemInput,
    ) -> Result<CartUpdate, CartError> {
        let item = input.validate()?;
        if item.qty == 0 {
            return Err(CartError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let product = self
            .products
            .find_product(&item.product_id)
            .await?
            .ok_or_else(|| CartError::NotFound("Product not found".to_string()))?;

        self.with_retries(&item.product_id, || self.try_add_item(key, &item, &product))
            .await
    }

    /// Takes one unit of `product_id` out of the cart, dropping the line when
    /// its last unit goes.
    pub async fn remove_one_unit(
        &self,
        key: &CartKey,
        product_id: &str,
    ) -> Result<CartUpdate, CartError> {
        self.with_retries(product_id, || self.try_remove_one_unit(key, product_id))
            .await
    }

    async fn try_add_item(
        &self,
        key: &CartKey,
        item: &CartItem,
        product: &Product,
    ) -> Result<CartUpdate, CartError> {
        let Some(cart) = self.carts.find_cart(key).await? else {
            let cart = self
                .carts
                .create_cart(NewCart::new(key.clone(), vec![item.clone()]))
                .await?;
            info!(cart_id = %cart.id, product_id = %product.id, "cart created");

            return Ok(CartUpdate {
                cart,
                state: CartState::Created,
                message: format!("{} added to cart", product.name),
            });
        };

        let mut items = cart.items;
        let message = match items.iter_mut().find(|l| l.product_id == item.product_id) {
            Some(line) => {
                let wanted = line.qty.checked_add(1).ok_or_else(out_of_stock)?;
                ensure_stock(product, wanted)?;
                line.qty = wanted;
                format!("{} updated in cart successfully", product.name)
            }
            None => {
                ensure_stock(product, 1)?;
                items.push(item.clone());
                format!("{} added to cart successfully", product.name)
            }
        };

        let cart = self
            .carts
            .update_cart(cart.id, CartPatch::new(items, cart.version))
            .await?;
        info!(cart_id = %cart.id, product_id = %product.id, version = cart.version, "cart item added");

        Ok(CartUpdate {
            cart,
            state: CartState::Updated,
            message,
        })
    }

    async fn try_remove_one_unit(
        &self,
        key: &CartKey,
        product_id: &str,
    ) -> Result<CartUpdate, CartError> {
        let cart = self
            .carts
            .find_cart(key)
            .await?
            .ok_or_else(|| CartError::NotFound("Cart not found".to_string()))?;

        let mut items = cart.items;
        let line = items
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or_else(|| CartError::NotFound("Item not found in cart".to_string()))?;

        let name = line.name.clone();
        let removed = line.qty <= 1;
        if removed {
            items.retain(|l| l.product_id != product_id);
        } else {
            line.qty -= 1;
        }

        let cart = self
            .carts
            .update_cart(cart.id, CartPatch::new(items, cart.version))
            .await?;
        info!(cart_id = %cart.id, product_id, removed, "cart item decremented");

        let (state, message) = match (cart.is_empty(), removed) {
            (true, _) => (
                CartState::Empty,
                format!("{name} removed from cart successfully"),
            ),
            (false, true) => (
                CartState::Updated,
                format!("{name} removed from cart successfully"),
            ),
            (false, false) => (
                CartState::Updated,
                format!("{name} updated in cart successfully"),
            ),
        };

        Ok(CartUpdate {
            cart,
            state,
            message,
        })
    }

    /// Re-runs `attempt` while the store reports a lost race.
    async fn with_retries<F, Fut>(
        &self,
        product_id: &str,
        mut attempt: F,
    ) -> Result<CartUpdate, CartError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<CartUpdate, CartError>>,
    {
        let mut tries = 1;
        loop {
            match attempt().await {
                Err(CartError::Store(e)) if e.is_conflict() && tries < self.max_attempts => {
                    warn!(product_id, tries, "cart write conflicted, retrying: {e}");
                    tries += 1;
                }
                result => return result,
            }
        }
    }
}

fn out_of_stock() -> CartError {
    CartError::Stock("Not enough stock".to_string())
}

fn ensure_stock(product: &Product, wanted: u32) -> Result<(), CartError> {
    if product.stock < wanted {
        return Err(out_of_stock());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use mockall::Sequence;
    use serde_json::json;
    use testresult::TestResult;
    use uuid::Uuid;

    use super::*;
    use crate::{
        cart::pricing::compute_totals,
        store::{MemoryStore, MockCartStore, StoreError},
    };

    fn product(id: &str, price: &str, stock: u32) -> TestResult<Product> {
        Ok(Product {
            id: id.into(),
            name: format!("Product {id}"),
            slug: format!("product-{id}"),
            category: "Men's Dress Shirts".into(),
            brand: "Polo".into(),
            description: "A product used in tests".into(),
            stock,
            images: vec![format!("/images/{id}.jpg")],
            is_featured: false,
            banner: None,
            price: price.parse()?,
            rating: Default::default(),
            num_reviews: 0,
            created_at: Timestamp::now(),
        })
    }

    fn input(product: &Product) -> CartItemInput {
        CartItemInput {
            product_id: product.id.clone(),
            name: product.name.clone(),
            slug: product.slug.clone(),
            image: format!("/images/{}.jpg", product.id),
            qty: 1,
            price: json!(product.price.to_string()),
        }
    }

    fn service(products: Vec<Product>) -> (Arc<MemoryStore>, CartService) {
        let store = Arc::new(MemoryStore::with_products(products));
        let service = CartService::new(store.clone(), store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn first_add_creates_priced_cart() -> TestResult {
        let p1 = product("p1", "25.00", 5)?;
        let (_, carts) = service(vec![p1.clone()]);
        let key = CartKey::anonymous("s1");

        let update = carts.add_item(&key, input(&p1)).await?;

        assert_eq!(update.state, CartState::Created);
        assert_eq!(update.message, "Product p1 added to cart");
        assert_eq!(update.cart.items.len(), 1);
        assert_eq!(update.cart.items[0].qty, 1);
        assert_eq!(update.cart.totals.items_price.to_string(), "25.00");
        assert_eq!(update.cart.totals.shipping_price.to_string(), "10.00");
        assert_eq!(update.cart.totals.tax_price.to_string(), "3.75");
        assert_eq!(update.cart.totals.total_price.to_string(), "38.75");

        Ok(())
    }

    #[tokio::test]
    async fn adding_same_product_twice_increments_quantity() -> TestResult {
        let p1 = product("p1", "25.00", 5)?;
        let (_, carts) = service(vec![p1.clone()]);
        let key = CartKey::anonymous("s1");

        carts.add_item(&key, input(&p1)).await?;
        let update = carts.add_item(&key, input(&p1)).await?;

        assert_eq!(update.state, CartState::Updated);
        assert_eq!(update.message, "Product p1 updated in cart successfully");
        assert_eq!(update.cart.items.len(), 1);
        assert_eq!(update.cart.items[0].qty, 2);
        assert_eq!(update.cart.totals.items_price.to_string(), "50.00");

        Ok(())
    }

    #[tokio::test]
    async fn new_line_is_appended_in_order() -> TestResult {
        let p1 = product("p1", "25.00", 5)?;
        let p2 = product("p2", "45.00", 5)?;
        let (_, carts) = service(vec![p1.clone(), p2.clone()]);
        let key = CartKey::anonymous("s1");

        carts.add_item(&key, input(&p1)).await?;
        let update = carts.add_item(&key, input(&p2)).await?;

        assert_eq!(update.message, "Product p2 added to cart successfully");
        let ids: Vec<_> = update.cart.items.iter().map(|i| i.product_id.as_str()).collect();
        assert_eq!(ids, ["p1", "p2"]);

        Ok(())
    }

    #[tokio::test]
    async fn re_adding_beyond_stock_fails_and_leaves_cart_unchanged() -> TestResult {
        let p1 = product("p1", "25.00", 1)?;
        let (_, carts) = service(vec![p1.clone()]);
        let key = CartKey::anonymous("s1");

        let before = carts.add_item(&key, input(&p1)).await?.cart;
        let result = carts.add_item(&key, input(&p1)).await;

        assert!(
            matches!(result, Err(CartError::Stock(_))),
            "expected stock error, got {result:?}"
        );
        assert_eq!(carts.get_cart(&key).await?, Some(before));

        Ok(())
    }

    #[tokio::test]
    async fn first_add_creates_cart_without_stock_check() -> TestResult {
        let p1 = product("p1", "25.00", 0)?;
        let (store, carts) = service(vec![p1.clone()]);

        let update = carts.add_item(&CartKey::anonymous("s1"), input(&p1)).await?;

        assert_eq!(update.state, CartState::Created);
        assert_eq!(store.cart_count(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn out_of_stock_product_cannot_be_appended() -> TestResult {
        let p1 = product("p1", "25.00", 5)?;
        let p2 = product("p2", "45.00", 0)?;
        let (_, carts) = service(vec![p1.clone(), p2.clone()]);
        let key = CartKey::anonymous("s1");

        let before = carts.add_item(&key, input(&p1)).await?.cart;
        let result = carts.add_item(&key, input(&p2)).await;

        assert!(matches!(result, Err(CartError::Stock(_))), "got {result:?}");
        assert_eq!(carts.get_cart(&key).await?, Some(before));

        Ok(())
    }

    #[tokio::test]
    async fn new_line_only_needs_one_unit_in_stock() -> TestResult {
        let p1 = product("p1", "25.00", 5)?;
        let p2 = product("p2", "45.00", 1)?;
        let (_, carts) = service(vec![p1.clone(), p2.clone()]);
        let key = CartKey::anonymous("s1");

        carts.add_item(&key, input(&p1)).await?;
        let mut two = input(&p2);
        two.qty = 2;
        let update = carts.add_item(&key, two).await?;

        assert_eq!(update.state, CartState::Updated);
        assert_eq!(update.cart.items[1].qty, 2);

        Ok(())
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() -> TestResult {
        let p1 = product("p1", "25.00", 5)?;
        let (_, carts) = service(vec![]);

        let result = carts.add_item(&CartKey::anonymous("s1"), input(&p1)).await;

        assert!(
            matches!(&result, Err(CartError::NotFound(m)) if m == "Product not found"),
            "got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn malformed_item_is_a_validation_error() -> TestResult {
        let p1 = product("p1", "25.00", 5)?;
        let (_, carts) = service(vec![p1.clone()]);

        let mut bad = input(&p1);
        bad.qty = -2;
        let negative = carts.add_item(&CartKey::anonymous("s1"), bad).await;

        let mut zero = input(&p1);
        zero.qty = 0;
        let empty = carts.add_item(&CartKey::anonymous("s1"), zero).await;

        assert!(matches!(negative, Err(CartError::Validation(_))), "got {negative:?}");
        assert!(matches!(empty, Err(CartError::Validation(_))), "got {empty:?}");

        Ok(())
    }

    #[tokio::test]
    async fn combined_subtotal_over_threshold_ships_free() -> TestResult {
        let p1 = product("p1", "25.00", 5)?;
        let p2 = product("p2", "45.00", 5)?;
        let (_, carts) = service(vec![p1.clone(), p2.clone()]);
        let key = CartKey::anonymous("s1");

        for _ in 0..3 {
            carts.add_item(&key, input(&p1)).await?;
        }
        let update = carts.add_item(&key, input(&p2)).await?;

        assert_eq!(update.cart.totals.items_price.to_string(), "120.00");
        assert_eq!(update.cart.totals.shipping_price.to_string(), "0.00");

        Ok(())
    }

    #[tokio::test]
    async fn removing_last_unit_empties_cart() -> TestResult {
        let p1 = product("p1", "25.00", 5)?;
        let (_, carts) = service(vec![p1.clone()]);
        let key = CartKey::anonymous("s1");

        carts.add_item(&key, input(&p1)).await?;
        let update = carts.remove_one_unit(&key, "p1").await?;

        assert_eq!(update.state, CartState::Empty);
        assert_eq!(update.message, "Product p1 removed from cart successfully");
        assert!(update.cart.items.is_empty());
        for amount in [
            update.cart.totals.items_price,
            update.cart.totals.shipping_price,
            update.cart.totals.tax_price,
            update.cart.totals.total_price,
        ] {
            assert_eq!(amount.to_string(), "0.00");
        }

        Ok(())
    }

    #[tokio::test]
    async fn removing_one_of_several_units_decrements() -> TestResult {
        let p1 = product("p1", "25.00", 5)?;
        let (_, carts) = service(vec![p1.clone()]);
        let key = CartKey::anonymous("s1");

        carts.add_item(&key, input(&p1)).await?;
        carts.add_item(&key, input(&p1)).await?;
        let update = carts.remove_one_unit(&key, "p1").await?;

        assert_eq!(update.state, CartState::Updated);
        assert_eq!(update.message, "Product p1 updated in cart successfully");
        assert_eq!(update.cart.items[0].qty, 1);
        assert_eq!(update.cart.totals, compute_totals(&update.cart.items));

        Ok(())
    }

    #[tokio::test]
    async fn removing_absent_product_fails_and_leaves_cart_unchanged() -> TestResult {
        let p1 = product("p1", "25.00", 5)?;
        let (_, carts) = service(vec![p1.clone()]);
        let key = CartKey::anonymous("s1");

        let before = carts.add_item(&key, input(&p1)).await?.cart;
        let result = carts.remove_one_unit(&key, "p2").await;

        assert!(
            matches!(&result, Err(CartError::NotFound(m)) if m == "Item not found in cart"),
            "got {result:?}"
        );
        assert_eq!(carts.get_cart(&key).await?, Some(before));

        Ok(())
    }

    #[tokio::test]
    async fn removing_without_cart_is_not_found() {
        let (_, carts) = service(vec![]);

        let result = carts.remove_one_unit(&CartKey::anonymous("s1"), "p1").await;

        assert!(
            matches!(&result, Err(CartError::NotFound(m)) if m == "Cart not found"),
            "got {result:?}"
        );
    }

    #[tokio::test]
    async fn signed_in_user_gets_own_cart_not_session_cart() -> TestResult {
        let p1 = product("p1", "25.00", 5)?;
        let (_, carts) = service(vec![p1.clone()]);

        carts.add_item(&CartKey::anonymous("s1"), input(&p1)).await?;

        assert!(carts.get_cart(&CartKey::for_user("u1", "s1")).await?.is_none());

        let update = carts
            .add_item(&CartKey::for_user("u1", "s1"), input(&p1))
            .await?;
        assert_eq!(update.state, CartState::Created);
        assert_eq!(update.cart.user_id.as_deref(), Some("u1"));
        assert_eq!(update.cart.session_cart_id, "s1");

        Ok(())
    }

    fn cart_with(item: CartItem, version: u64) -> Cart {
        let items = vec![item];
        Cart {
            id: Uuid::nil(),
            user_id: None,
            session_cart_id: "s1".into(),
            totals: compute_totals(&items),
            items,
            version,
            created_at: Timestamp::UNIX_EPOCH,
            updated_at: Timestamp::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn lost_write_race_is_retried() -> TestResult {
        let p1 = product("p1", "25.00", 5)?;
        let item = input(&p1).validate()?;
        let stored = cart_with(item.clone(), 7);

        let mut mock = MockCartStore::new();
        let mut seq = Sequence::new();
        let read = stored.clone();
        mock.expect_find_cart()
            .times(2)
            .returning(move |_| Ok(Some(read.clone())));
        mock.expect_update_cart()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|id, patch| {
                Err(StoreError::VersionConflict {
                    cart: id,
                    expected: patch.expected_version(),
                    found: 8,
                })
            });
        let written = stored.clone();
        mock.expect_update_cart()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_, patch| {
                let mut cart = written.clone();
                cart.items = patch.items().to_vec();
                cart.totals = *patch.totals();
                cart.version = patch.expected_version() + 1;
                Ok(cart)
            });

        let products = Arc::new(MemoryStore::with_products(vec![p1.clone()]));
        let carts = CartService::new(Arc::new(mock), products);

        let update = carts.add_item(&CartKey::anonymous("s1"), input(&p1)).await?;

        assert_eq!(update.cart.items[0].qty, 2);
        assert_eq!(update.cart.version, 8);

        Ok(())
    }

    #[tokio::test]
    async fn persistent_conflict_gives_up_after_max_attempts() -> TestResult {
        let p1 = product("p1", "25.00", 5)?;
        let stored = cart_with(input(&p1).validate()?, 1);

        let mut mock = MockCartStore::new();
        mock.expect_find_cart()
            .times(2)
            .returning(move |_| Ok(Some(stored.clone())));
        mock.expect_update_cart().times(2).returning(|id, _| {
            Err(StoreError::VersionConflict {
                cart: id,
                expected: 1,
                found: 2,
            })
        });

        let products = Arc::new(MemoryStore::with_products(vec![p1.clone()]));
        let carts = CartService::new(Arc::new(mock), products).with_max_attempts(2);

        let result = carts.remove_one_unit(&CartKey::anonymous("s1"), "p1").await;

        assert!(
            matches!(&result, Err(CartError::Store(e)) if e.is_conflict()),
            "expected conflict, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn lost_create_race_falls_back_to_increment() -> TestResult {
        let p1 = product("p1", "25.00", 5)?;
        let stored = cart_with(input(&p1).validate()?, 1);

        let mut mock = MockCartStore::new();
        let mut seq = Sequence::new();
        mock.expect_find_cart()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(None));
        mock.expect_create_cart()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(StoreError::AlreadyExists("session s1".into())));
        let read = stored.clone();
        mock.expect_find_cart()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_| Ok(Some(read.clone())));
        mock.expect_update_cart()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_, patch| {
                let mut cart = stored.clone();
                cart.items = patch.items().to_vec();
                cart.totals = *patch.totals();
                cart.version = patch.expected_version() + 1;
                Ok(cart)
            });

        let products = Arc::new(MemoryStore::with_products(vec![p1.clone()]));
        let carts = CartService::new(Arc::new(mock), products);

        let update = carts.add_item(&CartKey::anonymous("s1"), input(&p1)).await?;

        assert_eq!(update.state, CartState::Updated);
        assert_eq!(update.cart.items[0].qty, 2);

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_adds_share_one_cart() -> TestResult {
        let p1 = product("p1", "25.00", 50)?;
        let (store, carts) = service(vec![p1.clone()]);
        let carts = carts.with_max_attempts(50);
        let key = CartKey::anonymous("fresh");

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let carts = carts.clone();
                let key = key.clone();
                let item = input(&p1);
                tokio::spawn(async move { carts.add_item(&key, item).await })
            })
            .collect();
        let mut created = 0;
        for task in tasks {
            if task.await??.state == CartState::Created {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(store.cart_count(), 1);
        let cart = carts.get_cart(&key).await?.ok_or("cart not found")?;
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].qty, 8);
        assert_eq!(cart.totals, compute_totals(&cart.items));

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_adds_to_one_cart_are_not_lost() -> TestResult {
        let p1 = product("p1", "25.00", 50)?;
        let (_, carts) = service(vec![p1.clone()]);
        let carts = carts.with_max_attempts(50);
        let key = CartKey::anonymous("s1");

        carts.add_item(&key, input(&p1)).await?;

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let carts = carts.clone();
                let key = key.clone();
                let item = input(&p1);
                tokio::spawn(async move { carts.add_item(&key, item).await })
            })
            .collect();
        for task in tasks {
            task.await??;
        }

        let cart = carts.get_cart(&key).await?.ok_or("cart not found")?;
        assert_eq!(cart.items[0].qty, 9);
        assert_eq!(cart.totals, compute_totals(&cart.items));

        Ok(())
    }
}
