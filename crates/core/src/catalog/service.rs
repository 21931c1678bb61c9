//! Product catalog service.
//!
//! Stock is only ever written by the ledger engine; this service registers
//! products and edits their descriptive fields.

use std::sync::Arc;

use chrono::Utc;
use khata_shared::types::{ProductId, round_money};
use tracing::info;

use super::types::{NewProduct, Product, ProductDetails};
use crate::actor::ActorContext;
use crate::directory::DirectoryError;
use crate::store::{LedgerStore, Transaction, atomic};

/// Products of one store.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn LedgerStore>,
    max_attempts: u32,
}

fn validate(name: &str, sku: &str, price: rust_decimal::Decimal) -> Result<(), DirectoryError> {
    if name.trim().is_empty() {
        return Err(DirectoryError::EmptyName);
    }
    if sku.trim().is_empty() {
        return Err(DirectoryError::EmptySku);
    }
    if price.is_sign_negative() && !price.is_zero() {
        return Err(DirectoryError::NegativePrice(price));
    }
    Ok(())
}

impl CatalogService {
    /// Creates a catalog service.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts,
        }
    }

    /// Reads one product of the actor's company.
    pub async fn get_by_id(
        &self,
        actor: &ActorContext,
        id: ProductId,
    ) -> Result<Product, DirectoryError> {
        let mut txn = Transaction::new(Arc::clone(&self.store));
        txn.get::<Product>(id)
            .await?
            .filter(|p| p.company_id == actor.company_id)
            .ok_or(DirectoryError::ProductNotFound(id))
    }

    /// Lists products sorted by name.
    pub async fn list(&self, actor: &ActorContext) -> Result<Vec<Product>, DirectoryError> {
        let mut products = self.store.list_products(actor.company_id).await?;
        products.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(products)
    }

    /// Registers a product with its opening stock.
    pub async fn register(
        &self,
        actor: &ActorContext,
        input: NewProduct,
    ) -> Result<Product, DirectoryError> {
        validate(&input.name, &input.sku, input.numeric_price)?;
        if input.opening_stock < 0 {
            return Err(DirectoryError::NegativeOpeningStock(input.opening_stock));
        }

        let product = atomic(&self.store, self.max_attempts, |mut txn| {
            let input = &input;
            async move {
                let now = Utc::now();
                let product = Product {
                    id: ProductId::new(),
                    company_id: actor.company_id,
                    name: input.name.trim().to_string(),
                    sku: input.sku.trim().to_string(),
                    numeric_price: round_money(input.numeric_price),
                    stock: input.opening_stock,
                    unit_of_measure: input.unit_of_measure.trim().to_string(),
                    created_at: now,
                    updated_at: now,
                };
                txn.put(product.clone());
                Ok::<_, DirectoryError>((txn, product))
            }
        })
        .await?;

        info!(product_id = %product.id, sku = %product.sku, stock = product.stock, "product registered");
        Ok(product)
    }

    /// Replaces a product's descriptive fields, leaving stock untouched.
    ///
    /// Ledger lines keep the name and unit they were recorded with.
    pub async fn update_details(
        &self,
        actor: &ActorContext,
        id: ProductId,
        details: ProductDetails,
    ) -> Result<Product, DirectoryError> {
        validate(&details.name, &details.sku, details.numeric_price)?;

        atomic(&self.store, self.max_attempts, |mut txn| {
            let details = &details;
            async move {
                let mut product = txn
                    .get::<Product>(id)
                    .await?
                    .filter(|p| p.company_id == actor.company_id)
                    .ok_or(DirectoryError::ProductNotFound(id))?;
                product.name = details.name.trim().to_string();
                product.sku = details.sku.trim().to_string();
                product.numeric_price = round_money(details.numeric_price);
                product.unit_of_measure = details.unit_of_measure.trim().to_string();
                product.updated_at = Utc::now();
                txn.put(product.clone());
                Ok::<_, DirectoryError>((txn, product))
            }
        })
        .await
    }
}
