//! Product types.

use chrono::{DateTime, Utc};
use khata_shared::types::{CompanyId, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalog product and its current stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product id.
    pub id: ProductId,
    /// Owning company.
    pub company_id: CompanyId,
    /// Display name.
    pub name: String,
    /// Stock keeping unit.
    pub sku: String,
    /// Default unit price.
    pub numeric_price: Decimal,
    /// Units on hand. Never negative.
    pub stock: i64,
    /// Unit of measure label (e.g. "kg", "box").
    pub unit_of_measure: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change to details or stock.
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    /// Display name.
    pub name: String,
    /// Stock keeping unit.
    pub sku: String,
    /// Default unit price.
    pub numeric_price: Decimal,
    /// Stock on hand at registration.
    pub opening_stock: i64,
    /// Unit of measure label.
    pub unit_of_measure: String,
}

/// Editable product details. Stock is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetails {
    /// Display name.
    pub name: String,
    /// Stock keeping unit.
    pub sku: String,
    /// Default unit price.
    pub numeric_price: Decimal,
    /// Unit of measure label.
    pub unit_of_measure: String,
}
