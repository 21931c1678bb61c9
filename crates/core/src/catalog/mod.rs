//! Product catalog and stock.

pub mod service;
pub mod stock;
pub mod types;

pub use service::CatalogService;
pub use stock::{checked_stock, net_stock_deltas, signed_quantity};
pub use types::{NewProduct, Product, ProductDetails};
