pub mod odoo;
pub mod product;
pub mod source;
pub mod xmlrpc;

pub use odoo::OdooCatalog;
pub use product::{Catalog, NO_PRODUCTS, ProductRecord};
pub use source::CatalogSource;
