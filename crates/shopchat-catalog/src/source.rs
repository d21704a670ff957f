use async_trait::async_trait;
use shopchat_common::Result;

use crate::product::Catalog;

/// Anything that can list the products currently offered for sale.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Source identifier (e.g. "odoo").
    fn source_id(&self) -> &str;

    /// Fetch every published product.
    async fn fetch_available_products(&self) -> Result<Catalog>;

    /// Check that the catalog service answers.
    async fn health_check(&self) -> Result<bool>;
}
