use serde::{Deserialize, Serialize};

use crate::xmlrpc::Value;

/// Text substituted for the catalog when nothing is published.
pub const NO_PRODUCTS: &str = "No published products found.";

/// Fields requested from the catalog service for every product.
pub const PRODUCT_FIELDS: [&str; 4] = ["name", "list_price", "description_sale", "default_code"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRecord {
    pub id: i64,
    pub name: String,
    pub sku: Option<String>,
    pub price: f64,
    pub description: Option<String>,
}

impl ProductRecord {
    /// Build from one struct of an Odoo `read` result.
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Self {
            id: value.get("id").and_then(Value::as_i64).unwrap_or_default(),
            name: text("name").unwrap_or_else(|| "N/A".to_string()),
            sku: text("default_code"),
            price: value
                .get("list_price")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
            description: text("description_sale"),
        }
    }

    /// Plain-text block used inside the model prompt.
    pub fn render(&self) -> String {
        format!(
            "Product: {}\nSKU: {}\nPrice: ${:.2}\nDescription: {}\n",
            self.name,
            self.sku.as_deref().unwrap_or("N/A"),
            self.price,
            self.description
                .as_deref()
                .unwrap_or("No description available"),
        )
    }
}

/// Result of a catalog fetch. An empty catalog is its own case rather than an
/// empty list.
#[derive(Debug, Clone, PartialEq)]
pub enum Catalog {
    Products(Vec<ProductRecord>),
    Empty,
}

impl Catalog {
    pub fn from_records(records: Vec<ProductRecord>) -> Self {
        if records.is_empty() {
            Catalog::Empty
        } else {
            Catalog::Products(records)
        }
    }

    pub fn products(&self) -> &[ProductRecord] {
        match self {
            Catalog::Products(records) => records,
            Catalog::Empty => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Catalog::Empty)
    }

    /// Text inserted into the prompt: product blocks joined by `---`, or the
    /// not-found sentinel.
    pub fn to_prompt_text(&self) -> String {
        match self {
            Catalog::Products(records) => records
                .iter()
                .map(ProductRecord::render)
                .collect::<Vec<_>>()
                .join("\n---\n"),
            Catalog::Empty => NO_PRODUCTS.to_string(),
        }
    }
}
