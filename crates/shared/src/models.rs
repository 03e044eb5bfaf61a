//! Shared data models for the stockroom inventory backend.

use serde::{Deserialize, Serialize};

// --- Products ---

/// A catalog product as returned by the inventory API.
///
/// The backend exposes its ORM columns directly, so fields are PascalCase on
/// the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Product {
    pub product_id: i64,
    pub product_name: String,
    pub measurement: String,
    /// Not every product has a list price yet.
    #[serde(default)]
    pub selling_price: Option<f64>,
    pub internal_price: f64,
}

/// Body for creating or updating a product (no server-generated fields).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ProductDraft {
    pub product_name: String,
    pub measurement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selling_price: Option<f64>,
    pub internal_price: f64,
}

impl Product {
    /// Build the product the server would return for `draft` under `id`.
    pub fn from_draft(product_id: i64, draft: ProductDraft) -> Self {
        Self {
            product_id,
            product_name: draft.product_name,
            measurement: draft.measurement,
            selling_price: draft.selling_price,
            internal_price: draft.internal_price,
        }
    }
}
