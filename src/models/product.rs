//! Catalog product model.

use serde::{Deserialize, Serialize};

use super::{Money, PassType, ProductId, SessionAllowance};

/// Something sold at the front desk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Catalog slug.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Kind of product.
    #[serde(rename = "type")]
    pub pass_type: PassType,
    /// Sale price.
    pub price: Money,
    /// Check-ins granted.
    pub sessions: SessionAllowance,
    /// Guest limit for party packages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_guests: Option<u32>,
    /// One-line description for the menu board.
    pub description: String,
}
