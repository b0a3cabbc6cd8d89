//! Products offered at the front desk.

use serde::{Deserialize, Serialize};

use crate::models::{Money, PassType, Product, ProductId, SessionAllowance};

/// The set of products a play center sells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    /// Products in menu order.
    products: Vec<Product>,
}

impl Catalog {
    /// Creates a catalog from an explicit product list.
    #[inline]
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// The standard menu: admission passes, party packages and café items.
    #[inline]
    #[must_use]
    pub fn standard() -> Self {
        Self::new(vec![
            product(
                "day-pass",
                "Day Pass",
                PassType::Day,
                2_500,
                SessionAllowance::Limited(1),
                "Unlimited play for 12 hours from first check-in",
            ),
            product(
                "weekly-pass",
                "Weekly Unlimited",
                PassType::Weekly,
                6_000,
                SessionAllowance::Unlimited,
                "Come and go as often as you like for 7 days",
            ),
            product(
                "weekly-5-visit",
                "5-Visit Week Pack",
                PassType::Weekly,
                9_000,
                SessionAllowance::Limited(5),
                "Five visits within 7 days of the first check-in",
            ),
            product(
                "monthly-pass",
                "Monthly Unlimited",
                PassType::Monthly,
                15_000,
                SessionAllowance::Unlimited,
                "Unlimited play for 30 days",
            ),
            Product {
                max_guests: Some(10),
                ..product(
                    "party-basic",
                    "Birthday Party",
                    PassType::Party,
                    29_900,
                    SessionAllowance::Limited(1),
                    "Two hours in the party room for up to 10 kids",
                )
            },
            Product {
                max_guests: Some(20),
                ..product(
                    "party-deluxe",
                    "Deluxe Birthday Party",
                    PassType::Party,
                    44_900,
                    SessionAllowance::Limited(1),
                    "Private room, host and pizza for up to 20 kids",
                )
            },
            product(
                "pizza-slice",
                "Pizza Slice",
                PassType::Food,
                450,
                SessionAllowance::Limited(0),
                "Cheese or pepperoni",
            ),
            product(
                "juice-box",
                "Juice Box",
                PassType::Food,
                250,
                SessionAllowance::Limited(0),
                "Apple or fruit punch",
            ),
        ])
    }

    /// Returns every product in menu order.
    #[inline]
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Looks up a product by slug.
    #[inline]
    #[must_use]
    pub fn find(&self, id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == *id)
    }

    /// Returns the products of one type.
    #[inline]
    pub fn of_type(&self, pass_type: PassType) -> impl Iterator<Item = &Product> {
        self.products
            .iter()
            .filter(move |p| p.pass_type == pass_type)
    }
}

impl Default for Catalog {
    #[inline]
    fn default() -> Self {
        Self::standard()
    }
}

/// Builds a non-party product.
fn product(
    id: &str,
    name: &str,
    pass_type: PassType,
    cents: u64,
    sessions: SessionAllowance,
    description: &str,
) -> Product {
    Product {
        id: ProductId::from(id),
        name: name.to_owned(),
        pass_type,
        price: Money::from_cents(cents),
        sessions,
        max_guests: None,
        description: description.to_owned(),
    }
}
