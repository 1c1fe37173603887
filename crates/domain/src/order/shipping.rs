//! Shipping record owned by an order.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::OrderError;

/// Delivery address. Only the first line is mandatory; which of the other
/// fields are needed depends on the destination locale.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub postal_code: Option<String>,
}

impl ShippingAddress {
    /// Creates an address with only the mandatory line filled in.
    pub fn new(address_line1: impl Into<String>) -> Self {
        Self {
            address_line1: address_line1.into(),
            ..Default::default()
        }
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShippingStatus {
    #[default]
    Pending,
    Shipped,
    Delivered,
    Returned,
}

impl ShippingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingStatus::Pending => "pending",
            ShippingStatus::Shipped => "shipped",
            ShippingStatus::Delivered => "delivered",
            ShippingStatus::Returned => "returned",
        }
    }
}

impl std::fmt::Display for ShippingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShippingStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ShippingStatus::Pending),
            "shipped" => Ok(ShippingStatus::Shipped),
            "delivered" => Ok(ShippingStatus::Delivered),
            "returned" => Ok(ShippingStatus::Returned),
            other => Err(OrderError::UnknownStatus(other.to_string())),
        }
    }
}

/// Shipping record created together with its order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub address: ShippingAddress,
    pub status: ShippingStatus,
    /// Only set once the parcel has shipped.
    pub tracking_number: Option<String>,
}

impl ShippingInfo {
    pub fn pending(address: ShippingAddress) -> Self {
        Self {
            address,
            status: ShippingStatus::Pending,
            tracking_number: None,
        }
    }

    /// Marks the parcel shipped with its carrier tracking number.
    pub fn ship(&mut self, tracking_number: impl Into<String>) {
        self.status = ShippingStatus::Shipped;
        self.tracking_number = Some(tracking_number.into());
    }
}
