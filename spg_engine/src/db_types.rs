use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use spg_common::MinorUnits;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion from string: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------     OrderId       -----------------------------------------------------------
/// The human-readable order identifier, e.g. `ORD042`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

pub const ORDER_ID_PREFIX: &str = "ORD";

impl OrderId {
    /// Builds the identifier for the given sequence number, zero-padded to at least three digits.
    pub fn from_sequence(seq: i64) -> Self {
        Self(format!("{ORDER_ID_PREFIX}{seq:03}"))
    }

    /// The numeric part of the identifier, if it is a well-formed `ORD###` id.
    pub fn sequence(&self) -> Option<i64> {
        self.0.strip_prefix(ORDER_ID_PREFIX).and_then(|s| s.parse::<i64>().ok())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for OrderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// The order has been written, but payment has not been secured.
    Pending,
    /// Payment was captured (or the order is cash-on-delivery). The order can be fulfilled.
    Confirmed,
    /// The order was delivered.
    Completed,
    /// Cancelled by the operator.
    Cancelled,
    /// The gateway reported that payment failed or expired.
    PaymentFailed,
}

impl OrderStatusType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatusType::Pending => "pending",
            OrderStatusType::Confirmed => "confirmed",
            OrderStatusType::Completed => "completed",
            OrderStatusType::Cancelled => "cancelled",
            OrderStatusType::PaymentFailed => "payment_failed",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "payment_failed" => Ok(Self::PaymentFailed),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------   DeliveryStatus     --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Shipped,
    Delivered,
    Cancelled,
}

impl Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryStatus::Pending => write!(f, "pending"),
            DeliveryStatus::Shipped => write!(f, "shipped"),
            DeliveryStatus::Delivered => write!(f, "delivered"),
            DeliveryStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

//--------------------------------------   PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Captured,
    Failed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Captured => write!(f, "captured"),
            PaymentStatus::Failed => write!(f, "failed"),
        }
    }
}

//--------------------------------------   PaymentMethod     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery
    Cod,
    /// Hosted checkout through the payment gateway
    Gateway,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cod => write!(f, "cod"),
            PaymentMethod::Gateway => write!(f, "gateway"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cod" | "cash_on_delivery" => Ok(Self::Cod),
            "gateway" | "online" | "cashfree" => Ok(Self::Gateway),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------   CustomerDetails     -------------------------------------------------------
/// Contact details as supplied with an order. These are snapshotted onto the order row.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CustomerDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl CustomerDetails {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim()).trim().to_string()
    }
}

//--------------------------------------   ShippingAddress     -------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShippingAddress {
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl Display for ShippingAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.address_line1)?;
        if let Some(line2) = self.address_line2.as_ref().filter(|s| !s.trim().is_empty()) {
            write!(f, ", {line2}")?;
        }
        write!(f, ", {}, {} {}, {}", self.city, self.state, self.postal_code, self.country)
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub customer_id: i64,
    #[sqlx(flatten)]
    pub customer: CustomerDetails,
    #[sqlx(flatten)]
    pub shipping_address: ShippingAddress,
    pub subtotal: MinorUnits,
    pub tax: MinorUnits,
    pub shipping: MinorUnits,
    pub total: MinorUnits,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub order_status: OrderStatusType,
    pub delivery_status: DeliveryStatus,
    pub dispatch_msg: bool,
    pub estimated_delivery: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub customer_id: i64,
    pub customer: CustomerDetails,
    pub shipping_address: ShippingAddress,
    pub subtotal: MinorUnits,
    pub tax: MinorUnits,
    pub shipping: MinorUnits,
    pub total: MinorUnits,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub estimated_delivery: NaiveDate,
}

//--------------------------------------      OrderItem      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    /// The database id of the parent order
    pub order_id: i64,
    pub product_id: String,
    pub product_name: String,
    pub size: String,
    pub quantity: i64,
    pub unit_price: MinorUnits,
    pub total_price: MinorUnits,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn variant_key(&self) -> VariantKey {
        VariantKey::new(&self.product_id, &self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: String,
    pub product_name: String,
    pub size: String,
    pub quantity: i64,
    pub unit_price: MinorUnits,
}

impl NewOrderItem {
    pub fn total_price(&self) -> MinorUnits {
        self.unit_price * self.quantity
    }

    pub fn variant_key(&self) -> VariantKey {
        VariantKey::new(&self.product_id, &self.size)
    }
}

//--------------------------------------       Payment       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    /// The database id of the order this payment settles
    pub order_id: i64,
    pub payment_method: PaymentMethod,
    pub gateway_order_ref: Option<String>,
    pub amount: MinorUnits,
    pub currency: String,
    pub payment_status: PaymentStatus,
    /// The raw response from the gateway, stored as JSON text
    pub payment_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: i64,
    pub payment_method: PaymentMethod,
    pub gateway_order_ref: Option<String>,
    pub amount: MinorUnits,
    pub currency: String,
    pub payment_status: PaymentStatus,
    pub payment_response: Option<String>,
}

impl NewPayment {
    pub fn cash_on_delivery(order: &Order) -> Self {
        Self {
            order_id: order.id,
            payment_method: PaymentMethod::Cod,
            gateway_order_ref: None,
            amount: order.total,
            currency: order.currency.clone(),
            payment_status: PaymentStatus::Pending,
            payment_response: None,
        }
    }

    pub fn gateway(order: &Order, gateway_order_ref: String, response: Option<String>) -> Self {
        Self {
            order_id: order.id,
            payment_method: PaymentMethod::Gateway,
            gateway_order_ref: Some(gateway_order_ref),
            amount: order.total,
            currency: order.currency.clone(),
            payment_status: PaymentStatus::Pending,
            payment_response: response,
        }
    }
}

//--------------------------------------      PaymentLog     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLog {
    pub id: i64,
    pub order_id: Option<i64>,
    pub gateway_order_ref: Option<String>,
    pub event_type: String,
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPaymentLog {
    pub order_id: Option<i64>,
    pub gateway_order_ref: Option<String>,
    pub event_type: String,
    pub payload: serde_json::Value,
}

impl NewPaymentLog {
    pub fn new<S: Into<String>>(event_type: S, payload: serde_json::Value) -> Self {
        Self { order_id: None, gateway_order_ref: None, event_type: event_type.into(), payload }
    }

    pub fn for_order(mut self, order_id: i64) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_reference<S: Into<String>>(mut self, gateway_order_ref: S) -> Self {
        self.gateway_order_ref = Some(gateway_order_ref.into());
        self
    }
}

//--------------------------------------      Customer       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAddress {
    pub id: i64,
    pub customer_id: i64,
    #[sqlx(flatten)]
    pub address: ShippingAddress,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------   ProductVariant    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantKey {
    pub product_id: String,
    pub size: String,
}

impl VariantKey {
    pub fn new(product_id: &str, size: &str) -> Self {
        Self { product_id: product_id.to_string(), size: size.to_string() }
    }
}

impl Display for VariantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.product_id, self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: i64,
    pub product_id: String,
    pub size: String,
    pub price: MinorUnits,
    pub stock: i64,
}

//--------------------------------------   WhatsAppSession   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppSession {
    pub phone: String,
    pub last_inbound_at: DateTime<Utc>,
}
