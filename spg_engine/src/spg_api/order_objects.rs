use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use spg_common::MinorUnits;

use crate::db_types::{
    CustomerDetails,
    DeliveryStatus,
    NewOrderItem,
    Order,
    OrderId,
    OrderItem,
    OrderStatusType,
    Payment,
    PaymentLog,
    PaymentMethod,
    PaymentStatus,
    ShippingAddress,
};

/// One line of the storefront cart, as submitted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub size: String,
    pub quantity: i64,
    pub unit_price: MinorUnits,
}

impl From<CartItem> for NewOrderItem {
    fn from(item: CartItem) -> Self {
        NewOrderItem {
            product_id: item.product_id.trim().to_string(),
            product_name: item.product_name.trim().to_string(),
            size: item.size.trim().to_string(),
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}

/// A purchase intent. Amounts are integer minor units, pre-computed by the storefront.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub customer: Option<CustomerDetails>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub subtotal: Option<MinorUnits>,
    #[serde(default)]
    pub tax: Option<MinorUnits>,
    #[serde(default)]
    pub shipping: Option<MinorUnits>,
    #[serde(default)]
    pub total: Option<MinorUnits>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedResult {
    pub order_id: OrderId,
    pub order_db_id: i64,
    pub payment_method: PaymentMethod,
    /// Human-readable, e.g. "Friday, 14 June 2024"
    pub estimated_delivery: String,
    pub estimated_delivery_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_session_handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_order_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<MinorUnits>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl OrderCreatedResult {
    pub fn for_order(order: &Order) -> Self {
        Self {
            order_id: order.order_id.clone(),
            order_db_id: order.id,
            payment_method: order.payment_method,
            estimated_delivery: format_delivery_date(order.estimated_delivery),
            estimated_delivery_date: order.estimated_delivery,
            gateway_session_handle: None,
            gateway_order_ref: None,
            amount: None,
            currency: None,
        }
    }

    pub fn with_gateway_session(mut self, handle: String, gateway_order_ref: String, order: &Order) -> Self {
        self.gateway_session_handle = Some(handle);
        self.gateway_order_ref = Some(gateway_order_ref);
        self.amount = Some(order.total);
        self.currency = Some(order.currency.clone());
        self
    }
}

pub fn format_delivery_date(date: NaiveDate) -> String {
    date.format("%A, %-d %B %Y").to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub gateway_order_ref: String,
    pub order_db_id: i64,
    /// Accepted for compatibility with older storefronts. Stock is always decremented from the stored order items.
    #[serde(default)]
    pub items: Vec<CartItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentFailureRequest {
    pub gateway_order_ref: String,
    #[serde(default)]
    pub error_description: String,
    pub order_db_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifyOutcome {
    Confirmed {
        #[serde(rename = "orderId")]
        order_id: OrderId,
    },
    NotYet {
        #[serde(rename = "gatewayStatus")]
        gateway_status: String,
    },
    Failed {
        #[serde(rename = "gatewayStatus")]
        gateway_status: String,
    },
}

/// Everything known about an order, for support and debugging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Option<Payment>,
    pub logs: Vec<PaymentLog>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResult {
    pub gateway_order_ref: String,
    pub order_id: OrderId,
    pub order_db_id: i64,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatusType,
    pub delivery_status: DeliveryStatus,
}
