//! Customer and operator message bodies.
use crate::{db_types::Order, events::OrderSnapshot};

/// Escapes text for inclusion in HTML element content and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn item_rows(snapshot: &OrderSnapshot) -> String {
    snapshot
        .items
        .iter()
        .map(|item| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{} {}</td></tr>",
                escape_html(&item.product_name),
                escape_html(&item.size),
                item.quantity,
                item.total_price,
                escape_html(&snapshot.order.currency),
            )
        })
        .collect()
}

fn greeting(order: &Order) -> String {
    format!("<p>Hi {},</p>", escape_html(order.customer.first_name.trim()))
}

fn totals(order: &Order) -> String {
    let c = escape_html(&order.currency);
    format!(
        "<p>Subtotal: {} {c}<br/>Tax: {} {c}<br/>Shipping: {} {c}<br/><strong>Total: {} {c}</strong></p>",
        order.subtotal, order.tax, order.shipping, order.total
    )
}

pub fn confirmation_subject(order: &Order) -> String {
    format!("Your order {} is confirmed", order.order_id)
}

pub fn confirmation_html(snapshot: &OrderSnapshot) -> String {
    let order = &snapshot.order;
    format!(
        "{}<p>Thank you for your order <strong>{}</strong>. We expect to deliver it by {}.</p>\
         <table><tr><th>Item</th><th>Size</th><th>Qty</th><th>Price</th></tr>{}</table>{}\
         <p>Shipping to: {}</p>",
        greeting(order),
        order.order_id,
        order.estimated_delivery.format("%A, %-d %B %Y"),
        item_rows(snapshot),
        totals(order),
        escape_html(&order.shipping_address.to_string()),
    )
}

pub fn operator_subject(order: &Order) -> String {
    format!("New order {} ({} {})", order.order_id, order.total, order.currency)
}

pub fn operator_html(snapshot: &OrderSnapshot) -> String {
    let order = &snapshot.order;
    format!(
        "<p>New {} order <strong>{}</strong> from {} ({}, {}).</p>\
         <table><tr><th>Item</th><th>Size</th><th>Qty</th><th>Price</th></tr>{}</table>{}<p>Ship to: {}</p>",
        order.payment_method,
        order.order_id,
        escape_html(&order.customer.full_name()),
        escape_html(&order.customer.email),
        escape_html(&order.customer.phone),
        item_rows(snapshot),
        totals(order),
        escape_html(&order.shipping_address.to_string()),
    )
}

pub fn cancellation_subject(order: &Order) -> String {
    format!("Your order {} has been cancelled", order.order_id)
}

pub fn cancellation_html(snapshot: &OrderSnapshot) -> String {
    let order = &snapshot.order;
    format!(
        "{}<p>Your order <strong>{}</strong> has been cancelled.</p>\
         <table><tr><th>Item</th><th>Size</th><th>Qty</th><th>Price</th></tr>{}</table>\
         <p>If you have already paid, the refund of {} {} will be processed to your original payment method. \
         Reply to this email if you have any questions.</p>",
        greeting(order),
        order.order_id,
        item_rows(snapshot),
        order.total,
        escape_html(&order.currency),
    )
}

pub fn dispatch_subject(order: &Order) -> String {
    format!("Your order {} is on its way", order.order_id)
}

pub fn dispatch_html(snapshot: &OrderSnapshot) -> String {
    let order = &snapshot.order;
    format!(
        "{}<p>Good news! Your order <strong>{}</strong> has been dispatched and should arrive by {}.</p>\
         <table><tr><th>Item</th><th>Size</th><th>Qty</th><th>Price</th></tr>{}</table><p>Shipping to: {}</p>",
        greeting(order),
        order.order_id,
        order.estimated_delivery.format("%A, %-d %B %Y"),
        item_rows(snapshot),
        escape_html(&order.shipping_address.to_string()),
    )
}

/// The free-form operator alert, allowed inside the 24 hour session window.
pub fn operator_alert_text(snapshot: &OrderSnapshot) -> String {
    let order = &snapshot.order;
    let lines = snapshot
        .items
        .iter()
        .map(|i| format!("- {} x {} ({})", i.quantity, i.product_name, i.size))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "New order {} ({})\nCustomer: {} {}\nTotal: {} {}\n{lines}\nShip to: {}",
        order.order_id,
        order.payment_method,
        order.customer.full_name(),
        order.customer.phone,
        order.total,
        order.currency,
        order.shipping_address,
    )
}

/// Positional parameters for the approved alert template: order id, customer name and total.
pub fn operator_alert_parameters(snapshot: &OrderSnapshot) -> Vec<String> {
    let order = &snapshot.order;
    vec![order.order_id.to_string(), order.customer.full_name(), format!("{} {}", order.total, order.currency)]
}
