//! Payment links for the checkout QR.
//!
//! No payment is processed here. An order carries an opaque `payment_ref`;
//! a provider page turns that reference into a charge, and the front desk
//! only renders the link. Payment confirmation comes back as an explicit
//! `confirm_payment` command.

use barberia_core::Order;
use url::Url;

/// Builds the URL encoded in an order's payment QR.
pub trait PaymentLinks: Send + Sync {
    /// `None` when the shop takes payment at the counter only.
    fn link_for(&self, order: &Order) -> Option<String>;
}

/// Counter-only payments.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPaymentLinks;

impl PaymentLinks for NoPaymentLinks {
    fn link_for(&self, _order: &Order) -> Option<String> {
        None
    }
}

/// `<base>?ref=<payment_ref>&amount=<total_due>`
#[derive(Debug, Clone)]
pub struct CheckoutLinks {
    base: Url,
}

impl CheckoutLinks {
    pub fn parse(base: &str) -> Result<Self, url::ParseError> {
        Ok(CheckoutLinks {
            base: Url::parse(base)?,
        })
    }
}

impl PaymentLinks for CheckoutLinks {
    fn link_for(&self, order: &Order) -> Option<String> {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("ref", &order.payment_ref)
            .append_pair("amount", &order.total_due.pesos().to_string());
        Some(url.into())
    }
}
