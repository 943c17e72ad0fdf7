// src/domain/commission.rs
use serde::{Deserialize, Serialize};

use super::core::{Errors, Validator};
use crate::money::{Amount, AmountValue, BasisPoints, Currency, MoneyError, FULL_BASIS_POINTS};

/// Marketplace fees applied to a completed sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionConfig {
    /// Charged to the buyer on top of the hammer price.
    pub buyer_premium_bps: BasisPoints,
    /// Deducted from the seller's proceeds.
    pub seller_fee_bps: BasisPoints,
    /// Floor for the seller fee.
    pub minimum_fee: AmountValue,
}

impl Default for CommissionConfig {
    fn default() -> Self {
        CommissionConfig {
            buyer_premium_bps: 500,
            seller_fee_bps: 300,
            minimum_fee: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionBreakdown {
    pub sale_price: Amount,
    pub buyer_premium: Amount,
    pub buyer_total: Amount,
    pub seller_fee: Amount,
    pub seller_payout: Amount,
}

impl CommissionConfig {
    pub fn validate(&self) -> Result<(), Errors> {
        let mut v = Validator::new();
        v.check(
            self.buyer_premium_bps <= FULL_BASIS_POINTS,
            "buyerPremiumBps",
            "Buyer premium cannot exceed 100%",
        )
        .check(
            self.seller_fee_bps <= FULL_BASIS_POINTS,
            "sellerFeeBps",
            "Seller fee cannot exceed 100%",
        )
        .check(self.minimum_fee >= 0, "minimumFee", "Minimum fee cannot be negative");
        v.finish()
    }

    pub fn breakdown(&self, currency: Currency, price: AmountValue) -> Result<CommissionBreakdown, MoneyError> {
        let sale_price = Amount::new(currency, price);
        let buyer_premium = sale_price.share(self.buyer_premium_bps);
        let seller_fee = Amount::new(
            currency,
            sale_price
                .share(self.seller_fee_bps)
                .value()
                .max(self.minimum_fee)
                .min(price),
        );
        Ok(CommissionBreakdown {
            sale_price,
            buyer_premium,
            buyer_total: (sale_price + buyer_premium)?,
            seller_fee,
            seller_payout: sale_price.checked_sub(seller_fee)?,
        })
    }

    /// What the marketplace keeps from a sale.
    pub fn earned(&self, price: AmountValue) -> Result<AmountValue, MoneyError> {
        let b = self.breakdown(Currency::default(), price)?;
        Ok((b.buyer_premium + b.seller_fee)?.value())
    }
}
