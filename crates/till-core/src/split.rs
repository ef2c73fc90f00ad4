//! # Revenue Split
//!
//! Divides a shift's cash sales between the service provider and the
//! business.
//!
//! ```text
//! cash_sales_total = 250,000   ratio = 70%
//!
//!   provider_share = round(250,000 × 0.70) = 175,000
//!   business_share = 250,000 - 175,000    =  75,000
//!                                          ─────────
//!                                            250,000  (always exact)
//! ```
//!
//! Only the provider share is rounded; the business share is whatever is
//! left, so the two always add back up to the total.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::RevenueRatio;

/// Provider and business portions of a cash sales total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSplit {
    pub provider_share: Money,
    pub business_share: Money,
}

impl RevenueSplit {
    pub fn total(&self) -> Money {
        self.provider_share + self.business_share
    }
}

/// Splits `total` by `ratio`.
///
/// ## Example
/// ```rust
/// use till_core::money::Money;
/// use till_core::split::split;
/// use till_core::types::RevenueRatio;
///
/// let s = split(Money::from_minor(5), RevenueRatio::from_bps(7000));
/// assert_eq!(s.provider_share.minor(), 4);
/// assert_eq!(s.business_share.minor(), 1);
/// ```
pub fn split(total: Money, ratio: RevenueRatio) -> RevenueSplit {
    let provider_share = total.apply_ratio(ratio);
    RevenueSplit {
        provider_share,
        business_share: total - provider_share,
    }
}
