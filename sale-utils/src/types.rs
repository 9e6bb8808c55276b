use concordium_cis2::TokenAmountU64;
use concordium_std::*;

use crate::error::CustomContractError;
use crate::{
    PRESALE_HARDCAP, RATE_PRESALE, RATE_WEEK1, RATE_WEEK2, RATE_WEEK3, RATE_WEEK4, SALE_HARDCAP,
};

/// Coin amount in µEDC.
pub type CoinAmount = TokenAmountU64;
/// µEDC issued per µCCD contributed.
pub type CoinRate = u64;
pub type MicroCcd = u64;

/// Where the ledger stands on the sale calendar. Only phases with a rate
/// accept purchases.
#[derive(Debug, Serialize, SchemaType, Clone, Copy, PartialEq, Eq)]
pub enum SalePhase {
    NotStarted,
    Presale,
    /// Between pre-sale end and sale start. No purchases.
    Gap,
    SaleWeek1,
    SaleWeek2,
    SaleWeek3,
    SaleWeek4,
    Ended,
}

impl SalePhase {
    /// Issuance rate of the phase, if purchases are accepted.
    pub fn rate(&self) -> Option<CoinRate> {
        match self {
            SalePhase::Presale => Some(RATE_PRESALE),
            SalePhase::SaleWeek1 => Some(RATE_WEEK1),
            SalePhase::SaleWeek2 => Some(RATE_WEEK2),
            SalePhase::SaleWeek3 => Some(RATE_WEEK3),
            SalePhase::SaleWeek4 => Some(RATE_WEEK4),
            _ => None,
        }
    }

    /// Hard cap `total_sold` is checked against in this phase.
    /// The sale weeks share one cap; the counter is global, not per phase.
    pub fn cap(&self) -> Option<CoinAmount> {
        match self {
            SalePhase::Presale => Some(PRESALE_HARDCAP.into()),
            SalePhase::SaleWeek1
            | SalePhase::SaleWeek2
            | SalePhase::SaleWeek3
            | SalePhase::SaleWeek4 => Some(SALE_HARDCAP.into()),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.rate().is_some()
    }
}

/// Coins issued for `value` at `rate`. Both sides are micro units, so the
/// product is exact; no rounding happens on issuance.
pub fn coins_from_value(value: Amount, rate: CoinRate) -> Result<CoinAmount, CustomContractError> {
    let coins = value
        .micro_ccd
        .checked_mul(rate)
        .ok_or(CustomContractError::OverflowError)?;
    Ok(coins.into())
}

/// Value required to buy exactly `coins` at `rate`, rounded up to the next
/// µCCD. Inverse of [`coins_from_value`] up to that rounding.
pub fn value_for_coins(coins: CoinAmount, rate: CoinRate) -> Result<Amount, CustomContractError> {
    let micro_ccd = coins
        .0
        .checked_add(rate - 1)
        .ok_or(CustomContractError::OverflowError)?
        / rate;
    Ok(Amount::from_micro_ccd(micro_ccd))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_is_exact() {
        let value = Amount::from_micro_ccd(10_000_000);
        let coins = coins_from_value(value, RATE_PRESALE).unwrap();
        claim_eq!(coins.0, 10_000_000 * RATE_PRESALE);
        // buying back the same number of coins costs exactly the same value
        claim_eq!(value_for_coins(coins, RATE_PRESALE).unwrap(), value);
    }

    #[test]
    fn test_value_rounds_up() {
        // 1001 µEDC at rate 1000 needs 2 µCCD; 1 µCCD only buys 1000
        let needed = value_for_coins(1001u64.into(), 1000).unwrap();
        claim_eq!(needed, Amount::from_micro_ccd(2));
        let bought = coins_from_value(needed, 1000).unwrap();
        claim!(bought >= 1001u64.into());
    }

    #[test]
    fn test_round_trip_never_overcharges() {
        for micro in [1u64, 7, 999, 1000, 1001, 123_456_789] {
            let value = Amount::from_micro_ccd(micro);
            let coins = coins_from_value(value, RATE_WEEK3).unwrap();
            let back = value_for_coins(coins, RATE_WEEK3).unwrap();
            claim!(back <= value, "value for issued coins exceeds payment");
        }
    }

    #[test]
    fn test_conversion_overflow() {
        let value = Amount::from_micro_ccd(u64::MAX / 2);
        claim_eq!(
            coins_from_value(value, RATE_PRESALE),
            Err(CustomContractError::OverflowError)
        );
    }

    #[test]
    fn test_rates_descend() {
        let mut rates = vec![RATE_PRESALE, RATE_WEEK1, RATE_WEEK2, RATE_WEEK3, RATE_WEEK4];
        rates.dedup();
        claim_eq!(rates.len(), 5, "phase rates must be distinct");
        claim!(rates.windows(2).all(|w| w[0] > w[1]), "rates must descend");
    }

    #[test]
    fn test_phase_caps() {
        claim_eq!(SalePhase::Presale.cap(), Some(PRESALE_HARDCAP.into()));
        claim_eq!(SalePhase::SaleWeek4.cap(), Some(SALE_HARDCAP.into()));
        claim_eq!(SalePhase::Gap.cap(), None);
        claim_eq!(SalePhase::Ended.rate(), None);
        claim!(!SalePhase::NotStarted.is_open());
    }
}
