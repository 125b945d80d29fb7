use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// American odds. Never zero.
///
/// Positive odds (+150) pay 150 profit per 100 staked; negative odds (-110)
/// need 110 staked to make 100 profit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Odds(Decimal);

impl Odds {
    pub fn new(value: Decimal) -> Option<Self> {
        (!value.is_zero()).then_some(Self(value))
    }

    /// Parse "+150", "-110", "150" or "150.0". Zero and garbage yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        parse_decimal(raw).and_then(Self::new)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// A real American price: magnitude of at least 100.
    pub fn is_american(&self) -> bool {
        self.0.abs() >= Decimal::ONE_HUNDRED
    }

    /// Gross payout (stake returned plus profit) for a positive stake, or
    /// `None` when the result does not fit in a `Decimal`.
    pub fn payout(&self, stake: Decimal) -> Option<Decimal> {
        let profit = if self.0 > Decimal::ZERO {
            stake
                .checked_mul(self.0)?
                .checked_div(Decimal::ONE_HUNDRED)?
        } else {
            stake
                .checked_mul(Decimal::ONE_HUNDRED)?
                .checked_div(self.0.abs())?
        };
        stake.checked_add(profit)
    }
}

impl fmt::Display for Odds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::models::signed(self.0))
    }
}

/// Payout and profit for one stake at one price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Payout {
    pub payout: Decimal,
    pub profit: Decimal,
}

impl Payout {
    pub const ZERO: Payout = Payout {
        payout: Decimal::ZERO,
        profit: Decimal::ZERO,
    };

    /// `None` on overflow.
    pub fn checked(stake: Decimal, odds: Odds) -> Option<Payout> {
        let payout = odds.payout(stake)?;
        Some(Payout {
            payout,
            profit: payout - stake,
        })
    }

    /// Cents, for display. Stored values keep full precision.
    pub fn rounded(&self) -> Payout {
        Payout {
            payout: round_cents(self.payout),
            profit: round_cents(self.profit),
        }
    }
}

/// Payout for `stake` at American `odds`.
///
/// A non-positive stake counts as zero. Zero odds are invalid and price
/// nothing: both figures come back zero and the bet must not be accepted.
/// Figures too large for a `Decimal` also price as zero.
pub fn compute_payout(stake: Decimal, odds: Decimal) -> Payout {
    let stake = stake.max(Decimal::ZERO);
    match Odds::new(odds) {
        Some(odds) if !stake.is_zero() => Payout::checked(stake, odds).unwrap_or(Payout::ZERO),
        _ => Payout::ZERO,
    }
}

/// Live preview from raw form input; anything unparseable prices as zero.
pub fn quote(stake: &str, odds: &str) -> Payout {
    let stake = parse_decimal(stake).unwrap_or(Decimal::ZERO);
    let odds = parse_decimal(odds).unwrap_or(Decimal::ZERO);
    compute_payout(stake, odds)
}

pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Lenient numeric parsing shared by stake and odds inputs.
pub(crate) fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if unsigned.is_empty() {
        return None;
    }
    Decimal::from_str(unsigned)
        .or_else(|_| Decimal::from_scientific(unsigned))
        .ok()
}
