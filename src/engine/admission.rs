use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Session;
use crate::models::{signed, Bet, BetStatus, BetType, Game, GameStatus, Side, User};

use super::odds::{parse_decimal, Odds, Payout};

/// Why a bet placement was refused. Nothing is debited or recorded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BetRejection {
    #[error("log in to place a bet")]
    Unauthenticated,

    #[error("stake must be a positive amount in whole cents")]
    InvalidStake,

    #[error("no valid odds are quoted for this selection")]
    InvalidOdds,

    #[error("insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Decimal, required: Decimal },

    #[error("game is {status} and no longer accepts bets")]
    GameNotBettable { status: GameStatus },

    #[error("account is suspended")]
    AccountSuspended,

    #[error("odds moved from {requested} to {current}, confirm the new price")]
    OddsChanged { requested: Decimal, current: Decimal },
}

impl BetRejection {
    pub fn kind(&self) -> &'static str {
        match self {
            BetRejection::Unauthenticated => "Unauthenticated",
            BetRejection::InvalidStake => "InvalidStake",
            BetRejection::InvalidOdds => "InvalidOdds",
            BetRejection::InsufficientBalance { .. } => "InsufficientBalance",
            BetRejection::GameNotBettable { .. } => "GameNotBettable",
            BetRejection::AccountSuspended => "AccountSuspended",
            BetRejection::OddsChanged { .. } => "OddsChanged",
        }
    }
}

/// A parsed placement request for one game.
#[derive(Debug, Clone)]
pub struct BetSlip {
    pub bet_type: BetType,
    pub side: Side,
    pub stake: Decimal,
    /// Odds the bettor was shown, if the client sent them.
    pub quoted_odds: Option<Decimal>,
}

/// Everything priced and checked for an accepted slip.
#[derive(Debug, Clone)]
pub struct Admission {
    pub odds: Odds,
    pub line: Option<Decimal>,
    pub selection: String,
    pub payout: Payout,
}

pub fn require_session(session: Option<&Session>) -> Result<&Session, BetRejection> {
    session.ok_or(BetRejection::Unauthenticated)
}

/// Stake must be a positive, finite amount with at most two decimal places.
pub fn parse_stake(raw: &str) -> Result<Decimal, BetRejection> {
    let stake = parse_decimal(raw).ok_or(BetRejection::InvalidStake)?;
    if stake <= Decimal::ZERO || stake.normalize().scale() > 2 {
        return Err(BetRejection::InvalidStake);
    }
    Ok(stake)
}

/// Odds the bettor claims to have seen. Zero or garbage is invalid.
pub fn parse_quoted_odds(raw: &str) -> Result<Decimal, BetRejection> {
    Odds::parse(raw)
        .map(|odds| odds.value())
        .ok_or(BetRejection::InvalidOdds)
}

/// Decide whether `account` may place `slip` on `game` right now.
///
/// The balance check here is advisory; the store repeats it atomically
/// with the debit.
pub fn admit(account: &User, game: &Game, slip: &BetSlip) -> Result<Admission, BetRejection> {
    if !account.is_active {
        return Err(BetRejection::AccountSuspended);
    }

    if game.status == GameStatus::Completed {
        return Err(BetRejection::GameNotBettable {
            status: game.status,
        });
    }

    if slip.stake <= Decimal::ZERO {
        return Err(BetRejection::InvalidStake);
    }

    let (odds, line, selection) = price(game, slip.bet_type, slip.side)?;

    if let Some(requested) = slip.quoted_odds {
        if requested != odds.value() {
            return Err(BetRejection::OddsChanged {
                requested,
                current: odds.value(),
            });
        }
    }

    if slip.stake > account.balance {
        return Err(BetRejection::InsufficientBalance {
            available: account.balance,
            required: slip.stake,
        });
    }

    let payout = Payout::checked(slip.stake, odds).ok_or(BetRejection::InvalidStake)?;

    Ok(Admission {
        odds,
        line,
        selection,
        payout,
    })
}

/// Current price, line and selection label for one side of one market.
fn price(
    game: &Game,
    bet_type: BetType,
    side: Side,
) -> Result<(Odds, Option<Decimal>, String), BetRejection> {
    let team = game.team(side);
    match bet_type {
        BetType::Moneyline => {
            let odds = game
                .moneyline(side)
                .and_then(Odds::new)
                .filter(Odds::is_american)
                .ok_or(BetRejection::InvalidOdds)?;
            Ok((odds, None, team.to_string()))
        }
        BetType::Spread => {
            let line = game.line_for(side).ok_or(BetRejection::InvalidOdds)?;
            let odds = game
                .spread_odds
                .and_then(Odds::new)
                .filter(Odds::is_american)
                .ok_or(BetRejection::InvalidOdds)?;
            Ok((odds, Some(line), format!("{team} {}", signed(line))))
        }
    }
}

impl Admission {
    /// The pending ledger entry for this admission.
    pub fn into_bet(self, account: &User, game: &Game, slip: &BetSlip) -> Bet {
        Bet {
            id: Uuid::new_v4(),
            user_id: account.id,
            game_id: game.id,
            bet_type: slip.bet_type,
            side: slip.side,
            selection: self.selection,
            stake: slip.stake,
            odds: self.odds.value(),
            line: self.line,
            potential_payout: self.payout.payout,
            potential_profit: self.payout.profit,
            status: BetStatus::Pending,
            placed_at: Utc::now(),
            settled_at: None,
        }
    }
}
