//! Payout calculation.
//!
//! [`calculate`] is a pure function of the round's winner and Lucky Six
//! variant, the wagers, and the payout table. Every call returns a fresh
//! [`Payouts`] value; nothing is carried between rounds.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::round::{LuckySix, Winner};

const ODDS_SCALE: u128 = 10_000;

/// Fixed-point odds with four decimal places (`Odds::from_bps(9_500)` is 0.95).
/// Serialized as a decimal number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Odds(u32);

#[derive(Debug, Error, Clone, PartialEq)]
#[error("odds must be a finite, non-negative number below 400000, got {0}")]
pub struct InvalidOdds(pub f64);

impl Odds {
    pub const fn from_bps(bps: u32) -> Self {
        Odds(bps)
    }

    pub fn bps(self) -> u32 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / ODDS_SCALE as f64
    }

    /// `floor(amount * odds)`.
    pub fn apply(self, amount: u64) -> u64 {
        let scaled = u128::from(amount) * u128::from(self.0) / ODDS_SCALE;
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }

    /// `floor(amount * (1 + odds))`: winnings plus the returned stake.
    pub fn apply_with_stake(self, amount: u64) -> u64 {
        let scaled = u128::from(amount) * (ODDS_SCALE + u128::from(self.0)) / ODDS_SCALE;
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }
}

impl TryFrom<f64> for Odds {
    type Error = InvalidOdds;

    fn try_from(v: f64) -> Result<Self, Self::Error> {
        if !v.is_finite() || v < 0.0 || v >= 400_000.0 {
            return Err(InvalidOdds(v));
        }
        Ok(Odds((v * ODDS_SCALE as f64).round() as u32))
    }
}

impl From<Odds> for f64 {
    fn from(o: Odds) -> f64 {
        o.as_f64()
    }
}

impl fmt::Display for Odds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_f64())
    }
}

/// Configured odds for one round. Player, banker and banker-lucky-six odds
/// exclude the stake; tie and lucky-six odds are applied to the stake as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutTable {
    pub player_odds: Odds,
    pub banker_odds: Odds,
    pub tie_odds: Odds,
    pub lucky6_two_card_odds: Odds,
    pub lucky6_three_card_odds: Odds,
    pub banker_lucky6_two_card_odds: Odds,
    pub banker_lucky6_three_card_odds: Odds,
}

impl Default for PayoutTable {
    fn default() -> Self {
        Self {
            player_odds: Odds::from_bps(10_000),
            banker_odds: Odds::from_bps(10_000),
            tie_odds: Odds::from_bps(80_000),
            lucky6_two_card_odds: Odds::from_bps(120_000),
            lucky6_three_card_odds: Odds::from_bps(200_000),
            banker_lucky6_two_card_odds: Odds::from_bps(5_000),
            banker_lucky6_three_card_odds: Odds::from_bps(9_500),
        }
    }
}

impl PayoutTable {
    fn lucky6_odds(&self, variant: LuckySix) -> Option<Odds> {
        match variant {
            LuckySix::None => None,
            LuckySix::TwoCard => Some(self.lucky6_two_card_odds),
            LuckySix::ThreeCard => Some(self.lucky6_three_card_odds),
        }
    }

    fn banker_odds_for(&self, variant: LuckySix) -> Odds {
        match variant {
            LuckySix::None => self.banker_odds,
            LuckySix::TwoCard => self.banker_lucky6_two_card_odds,
            LuckySix::ThreeCard => self.banker_lucky6_three_card_odds,
        }
    }
}

/// The four wagerable outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BetKind {
    Player,
    Banker,
    Tie,
    LuckySix,
}

impl BetKind {
    pub const ALL: [BetKind; 4] = [BetKind::Player, BetKind::Banker, BetKind::Tie, BetKind::LuckySix];

    /// Stored `bet_type` label.
    pub fn label(self) -> &'static str {
        match self {
            BetKind::Player => "player",
            BetKind::Banker => "banker",
            BetKind::Tie => "tie",
            BetKind::LuckySix => "luckySix",
        }
    }

    pub fn from_label(s: &str) -> Option<BetKind> {
        BetKind::ALL.into_iter().find(|k| k.label() == s)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WagerError {
    #[error("cannot wager on both Player and Banker")]
    ConflictingSides,
    #[error("no wager placed")]
    EmptyWager,
    #[error("wager total overflows")]
    Overflow,
}

/// Amounts staked on each outcome, in minor units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WagerSet {
    pub player: u64,
    pub banker: u64,
    pub tie: u64,
    pub lucky_six: u64,
}

impl WagerSet {
    pub fn single(kind: BetKind, amount: u64) -> Self {
        let mut w = WagerSet::default();
        *w.slot_mut(kind) = amount;
        w
    }

    pub fn amount(&self, kind: BetKind) -> u64 {
        match kind {
            BetKind::Player => self.player,
            BetKind::Banker => self.banker,
            BetKind::Tie => self.tie,
            BetKind::LuckySix => self.lucky_six,
        }
    }

    fn slot_mut(&mut self, kind: BetKind) -> &mut u64 {
        match kind {
            BetKind::Player => &mut self.player,
            BetKind::Banker => &mut self.banker,
            BetKind::Tie => &mut self.tie,
            BetKind::LuckySix => &mut self.lucky_six,
        }
    }

    /// Non-zero wagers in `BetKind::ALL` order.
    pub fn placed(&self) -> impl Iterator<Item = (BetKind, u64)> + '_ {
        BetKind::ALL
            .into_iter()
            .map(|k| (k, self.amount(k)))
            .filter(|(_, a)| *a > 0)
    }

    pub fn total(&self) -> Result<u64, WagerError> {
        BetKind::ALL
            .into_iter()
            .try_fold(0u64, |acc, k| acc.checked_add(self.amount(k)))
            .ok_or(WagerError::Overflow)
    }

    /// Rejects Player and Banker together and an all-zero set. Returns the total.
    pub fn validate(&self) -> Result<u64, WagerError> {
        if self.player > 0 && self.banker > 0 {
            return Err(WagerError::ConflictingSides);
        }
        let total = self.total()?;
        if total == 0 {
            return Err(WagerError::EmptyWager);
        }
        Ok(total)
    }
}

/// Settlement of one wagered outcome. `payout` is what a win pays
/// (stake included where the odds say so); `principal_return` is a pushed
/// stake. Both are credited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeSettlement {
    pub wager: u64,
    pub payout: u64,
    pub principal_return: u64,
}

impl OutcomeSettlement {
    pub fn credited(&self) -> u64 {
        self.payout.saturating_add(self.principal_return)
    }

    pub fn is_push(&self) -> bool {
        self.principal_return > 0
    }
}

/// Per-outcome settlement for one round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payouts {
    pub player: OutcomeSettlement,
    pub banker: OutcomeSettlement,
    pub tie: OutcomeSettlement,
    pub lucky_six: OutcomeSettlement,
}

impl Payouts {
    pub fn get(&self, kind: BetKind) -> &OutcomeSettlement {
        match kind {
            BetKind::Player => &self.player,
            BetKind::Banker => &self.banker,
            BetKind::Tie => &self.tie,
            BetKind::LuckySix => &self.lucky_six,
        }
    }

    fn get_mut(&mut self, kind: BetKind) -> &mut OutcomeSettlement {
        match kind {
            BetKind::Player => &mut self.player,
            BetKind::Banker => &mut self.banker,
            BetKind::Tie => &mut self.tie,
            BetKind::LuckySix => &mut self.lucky_six,
        }
    }

    pub fn total_wagered(&self) -> u64 {
        BetKind::ALL
            .into_iter()
            .fold(0u64, |acc, k| acc.saturating_add(self.get(k).wager))
    }

    pub fn total_payout(&self) -> u64 {
        BetKind::ALL
            .into_iter()
            .fold(0u64, |acc, k| acc.saturating_add(self.get(k).credited()))
    }

    pub fn total_principal_return(&self) -> u64 {
        BetKind::ALL
            .into_iter()
            .fold(0u64, |acc, k| acc.saturating_add(self.get(k).principal_return))
    }
}

/// Computes what each wager is owed.
///
/// On a tie the Player, Banker and Lucky Six stakes are pushed back in full.
///
/// # Examples
///
/// ```
/// use baccarat_engine::payout::{calculate, PayoutTable, WagerSet};
/// use baccarat_engine::round::{LuckySix, Winner};
///
/// let wagers = WagerSet { player: 100, tie: 50, lucky_six: 30, ..Default::default() };
/// let p = calculate(Winner::Tie, LuckySix::None, &wagers, &PayoutTable::default());
/// assert_eq!(p.tie.payout, 400);
/// assert_eq!(p.player.principal_return, 100);
/// assert_eq!(p.total_payout(), 530);
/// ```
pub fn calculate(
    winner: Winner,
    lucky_six: LuckySix,
    wagers: &WagerSet,
    table: &PayoutTable,
) -> Payouts {
    let mut out = Payouts::default();
    for (kind, amount) in wagers.placed() {
        let slot = out.get_mut(kind);
        slot.wager = amount;
        match (kind, winner) {
            (BetKind::Player, Winner::Player) => {
                slot.payout = table.player_odds.apply_with_stake(amount);
            }
            (BetKind::Banker, Winner::Banker) => {
                slot.payout = table.banker_odds_for(lucky_six).apply_with_stake(amount);
            }
            (BetKind::Tie, Winner::Tie) => {
                slot.payout = table.tie_odds.apply(amount);
            }
            (BetKind::LuckySix, Winner::Banker) => {
                if let Some(odds) = table.lucky6_odds(lucky_six) {
                    slot.payout = odds.apply(amount);
                }
            }
            (BetKind::Player | BetKind::Banker | BetKind::LuckySix, Winner::Tie) => {
                slot.principal_return = amount;
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PayoutTable {
        PayoutTable::default()
    }

    #[test]
    fn validate_rejects_both_sides() {
        let w = WagerSet {
            player: 10,
            banker: 10,
            ..Default::default()
        };
        assert_eq!(w.validate(), Err(WagerError::ConflictingSides));
    }

    #[test]
    fn validate_rejects_empty_set() {
        assert_eq!(WagerSet::default().validate(), Err(WagerError::EmptyWager));
    }

    #[test]
    fn validate_reports_overflow() {
        let w = WagerSet {
            player: u64::MAX,
            tie: 1,
            ..Default::default()
        };
        assert_eq!(w.validate(), Err(WagerError::Overflow));
    }

    #[test]
    fn validate_returns_total() {
        let w = WagerSet {
            banker: 100,
            tie: 20,
            lucky_six: 5,
            ..Default::default()
        };
        assert_eq!(w.validate(), Ok(125));
    }

    #[test]
    fn player_win_pays_even_money_with_stake() {
        let w = WagerSet::single(BetKind::Player, 100);
        let p = calculate(Winner::Player, LuckySix::None, &w, &table());
        assert_eq!(p.player.payout, 200);
        assert_eq!(p.total_payout(), 200);
    }

    #[test]
    fn losing_bets_pay_nothing() {
        let w = WagerSet {
            player: 100,
            tie: 10,
            lucky_six: 10,
            ..Default::default()
        };
        let p = calculate(Winner::Banker, LuckySix::None, &w, &table());
        assert_eq!(p.total_payout(), 0);
        assert_eq!(p.total_wagered(), 120);
        assert!(!p.player.is_push());
    }

    #[test]
    fn banker_three_card_lucky_six_uses_reduced_odds() {
        let w = WagerSet {
            banker: 100,
            lucky_six: 10,
            ..Default::default()
        };
        let p = calculate(Winner::Banker, LuckySix::ThreeCard, &w, &table());
        assert_eq!(p.banker.payout, 195);
        assert_eq!(p.lucky_six.payout, 200);
    }

    #[test]
    fn ordinary_banker_win_leaves_lucky_six_lost() {
        let w = WagerSet {
            banker: 100,
            lucky_six: 10,
            ..Default::default()
        };
        let p = calculate(Winner::Banker, LuckySix::None, &w, &table());
        assert_eq!(p.banker.payout, 200);
        assert_eq!(p.lucky_six.credited(), 0);
    }

    #[test]
    fn tie_pushes_banker_stake() {
        let w = WagerSet {
            banker: 70,
            ..Default::default()
        };
        let p = calculate(Winner::Tie, LuckySix::None, &w, &table());
        assert_eq!(p.banker.payout, 0);
        assert_eq!(p.banker.principal_return, 70);
        assert_eq!(p.total_principal_return(), 70);
    }

    #[test]
    fn fractional_payouts_round_down() {
        let w = WagerSet::single(BetKind::Banker, 3);
        let p = calculate(Winner::Banker, LuckySix::TwoCard, &w, &table());
        // 3 * 1.5 = 4.5
        assert_eq!(p.banker.payout, 4);
    }

    #[test]
    fn odds_parse_from_decimals() {
        assert_eq!(Odds::try_from(0.95).unwrap().bps(), 9_500);
        assert_eq!(Odds::try_from(12.0).unwrap().bps(), 120_000);
        assert!(Odds::try_from(-1.0).is_err());
        assert!(Odds::try_from(f64::NAN).is_err());
    }

    #[test]
    fn bet_kind_labels_round_trip() {
        for k in BetKind::ALL {
            assert_eq!(BetKind::from_label(k.label()), Some(k));
        }
    }
}
