//! Private rounds.
//!
//! [`Table::play_round`] is one unit of work: debit the total wager, play a
//! round on a fresh shoe, credit what the payout calculator owes, and record
//! the round with one bet row per non-zero wager. Any failure after the
//! transaction opens rolls all of it back, so
//! `balance_after == balance_before - total_wagered + total_payout` for every
//! committed round and `balance_after == balance_before` otherwise.

use std::sync::Arc;

use baccarat_engine::payout::{calculate, PayoutTable, WagerSet};
use baccarat_engine::round::Round;

use crate::errors::TableError;
use crate::ledger::{credit, debit, to_sql, EntryKind, Ledger};
use crate::records::{insert_bet, insert_round, new_round_id, RoundMode, RoundResult};
use crate::shoes::{RandomShoes, ShoeSource};

pub struct Table {
    ledger: Arc<Ledger>,
    shoes: Box<dyn ShoeSource>,
}

impl Table {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self::with_shoes(ledger, RandomShoes)
    }

    pub fn with_shoes(ledger: Arc<Ledger>, shoes: impl ShoeSource + 'static) -> Self {
        Self {
            ledger,
            shoes: Box::new(shoes),
        }
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// `PlayRound`: settles one round for `user_id`.
    pub fn play_round(
        &self,
        user_id: i64,
        wagers: &WagerSet,
        payouts: &PayoutTable,
    ) -> Result<RoundResult, TableError> {
        let result = self.check_wagers(user_id, wagers, 1).and_then(|total| {
            tracing::debug!(user_id, total_wagered = total, "opening settlement");
            self.settle(user_id, wagers, payouts)
        });
        match &result {
            Ok(r) => tracing::info!(
                round_id = %r.round_id,
                user_id,
                winner = r.winner.label(),
                lucky_six = r.lucky_six.label().unwrap_or("none"),
                player_score = r.player_score,
                banker_score = r.banker_score,
                total_wagered = r.total_wagered,
                total_payout = r.total_payout,
                "round settled"
            ),
            Err(e) => e.log("play_round"),
        }
        result
    }

    /// Plays `times` rounds with the same wagers. The balance must cover every
    /// run before the first one starts; each round is its own unit of work.
    pub fn play_rounds(
        &self,
        user_id: i64,
        wagers: &WagerSet,
        payouts: &PayoutTable,
        times: u32,
    ) -> Result<Vec<RoundResult>, TableError> {
        if times == 0 {
            return Err(TableError::InvalidInput("times must be at least 1".into()));
        }
        if let Err(e) = self.check_wagers(user_id, wagers, times) {
            e.log("play_rounds");
            return Err(e);
        }
        (0..times)
            .map(|_| self.play_round(user_id, wagers, payouts))
            .collect()
    }

    /// Validation and the balance check, both before any transaction opens.
    fn check_wagers(&self, user_id: i64, wagers: &WagerSet, times: u32) -> Result<u64, TableError> {
        let total = wagers.validate()?;
        for (_, amount) in wagers.placed() {
            to_sql(amount)?;
        }
        let needed = total
            .checked_mul(u64::from(times))
            .ok_or(TableError::AmountOutOfRange(total))?;
        to_sql(needed)?;
        let available = self.ledger.balance(user_id)?;
        if available < needed {
            return Err(TableError::InsufficientBalance { needed, available });
        }
        Ok(total)
    }

    fn settle(
        &self,
        user_id: i64,
        wagers: &WagerSet,
        payouts: &PayoutTable,
    ) -> Result<RoundResult, TableError> {
        let round_id = new_round_id();
        self.ledger.write(|tx| {
            debit(tx, user_id, wagers.validate()?, Some(&round_id))?;

            let outcome = Round::new(self.shoes.next_shoe()).play()?;
            let settled = calculate(outcome.winner, outcome.lucky_six, wagers, payouts);
            let result = RoundResult::new(round_id.clone(), &outcome, settled);

            if result.total_payout > 0 {
                credit(tx, user_id, result.total_payout, EntryKind::Payout, Some(&round_id))?;
            }
            insert_round(tx, RoundMode::Private, &result, &outcome)?;
            for (kind, amount) in wagers.placed() {
                insert_bet(tx, &round_id, user_id, kind, amount, Some(settled.get(kind)))?;
            }
            Ok(result)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use baccarat_engine::cards::parse_cards;
    use baccarat_engine::payout::BetKind;
    use baccarat_engine::round::{LuckySix, Winner};
    use baccarat_engine::shoe::Shoe;

    fn stacked(tokens: &'static str) -> impl Fn() -> Shoe + Send + Sync {
        move || Shoe::from_cards(parse_cards(tokens).unwrap())
    }

    fn setup(balance: u64, shoes: impl ShoeSource + 'static) -> (Table, i64) {
        let ledger = Arc::new(Ledger::open_in_memory().unwrap());
        let user = ledger.create_user("tester", balance).unwrap();
        (Table::with_shoes(ledger, shoes), user.id)
    }

    #[test]
    fn scenario_c_credits_banker_and_lucky_six() {
        let (table, user) = setup(1_000, stacked("S2,DA,H3,C5,DK"));
        let wagers = WagerSet {
            banker: 100,
            lucky_six: 50,
            ..Default::default()
        };
        let r = table.play_round(user, &wagers, &PayoutTable::default()).unwrap();
        assert_eq!(r.winner, Winner::Banker);
        assert_eq!(r.lucky_six, LuckySix::TwoCard);
        assert_eq!(r.payouts.banker.credited(), 150);
        assert_eq!(r.payouts.lucky_six.credited(), 600);
        assert_eq!(table.ledger().balance(user).unwrap(), 1_000 - 150 + 750);
    }

    #[test]
    fn scenario_d_tie_push_is_credited() {
        let (table, user) = setup(500, stacked("S2,H4,S3,C10,D4,H5"));
        let wagers = WagerSet {
            player: 100,
            tie: 50,
            lucky_six: 30,
            ..Default::default()
        };
        let r = table.play_round(user, &wagers, &PayoutTable::default()).unwrap();
        assert_eq!(r.winner, Winner::Tie);
        assert_eq!(r.total_payout, 530);
        assert_eq!(r.payouts.player.principal_return, 100);
        assert_eq!(table.ledger().balance(user).unwrap(), 500 - 180 + 530);
        assert_eq!(table.ledger().journal_total(&r.round_id).unwrap(), 530 - 180);
    }

    #[test]
    fn engine_failure_rolls_back_the_debit() {
        let (table, user) = setup(300, || Shoe::from_cards(Vec::new()));
        let wagers = WagerSet::single(BetKind::Player, 100);
        let err = table
            .play_round(user, &wagers, &PayoutTable::default())
            .unwrap_err();
        assert!(matches!(err, TableError::Engine(_)));
        assert_eq!(table.ledger().balance(user).unwrap(), 300);
        assert!(table.ledger().round_ids().unwrap().is_empty());
    }

    #[test]
    fn play_rounds_checks_balance_for_every_run() {
        let (table, user) = setup(250, RandomShoes);
        let wagers = WagerSet::single(BetKind::Banker, 100);
        let err = table
            .play_rounds(user, &wagers, &PayoutTable::default(), 3)
            .unwrap_err();
        assert!(matches!(
            err,
            TableError::InsufficientBalance {
                needed: 300,
                available: 250
            }
        ));
        assert!(table.ledger().round_ids().unwrap().is_empty());

        let results = table
            .play_rounds(user, &wagers, &PayoutTable::default(), 2)
            .unwrap();
        assert_eq!(results.len(), 2);
        let net: i64 = results
            .iter()
            .map(|r| r.total_payout as i64 - r.total_wagered as i64)
            .sum();
        assert_eq!(table.ledger().balance(user).unwrap() as i64, 250 + net);
    }

    #[test]
    fn zero_times_is_rejected() {
        let (table, user) = setup(250, RandomShoes);
        let wagers = WagerSet::single(BetKind::Tie, 1);
        assert!(matches!(
            table.play_rounds(user, &wagers, &PayoutTable::default(), 0),
            Err(TableError::InvalidInput(_))
        ));
    }
}
