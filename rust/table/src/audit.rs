//! Offline payout audit.
//!
//! Every stored round is replayed from its card tokens and every figure that
//! can be derived from those cards is recomputed: scores, the draw decisions,
//! winner, Lucky Six, each bet's credit under the given payout table, the
//! round totals, and the journal entries tagged with the round.

use baccarat_engine::audit::replay;
use baccarat_engine::payout::{calculate, BetKind, PayoutTable, WagerSet};
use rusqlite::Connection;
use serde::Serialize;

use crate::errors::TableError;
use crate::ledger::{journal_total, Ledger};
use crate::records::{load_bets, load_round, round_ids, BetStatus, StoredRound};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub round_id: String,
    pub issue: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub rounds_checked: usize,
    pub bets_checked: usize,
    pub discrepancies: Vec<Discrepancy>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

struct RoundAudit<'a> {
    round_id: &'a str,
    issues: Vec<String>,
}

impl RoundAudit<'_> {
    fn check<T: PartialEq + std::fmt::Debug>(&mut self, what: &str, stored: T, derived: T) {
        if stored != derived {
            self.issues
                .push(format!("{what}: stored {stored:?}, derived {derived:?}"));
        }
    }
}

fn audit_round(
    conn: &Connection,
    round: &StoredRound,
    payouts: &PayoutTable,
    bets_checked: &mut usize,
) -> Result<Vec<String>, TableError> {
    let mut audit = RoundAudit {
        round_id: &round.round_id,
        issues: Vec::new(),
    };

    let outcome = match replay(&round.player_cards, &round.banker_cards) {
        Ok(o) => o,
        Err(e) => return Ok(vec![format!("cards do not replay: {e}")]),
    };
    audit.check("player initial score", round.player_initial_score, outcome.player_initial_score);
    audit.check("banker initial score", round.banker_initial_score, outcome.banker_initial_score);
    audit.check("player score", round.player_score, outcome.player_score);
    audit.check("banker score", round.banker_score, outcome.banker_score);
    audit.check("winner", round.winner, outcome.winner);
    audit.check("lucky six", round.lucky_six, outcome.lucky_six);
    audit.check("lucky six flag", round.is_lucky_six, outcome.is_lucky_six());

    let bets = load_bets(conn, audit.round_id)?;
    let mut wagered = [0u64; 4];
    let mut credited = [0u64; 4];
    for bet in &bets {
        *bets_checked += 1;
        if bet.status != BetStatus::Settled {
            audit.issues.push(format!("bet {} is still pending", bet.id));
            continue;
        }
        let expected = calculate(
            outcome.winner,
            outcome.lucky_six,
            &WagerSet::single(bet.kind, bet.amount),
            payouts,
        );
        let e = expected.get(bet.kind);
        audit.check(&format!("bet {} payout", bet.id), bet.payout, Some(e.payout));
        audit.check(
            &format!("bet {} principal return", bet.id),
            bet.principal_return,
            Some(e.principal_return),
        );
        let slot = BetKind::ALL.iter().position(|k| *k == bet.kind).unwrap_or(0);
        wagered[slot] = wagered[slot].saturating_add(bet.amount);
        credited[slot] = credited[slot].saturating_add(bet.credited());
    }

    for (i, kind) in BetKind::ALL.into_iter().enumerate() {
        let derived = (wagered[i] > 0).then_some(credited[i]);
        audit.check(&format!("{} credit", kind.label()), round.credited(kind), derived);
    }
    audit.check("total wagered", round.total_wagered, wagered.iter().sum::<u64>());
    audit.check("total paid", round.total_paid, credited.iter().sum::<u64>());

    let net = i128::from(round.total_paid) - i128::from(round.total_wagered);
    audit.check(
        "journal net",
        i128::from(journal_total(conn, audit.round_id)?),
        net,
    );
    Ok(audit.issues)
}

/// Audits every stored round against `payouts`.
pub fn audit_rounds(ledger: &Ledger, payouts: &PayoutTable) -> Result<AuditReport, TableError> {
    let report = ledger.read(|conn| {
        let mut report = AuditReport::default();
        for round_id in round_ids(conn)? {
            report.rounds_checked += 1;
            let issues = match load_round(conn, &round_id) {
                Ok(round) => audit_round(conn, &round, payouts, &mut report.bets_checked)?,
                Err(TableError::CorruptRecord(reason)) => vec![reason],
                Err(e) => return Err(e),
            };
            report
                .discrepancies
                .extend(issues.into_iter().map(|issue| Discrepancy {
                    round_id: round_id.clone(),
                    issue,
                }));
        }
        Ok(report)
    })?;
    if report.is_clean() {
        tracing::info!(rounds = report.rounds_checked, bets = report.bets_checked, "audit clean");
    } else {
        for d in &report.discrepancies {
            tracing::warn!(round_id = %d.round_id, issue = %d.issue, "audit discrepancy");
        }
    }
    Ok(report)
}
