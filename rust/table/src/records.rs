//! Round and bet records.
//!
//! A round row stores the initial two cards of each hand and any third card
//! as `<Suit><Rank>` tokens, both scores, the winner and the Lucky Six
//! variant, and the per-outcome credited amounts (NULL when nothing was
//! wagered on that outcome). Bets reference their round by id.

use baccarat_engine::cards::{format_cards, parse_cards, Card};
use baccarat_engine::payout::{BetKind, OutcomeSettlement, Payouts};
use baccarat_engine::round::{LuckySix, RoundOutcome, Winner};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::errors::TableError;
use crate::ledger::{from_sql, now, to_sql, Ledger};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundMode {
    Private,
    Lobby,
}

impl RoundMode {
    pub fn label(self) -> &'static str {
        match self {
            RoundMode::Private => "private",
            RoundMode::Lobby => "lobby",
        }
    }

    pub fn from_label(s: &str) -> Option<RoundMode> {
        match s {
            "private" => Some(RoundMode::Private),
            "lobby" => Some(RoundMode::Lobby),
            _ => None,
        }
    }
}

/// What a settled round hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round_id: String,
    pub player_cards: Vec<Card>,
    pub banker_cards: Vec<Card>,
    pub player_initial_score: u8,
    pub banker_initial_score: u8,
    pub player_score: u8,
    pub banker_score: u8,
    pub winner: Winner,
    pub is_lucky_six: bool,
    pub lucky_six: LuckySix,
    /// Per-outcome wager, payout and principal return
    pub payouts: Payouts,
    pub total_wagered: u64,
    pub total_payout: u64,
    pub seed: Option<u64>,
}

impl RoundResult {
    pub fn new(round_id: String, outcome: &RoundOutcome, payouts: Payouts) -> Self {
        Self {
            round_id,
            player_cards: outcome.player.cards().to_vec(),
            banker_cards: outcome.banker.cards().to_vec(),
            player_initial_score: outcome.player_initial_score,
            banker_initial_score: outcome.banker_initial_score,
            player_score: outcome.player_score,
            banker_score: outcome.banker_score,
            winner: outcome.winner,
            is_lucky_six: outcome.is_lucky_six(),
            lucky_six: outcome.lucky_six,
            total_wagered: payouts.total_wagered(),
            total_payout: payouts.total_payout(),
            payouts,
            seed: outcome.seed,
        }
    }
}

/// A round as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRound {
    pub round_id: String,
    pub mode: RoundMode,
    pub seed: Option<u64>,
    pub player_cards: Vec<Card>,
    pub banker_cards: Vec<Card>,
    pub player_initial_score: u8,
    pub banker_initial_score: u8,
    pub player_score: u8,
    pub banker_score: u8,
    pub winner: Winner,
    pub is_lucky_six: bool,
    pub lucky_six: LuckySix,
    pub player_payout: Option<u64>,
    pub banker_payout: Option<u64>,
    pub tie_payout: Option<u64>,
    pub lucky_six_payout: Option<u64>,
    pub total_wagered: u64,
    pub total_paid: u64,
    pub created_at: String,
}

impl StoredRound {
    pub fn credited(&self, kind: BetKind) -> Option<u64> {
        match kind {
            BetKind::Player => self.player_payout,
            BetKind::Banker => self.banker_payout,
            BetKind::Tie => self.tie_payout,
            BetKind::LuckySix => self.lucky_six_payout,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Pending,
    Settled,
}

impl BetStatus {
    pub fn label(self) -> &'static str {
        match self {
            BetStatus::Pending => "pending",
            BetStatus::Settled => "settled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetRecord {
    pub id: i64,
    pub round_id: String,
    pub user_id: i64,
    pub kind: BetKind,
    pub amount: u64,
    pub payout: Option<u64>,
    pub principal_return: Option<u64>,
    pub status: BetStatus,
    pub created_at: String,
}

impl BetRecord {
    /// Everything credited back for this bet once settled.
    pub fn credited(&self) -> u64 {
        self.payout
            .unwrap_or(0)
            .saturating_add(self.principal_return.unwrap_or(0))
    }
}

/// `GetRoundDetails`: the stored round plus every bet placed on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundDetails {
    pub round: StoredRound,
    pub bets: Vec<BetRecord>,
}

pub(crate) fn new_round_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Adds one settled bet into a per-outcome aggregate.
pub(crate) fn accumulate(total: &mut Payouts, kind: BetKind, s: &OutcomeSettlement) {
    let slot = match kind {
        BetKind::Player => &mut total.player,
        BetKind::Banker => &mut total.banker,
        BetKind::Tie => &mut total.tie,
        BetKind::LuckySix => &mut total.lucky_six,
    };
    slot.wager = slot.wager.saturating_add(s.wager);
    slot.payout = slot.payout.saturating_add(s.payout);
    slot.principal_return = slot.principal_return.saturating_add(s.principal_return);
}

fn credited_column(payouts: &Payouts, kind: BetKind) -> Result<Option<i64>, TableError> {
    let s = payouts.get(kind);
    if s.wager == 0 {
        return Ok(None);
    }
    to_sql(s.credited()).map(Some)
}

pub(crate) fn insert_round(
    conn: &Connection,
    mode: RoundMode,
    result: &RoundResult,
    outcome: &RoundOutcome,
) -> Result<(), TableError> {
    let p = &result.payouts;
    conn.execute(
        "INSERT INTO rounds (
            round_id, mode, seed,
            player_initial_cards, banker_initial_cards,
            player_initial_score, banker_initial_score,
            player_third_card, banker_third_card,
            player_final_score, banker_final_score,
            winner, is_lucky_six, lucky_six_type,
            player_payout, banker_payout, tie_payout, lucky_six_payout,
            total_wagered, total_paid, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                  ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
        params![
            result.round_id,
            mode.label(),
            // u64 seeds are stored bit-for-bit in the signed column
            result.seed.map(|s| s as i64),
            format_cards(outcome.player.initial()),
            format_cards(outcome.banker.initial()),
            outcome.player_initial_score,
            outcome.banker_initial_score,
            outcome.player.third().map(|c| c.to_string()),
            outcome.banker.third().map(|c| c.to_string()),
            outcome.player_score,
            outcome.banker_score,
            outcome.winner.label(),
            outcome.is_lucky_six(),
            outcome.lucky_six.label(),
            credited_column(p, BetKind::Player)?,
            credited_column(p, BetKind::Banker)?,
            credited_column(p, BetKind::Tie)?,
            credited_column(p, BetKind::LuckySix)?,
            to_sql(result.total_wagered)?,
            to_sql(result.total_payout)?,
            now(),
        ],
    )?;
    Ok(())
}

/// Inserts a bet and returns its id.
pub(crate) fn insert_bet(
    conn: &Connection,
    round_id: &str,
    user_id: i64,
    kind: BetKind,
    amount: u64,
    settlement: Option<&OutcomeSettlement>,
) -> Result<i64, TableError> {
    let status = if settlement.is_some() {
        BetStatus::Settled
    } else {
        BetStatus::Pending
    };
    let payout = settlement.map(|s| to_sql(s.payout)).transpose()?;
    let principal = settlement.map(|s| to_sql(s.principal_return)).transpose()?;
    conn.execute(
        "INSERT INTO bets (round_id, user_id, bet_type, amount, payout, principal_return, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            round_id,
            user_id,
            kind.label(),
            to_sql(amount)?,
            payout,
            principal,
            status.label(),
            now()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn settle_bet(
    conn: &Connection,
    bet_id: i64,
    settlement: &OutcomeSettlement,
) -> Result<(), TableError> {
    conn.execute(
        "UPDATE bets SET payout = ?1, principal_return = ?2, status = 'settled'
         WHERE id = ?3 AND status = 'pending'",
        params![
            to_sql(settlement.payout)?,
            to_sql(settlement.principal_return)?,
            bet_id
        ],
    )?;
    Ok(())
}

fn corrupt(round_id: &str, what: impl std::fmt::Display) -> TableError {
    TableError::CorruptRecord(format!("round {round_id}: {what}"))
}

fn opt_amount(v: Option<i64>, column: &str) -> Result<Option<u64>, TableError> {
    v.map(|v| from_sql(v, column)).transpose()
}

struct RawRound {
    round_id: String,
    mode: String,
    seed: Option<i64>,
    player_initial: String,
    banker_initial: String,
    player_initial_score: u8,
    banker_initial_score: u8,
    player_third: Option<String>,
    banker_third: Option<String>,
    player_score: u8,
    banker_score: u8,
    winner: String,
    is_lucky_six: bool,
    lucky_six_type: Option<String>,
    payouts: [Option<i64>; 4],
    total_wagered: i64,
    total_paid: i64,
    created_at: String,
}

const ROUND_COLUMNS: &str = "round_id, mode, seed, player_initial_cards, banker_initial_cards,
    player_initial_score, banker_initial_score, player_third_card, banker_third_card,
    player_final_score, banker_final_score, winner, is_lucky_six, lucky_six_type,
    player_payout, banker_payout, tie_payout, lucky_six_payout,
    total_wagered, total_paid, created_at";

fn raw_round(row: &Row<'_>) -> rusqlite::Result<RawRound> {
    Ok(RawRound {
        round_id: row.get(0)?,
        mode: row.get(1)?,
        seed: row.get(2)?,
        player_initial: row.get(3)?,
        banker_initial: row.get(4)?,
        player_initial_score: row.get(5)?,
        banker_initial_score: row.get(6)?,
        player_third: row.get(7)?,
        banker_third: row.get(8)?,
        player_score: row.get(9)?,
        banker_score: row.get(10)?,
        winner: row.get(11)?,
        is_lucky_six: row.get(12)?,
        lucky_six_type: row.get(13)?,
        payouts: [row.get(14)?, row.get(15)?, row.get(16)?, row.get(17)?],
        total_wagered: row.get(18)?,
        total_paid: row.get(19)?,
        created_at: row.get(20)?,
    })
}

fn hand_cards(round_id: &str, initial: &str, third: Option<&str>) -> Result<Vec<Card>, TableError> {
    let mut cards = parse_cards(initial).map_err(|e| corrupt(round_id, e))?;
    if let Some(t) = third {
        cards.push(t.parse().map_err(|e| corrupt(round_id, e))?);
    }
    Ok(cards)
}

impl TryFrom<RawRound> for StoredRound {
    type Error = TableError;

    fn try_from(raw: RawRound) -> Result<Self, Self::Error> {
        let id = raw.round_id.as_str();
        let mode = RoundMode::from_label(&raw.mode)
            .ok_or_else(|| corrupt(id, format!("unknown mode '{}'", raw.mode)))?;
        let winner = Winner::from_label(&raw.winner)
            .ok_or_else(|| corrupt(id, format!("unknown winner '{}'", raw.winner)))?;
        let lucky_six = LuckySix::from_label(raw.lucky_six_type.as_deref())
            .ok_or_else(|| corrupt(id, "unknown lucky six type"))?;
        let [player, banker, tie, l6] = raw.payouts;
        Ok(StoredRound {
            player_cards: hand_cards(id, &raw.player_initial, raw.player_third.as_deref())?,
            banker_cards: hand_cards(id, &raw.banker_initial, raw.banker_third.as_deref())?,
            mode,
            seed: raw.seed.map(|s| s as u64),
            player_initial_score: raw.player_initial_score,
            banker_initial_score: raw.banker_initial_score,
            player_score: raw.player_score,
            banker_score: raw.banker_score,
            winner,
            is_lucky_six: raw.is_lucky_six,
            lucky_six,
            player_payout: opt_amount(player, "player_payout")?,
            banker_payout: opt_amount(banker, "banker_payout")?,
            tie_payout: opt_amount(tie, "tie_payout")?,
            lucky_six_payout: opt_amount(l6, "lucky_six_payout")?,
            total_wagered: from_sql(raw.total_wagered, "total_wagered")?,
            total_paid: from_sql(raw.total_paid, "total_paid")?,
            created_at: raw.created_at,
            round_id: raw.round_id,
        })
    }
}

type BetRow = (
    i64,
    String,
    i64,
    String,
    i64,
    Option<i64>,
    Option<i64>,
    String,
    String,
);

fn bet_from_row(row: &Row<'_>) -> rusqlite::Result<BetRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

pub(crate) fn load_bets(conn: &Connection, round_id: &str) -> Result<Vec<BetRecord>, TableError> {
    let mut stmt = conn.prepare(
        "SELECT id, round_id, user_id, bet_type, amount, payout, principal_return, status, created_at
         FROM bets WHERE round_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![round_id], bet_from_row)?;
    let mut bets = Vec::new();
    for row in rows {
        let (id, round_id, user_id, bet_type, amount, payout, principal, status, created_at) = row?;
        let kind = BetKind::from_label(&bet_type)
            .ok_or_else(|| corrupt(&round_id, format!("bet {id} has unknown type '{bet_type}'")))?;
        let status = match status.as_str() {
            "pending" => BetStatus::Pending,
            "settled" => BetStatus::Settled,
            other => return Err(corrupt(&round_id, format!("bet {id} has status '{other}'"))),
        };
        bets.push(BetRecord {
            id,
            user_id,
            kind,
            amount: from_sql(amount, "bets.amount")?,
            payout: opt_amount(payout, "bets.payout")?,
            principal_return: opt_amount(principal, "bets.principal_return")?,
            status,
            created_at,
            round_id,
        });
    }
    Ok(bets)
}

pub(crate) fn load_round(conn: &Connection, round_id: &str) -> Result<StoredRound, TableError> {
    let raw = conn
        .query_row(
            &format!("SELECT {ROUND_COLUMNS} FROM rounds WHERE round_id = ?1"),
            params![round_id],
            raw_round,
        )
        .optional()?
        .ok_or_else(|| TableError::RoundNotFound(round_id.to_string()))?;
    StoredRound::try_from(raw)
}

/// Ids of every stored round, oldest first.
pub(crate) fn round_ids(conn: &Connection) -> Result<Vec<String>, TableError> {
    let mut stmt = conn.prepare("SELECT round_id FROM rounds ORDER BY created_at, rowid")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ids)
}

impl Ledger {
    /// `GetRoundDetails`.
    pub fn round_details(&self, round_id: &str) -> Result<RoundDetails, TableError> {
        self.read(|conn| {
            Ok(RoundDetails {
                round: load_round(conn, round_id)?,
                bets: load_bets(conn, round_id)?,
            })
        })
    }

    pub fn round_ids(&self) -> Result<Vec<String>, TableError> {
        self.read(round_ids)
    }
}
