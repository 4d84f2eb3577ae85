//! Lobby mode: one shared round per betting window.
//!
//! A lobby round moves `pending -> betting -> closed -> drawing -> completed`.
//! Bets are debited when admitted, inside the same transaction that checks the
//! round is still `betting`, so nothing gets in after the window closes. The
//! draw, the settlement of every admitted bet and the move to `completed`
//! commit together; a round found in `closed` on restart is simply drawn
//! again by [`Lobby::recover_stalled`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use baccarat_engine::payout::{calculate, BetKind, PayoutTable, Payouts, WagerError, WagerSet};
use baccarat_engine::round::Round;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::LobbyConfig;
use crate::errors::TableError;
use crate::ledger::{credit, debit, now, to_sql, EntryKind, Ledger};
use crate::records::{
    accumulate, insert_bet, insert_round, load_bets, new_round_id, settle_bet, BetRecord,
    BetStatus, RoundMode, RoundResult,
};
use crate::shoes::{RandomShoes, ShoeSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LobbyState {
    Pending,
    Betting,
    Closed,
    Drawing,
    Completed,
}

impl LobbyState {
    pub fn label(self) -> &'static str {
        match self {
            LobbyState::Pending => "pending",
            LobbyState::Betting => "betting",
            LobbyState::Closed => "closed",
            LobbyState::Drawing => "drawing",
            LobbyState::Completed => "completed",
        }
    }

    pub fn from_label(s: &str) -> Option<LobbyState> {
        match s {
            "pending" => Some(LobbyState::Pending),
            "betting" => Some(LobbyState::Betting),
            "closed" => Some(LobbyState::Closed),
            "drawing" => Some(LobbyState::Drawing),
            "completed" => Some(LobbyState::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for LobbyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyRound {
    pub round_id: String,
    pub state: LobbyState,
    pub betting_opens_at: Option<String>,
    pub betting_closes_at: Option<String>,
    pub created_at: String,
}

/// A drawn and settled lobby round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyDraw {
    /// Aggregated over every admitted bet
    pub result: RoundResult,
    pub bets_settled: usize,
}

/// Progress notifications from the [`Scheduler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyEvent {
    BettingOpened { round_id: String, closes_at: String },
    BettingClosed { round_id: String },
    Settled(LobbyDraw),
}

pub struct Lobby {
    ledger: Arc<Ledger>,
    payouts: PayoutTable,
    shoes: Box<dyn ShoeSource>,
}

fn load_state(conn: &Connection, round_id: &str) -> Result<LobbyState, TableError> {
    let label: Option<String> = conn
        .query_row(
            "SELECT state FROM lobby_rounds WHERE round_id = ?1",
            params![round_id],
            |row| row.get(0),
        )
        .optional()?;
    let label = label.ok_or_else(|| TableError::RoundNotFound(round_id.to_string()))?;
    LobbyState::from_label(&label).ok_or_else(|| {
        TableError::CorruptRecord(format!("lobby round {round_id} has state '{label}'"))
    })
}

/// Compare-and-set on the state column.
fn transition(
    conn: &Connection,
    round_id: &str,
    from: LobbyState,
    to: LobbyState,
) -> Result<(), TableError> {
    let changed = conn.execute(
        "UPDATE lobby_rounds SET state = ?1 WHERE round_id = ?2 AND state = ?3",
        params![to.label(), round_id, from.label()],
    )?;
    if changed == 0 {
        let actual = load_state(conn, round_id)?;
        return Err(TableError::InvalidLobbyTransition {
            round_id: round_id.to_string(),
            from: actual,
            to,
        });
    }
    tracing::debug!(round_id, from = from.label(), to = to.label(), "lobby state changed");
    Ok(())
}

fn load_lobby_round(conn: &Connection, round_id: &str) -> Result<LobbyRound, TableError> {
    let row = conn
        .query_row(
            "SELECT round_id, state, betting_opens_at, betting_closes_at, created_at
             FROM lobby_rounds WHERE round_id = ?1",
            params![round_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )
        .optional()?;
    let (round_id, state, betting_opens_at, betting_closes_at, created_at) =
        row.ok_or_else(|| TableError::RoundNotFound(round_id.to_string()))?;
    let state = LobbyState::from_label(&state).ok_or_else(|| {
        TableError::CorruptRecord(format!("lobby round {round_id} has state '{state}'"))
    })?;
    Ok(LobbyRound {
        round_id,
        state,
        betting_opens_at,
        betting_closes_at,
        created_at,
    })
}

fn parse_deadline(closes_at: Option<&str>) -> Option<DateTime<Utc>> {
    closes_at
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc))
}

fn ids_in_state(conn: &Connection, state: LobbyState) -> Result<Vec<(String, Option<String>)>, TableError> {
    let mut stmt = conn.prepare(
        "SELECT round_id, betting_closes_at FROM lobby_rounds WHERE state = ?1 ORDER BY created_at",
    )?;
    let rows = stmt
        .query_map(params![state.label()], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

impl Lobby {
    pub fn new(ledger: Arc<Ledger>, payouts: PayoutTable) -> Self {
        Self::with_shoes(ledger, payouts, RandomShoes)
    }

    pub fn with_shoes(
        ledger: Arc<Ledger>,
        payouts: PayoutTable,
        shoes: impl ShoeSource + 'static,
    ) -> Self {
        Self {
            ledger,
            payouts,
            shoes: Box::new(shoes),
        }
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Creates a round and opens its betting window for `window`.
    pub fn open_round(&self, window: Duration) -> Result<LobbyRound, TableError> {
        let round_id = new_round_id();
        let opens = Utc::now();
        let closes = chrono::Duration::from_std(window)
            .ok()
            .and_then(|w| opens.checked_add_signed(w))
            .ok_or_else(|| TableError::InvalidInput("betting window is too long".into()))?;
        let round = self.ledger.write(|tx| {
            tx.execute(
                "INSERT INTO lobby_rounds (round_id, state, created_at) VALUES (?1, ?2, ?3)",
                params![round_id, LobbyState::Pending.label(), now()],
            )?;
            transition(tx, &round_id, LobbyState::Pending, LobbyState::Betting)?;
            tx.execute(
                "UPDATE lobby_rounds SET betting_opens_at = ?1, betting_closes_at = ?2
                 WHERE round_id = ?3",
                params![
                    opens.to_rfc3339_opts(SecondsFormat::Millis, true),
                    closes.to_rfc3339_opts(SecondsFormat::Millis, true),
                    round_id
                ],
            )?;
            load_lobby_round(tx, &round_id)
        })?;
        tracing::info!(
            round_id = %round.round_id,
            state = round.state.label(),
            closes_at = round.betting_closes_at.as_deref().unwrap_or(""),
            "lobby betting opened"
        );
        Ok(round)
    }

    /// Admits `wagers` into a round that is still taking bets and debits them.
    pub fn place_bet(
        &self,
        user_id: i64,
        round_id: &str,
        wagers: &WagerSet,
    ) -> Result<Vec<BetRecord>, TableError> {
        let result = self.admit(user_id, round_id, wagers);
        match &result {
            Ok(bets) => tracing::info!(
                round_id,
                user_id,
                bets = bets.len(),
                total_wagered = wagers.total().unwrap_or(0),
                "lobby bet admitted"
            ),
            Err(e) => e.log("place_bet"),
        }
        result
    }

    fn admit(
        &self,
        user_id: i64,
        round_id: &str,
        wagers: &WagerSet,
    ) -> Result<Vec<BetRecord>, TableError> {
        let total = wagers.validate()?;
        for (_, amount) in wagers.placed() {
            to_sql(amount)?;
        }
        let available = self.ledger.balance(user_id)?;
        if available < total {
            return Err(TableError::InsufficientBalance {
                needed: total,
                available,
            });
        }

        self.ledger.write(|tx| {
            let state = load_state(tx, round_id)?;
            if state != LobbyState::Betting {
                return Err(TableError::BettingClosed {
                    round_id: round_id.to_string(),
                    state,
                });
            }

            // Player and Banker stay exclusive across every bet this user
            // holds in the round.
            let mut stmt = tx.prepare(
                "SELECT DISTINCT bet_type FROM bets
                 WHERE round_id = ?1 AND user_id = ?2 AND bet_type IN ('player', 'banker')",
            )?;
            let sides = stmt
                .query_map(params![round_id, user_id], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            let holds = |kind: BetKind| sides.iter().any(|s| s == kind.label());
            if (wagers.player > 0 && holds(BetKind::Banker))
                || (wagers.banker > 0 && holds(BetKind::Player))
            {
                return Err(WagerError::ConflictingSides.into());
            }

            debit(tx, user_id, total, Some(round_id))?;
            let mut ids = Vec::new();
            for (kind, amount) in wagers.placed() {
                ids.push(insert_bet(tx, round_id, user_id, kind, amount, None)?);
            }
            let bets = load_bets(tx, round_id)?;
            Ok(bets.into_iter().filter(|b| ids.contains(&b.id)).collect())
        })
    }

    /// Ends the betting window. Bets arriving afterwards are refused.
    pub fn close_round(&self, round_id: &str) -> Result<(), TableError> {
        let result = self
            .ledger
            .write(|tx| transition(tx, round_id, LobbyState::Betting, LobbyState::Closed));
        match &result {
            Ok(()) => tracing::info!(round_id, state = "closed", "lobby betting closed"),
            Err(e) => e.log("close_round"),
        }
        result
    }

    /// Deals the shared round and settles every admitted bet against it.
    pub fn draw_and_settle(&self, round_id: &str) -> Result<LobbyDraw, TableError> {
        let result = self.ledger.write(|tx| {
            transition(tx, round_id, LobbyState::Closed, LobbyState::Drawing)?;

            let outcome = Round::new(self.shoes.next_shoe()).play()?;
            let bets = load_bets(tx, round_id)?;
            let mut totals = Payouts::default();
            let mut settled = 0;
            for bet in bets.iter().filter(|b| b.status == BetStatus::Pending) {
                let single = WagerSet::single(bet.kind, bet.amount);
                let paid = calculate(outcome.winner, outcome.lucky_six, &single, &self.payouts);
                let s = paid.get(bet.kind);
                if s.credited() > 0 {
                    credit(tx, bet.user_id, s.credited(), EntryKind::Payout, Some(round_id))?;
                }
                settle_bet(tx, bet.id, s)?;
                accumulate(&mut totals, bet.kind, s);
                settled += 1;
            }

            let result = RoundResult::new(round_id.to_string(), &outcome, totals);
            insert_round(tx, RoundMode::Lobby, &result, &outcome)?;
            transition(tx, round_id, LobbyState::Drawing, LobbyState::Completed)?;
            Ok(LobbyDraw {
                result,
                bets_settled: settled,
            })
        });
        match &result {
            Ok(draw) => tracing::info!(
                round_id,
                state = "completed",
                winner = draw.result.winner.label(),
                bets = draw.bets_settled,
                total_wagered = draw.result.total_wagered,
                total_payout = draw.result.total_payout,
                "lobby round settled"
            ),
            Err(e) => e.log("draw_and_settle"),
        }
        result
    }

    /// The round currently taking bets, if any.
    pub fn current_round(&self) -> Result<Option<LobbyRound>, TableError> {
        self.ledger.read(|conn| {
            let id: Option<String> = conn
                .query_row(
                    "SELECT round_id FROM lobby_rounds WHERE state = 'betting'
                     ORDER BY betting_opens_at DESC LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;
            id.map(|id| load_lobby_round(conn, &id)).transpose()
        })
    }

    pub fn lobby_round(&self, round_id: &str) -> Result<LobbyRound, TableError> {
        self.ledger.read(|conn| load_lobby_round(conn, round_id))
    }

    /// Finishes rounds interrupted by a restart: expired betting windows are
    /// closed, and every closed round is drawn and settled.
    pub fn recover_stalled(&self) -> Result<Vec<LobbyDraw>, TableError> {
        let now = Utc::now();
        let betting = self
            .ledger
            .read(|conn| ids_in_state(conn, LobbyState::Betting))?;
        for (round_id, closes_at) in betting {
            let expired = parse_deadline(closes_at.as_deref()).is_none_or(|t| t <= now);
            if expired {
                self.close_round(&round_id)?;
            }
        }

        let closed = self
            .ledger
            .read(|conn| ids_in_state(conn, LobbyState::Closed))?;
        let mut draws = Vec::with_capacity(closed.len());
        for (round_id, _) in closed {
            tracing::warn!(round_id = %round_id, "recovering stalled lobby round");
            draws.push(self.draw_and_settle(&round_id)?);
        }
        Ok(draws)
    }

    /// Rounds still taking bets, with the time left in each window.
    pub fn open_windows(&self) -> Result<Vec<(String, Duration)>, TableError> {
        let now = Utc::now();
        let betting = self
            .ledger
            .read(|conn| ids_in_state(conn, LobbyState::Betting))?;
        Ok(betting
            .into_iter()
            .filter_map(|(round_id, closes_at)| {
                let left = parse_deadline(closes_at.as_deref())? - now;
                Some((round_id, left.to_std().unwrap_or_default()))
            })
            .collect())
    }

    pub fn balance(&self, user_id: i64) -> Result<u64, TableError> {
        self.ledger.balance(user_id)
    }
}

/// Drives lobby rounds on a fixed cadence: every `interval_secs` a round
/// opens, takes bets for `betting_window_secs`, then closes and settles.
pub struct Scheduler {
    lobby: Arc<Lobby>,
    config: LobbyConfig,
    events: Option<mpsc::UnboundedSender<LobbyEvent>>,
}

impl Scheduler {
    pub fn new(lobby: Arc<Lobby>, config: LobbyConfig) -> Result<Self, crate::config::ConfigError> {
        config.validate()?;
        Ok(Self {
            lobby,
            config,
            events: None,
        })
    }

    pub fn with_events(mut self, events: mpsc::UnboundedSender<LobbyEvent>) -> Self {
        self.events = Some(events);
        self
    }

    fn emit(&self, event: LobbyEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is listening.
            let _ = tx.send(event);
        }
    }

    /// One full lobby round.
    pub async fn run_once(&self) -> Result<LobbyDraw, TableError> {
        let window = Duration::from_secs(self.config.betting_window_secs);
        let round = self.lobby.open_round(window)?;
        self.emit(LobbyEvent::BettingOpened {
            round_id: round.round_id.clone(),
            closes_at: round.betting_closes_at.clone().unwrap_or_default(),
        });

        tokio::time::sleep(window).await;
        self.finish(&round.round_id)
    }

    fn finish(&self, round_id: &str) -> Result<LobbyDraw, TableError> {
        self.lobby.close_round(round_id)?;
        self.emit(LobbyEvent::BettingClosed {
            round_id: round_id.to_string(),
        });
        let draw = self.lobby.draw_and_settle(round_id)?;
        self.emit(LobbyEvent::Settled(draw.clone()));
        Ok(draw)
    }

    /// Runs rounds until `max_rounds` have been attempted or `shutdown`
    /// resolves (dropping its sender counts).
    ///
    /// Rounds left over from an earlier run are finished first: closed ones
    /// are drawn at once and open ones when their window ends. A failed round
    /// is logged and the cadence carries on; if it failed after closing, it
    /// is drawn again at the next tick. The returned draws include the
    /// recovered rounds.
    pub async fn run(
        &self,
        max_rounds: Option<usize>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> Result<Vec<LobbyDraw>, TableError> {
        let mut draws = self.lobby.recover_stalled()?;
        let started = Instant::now();
        for (round_id, left) in self.lobby.open_windows()? {
            tracing::warn!(round_id = %round_id, left_secs = left.as_secs(), "resuming open lobby round");
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("lobby scheduler stopping");
                    return Ok(draws);
                }
                _ = tokio::time::sleep_until(started + left) => {}
            }
            match self.finish(&round_id) {
                Ok(draw) => draws.push(draw),
                Err(e) => tracing::warn!(round_id = %round_id, error = %e, "resumed lobby round failed"),
            }
        }

        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut attempts = 0;
        loop {
            if max_rounds.is_some_and(|max| attempts >= max) {
                break;
            }
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(rounds = attempts, "lobby scheduler stopping");
                    break;
                }
                _ = ticker.tick() => {
                    match self.lobby.recover_stalled() {
                        Ok(recovered) => draws.extend(recovered),
                        Err(e) => tracing::warn!(error = %e, "lobby recovery failed"),
                    }
                    attempts += 1;
                    match self.run_once().await {
                        Ok(draw) => draws.push(draw),
                        Err(e) => tracing::warn!(
                            error_code = e.error_code(),
                            error = %e,
                            "lobby round failed, scheduler continuing"
                        ),
                    }
                }
            }
        }
        Ok(draws)
    }
}
