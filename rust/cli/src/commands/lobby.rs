//! `lobby`: runs the shared-round scheduler in the foreground.
//!
//! Bets come from `baccarat bet` in other processes sharing the database.
//! Ctrl+C stops the scheduler once the round in progress has settled.

use std::io::Write;
use std::sync::Arc;

use crate::commands::open_ledger;
use crate::error::CliError;
use crate::ui;
use baccarat_table::config::TableConfig;
use baccarat_table::lobby::{Lobby, LobbyEvent, Scheduler};
use tokio::sync::{mpsc, oneshot};

fn write_event(out: &mut dyn Write, event: &LobbyEvent) -> std::io::Result<()> {
    match event {
        LobbyEvent::BettingOpened {
            round_id,
            closes_at,
        } => writeln!(out, "betting open {} until {}", round_id, closes_at),
        LobbyEvent::BettingClosed { round_id } => writeln!(out, "betting closed {}", round_id),
        LobbyEvent::Settled(draw) => {
            let r = &draw.result;
            let line = ui::round_line(
                &r.round_id,
                r.winner.label(),
                r.player_score,
                r.banker_score,
                r.lucky_six.label(),
                r.total_wagered,
                r.total_payout,
            );
            writeln!(out, "{} bets={}", line, draw.bets_settled)
        }
    }
}

pub fn handle_lobby_command(
    rounds: Option<usize>,
    interval_secs: Option<u64>,
    window_secs: Option<u64>,
    cfg: &TableConfig,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    if !cfg.lobby.enabled {
        return Err(CliError::Config(
            "lobby is disabled (set [lobby] enabled = true or BACCARAT_LOBBY_ENABLED=1)".into(),
        ));
    }
    let mut lobby_cfg = cfg.lobby;
    if let Some(secs) = interval_secs {
        lobby_cfg.interval_secs = secs;
    }
    if let Some(secs) = window_secs {
        lobby_cfg.betting_window_secs = secs;
    }
    if rounds.is_none() {
        ui::display_warning(err, "running until interrupted (Ctrl+C)")?;
    }

    let lobby = Arc::new(Lobby::new(open_ledger(cfg)?, cfg.payouts));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = Scheduler::new(lobby, lobby_cfg)?.with_events(tx);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async move {
        let (stop, shutdown) = oneshot::channel();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    let _ = stop.send(());
                }
                // No signal handling available: keep `stop` alive so the
                // scheduler only ends on its round limit.
                Err(_) => std::future::pending::<()>().await,
            }
        });
        let handle = tokio::spawn(async move { scheduler.run(rounds, shutdown).await });

        while let Some(event) = rx.recv().await {
            write_event(out, &event)?;
        }
        let draws = handle
            .await
            .map_err(|e| CliError::Engine(format!("lobby scheduler stopped: {e}")))??;
        writeln!(out, "completed {} rounds", draws.len())?;
        Ok::<(), CliError>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::temp_config;
    use baccarat_table::ledger::Ledger;
    use tempfile::TempDir;

    #[test]
    fn test_disabled_lobby_is_refused() {
        let dir = TempDir::new().unwrap();
        let cfg = temp_config(&dir);
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let e = handle_lobby_command(Some(1), None, None, &cfg, &mut out, &mut err).unwrap_err();
        assert!(matches!(e, CliError::Config(_)));
    }

    #[test]
    fn test_invalid_window_is_refused() {
        let dir = TempDir::new().unwrap();
        let mut cfg = temp_config(&dir);
        cfg.lobby.enabled = true;
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let e = handle_lobby_command(Some(1), Some(5), Some(5), &cfg, &mut out, &mut err)
            .unwrap_err();
        assert!(matches!(e, CliError::Config(_)));
    }

    #[test]
    fn test_one_lobby_round_runs_to_completion() {
        let dir = TempDir::new().unwrap();
        let mut cfg = temp_config(&dir);
        cfg.lobby.enabled = true;
        let (mut out, mut err) = (Vec::new(), Vec::new());
        handle_lobby_command(Some(1), Some(2), Some(1), &cfg, &mut out, &mut err).unwrap();

        let output = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 4, "{output}");
        assert!(lines[0].starts_with("betting open "));
        assert!(lines[1].starts_with("betting closed "));
        assert!(lines[2].ends_with("wagered=0 paid=0 bets=0"));
        assert_eq!(lines[3], "completed 1 rounds");

        let ledger = Ledger::open(&cfg.database).unwrap();
        assert_eq!(ledger.round_ids().unwrap().len(), 1);
    }
}
