use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use baccarat_engine::payout::{BetKind, PayoutTable, WagerSet};
use baccarat_engine::shoe::Shoe;
use baccarat_table::audit::audit_rounds;
use baccarat_table::config::LobbyConfig;
use baccarat_table::errors::TableError;
use baccarat_table::ledger::Ledger;
use baccarat_table::lobby::{Lobby, LobbyEvent, LobbyState, Scheduler};
use baccarat_table::records::{BetStatus, RoundMode};
use baccarat_table::shoes::SeededShoes;
use tokio::sync::{mpsc, oneshot};

fn lobby() -> Arc<Lobby> {
    let ledger = Arc::new(Ledger::open_in_memory().expect("ledger"));
    Arc::new(Lobby::with_shoes(
        ledger,
        PayoutTable::default(),
        SeededShoes::starting_at(7),
    ))
}

fn config() -> LobbyConfig {
    LobbyConfig {
        enabled: true,
        interval_secs: 60,
        betting_window_secs: 45,
    }
}

#[tokio::test(start_paused = true)]
async fn scheduler_settles_bets_placed_during_the_window() {
    let lobby = lobby();
    let alice = lobby.ledger().create_user("alice", 1_000).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduler = Scheduler::new(Arc::clone(&lobby), config())
        .unwrap()
        .with_events(tx);
    let (_stop, shutdown) = oneshot::channel();
    let handle = tokio::spawn(async move { scheduler.run(Some(1), shutdown).await });

    let round_id = match rx.recv().await {
        Some(LobbyEvent::BettingOpened { round_id, .. }) => round_id,
        other => panic!("expected betting to open, got {other:?}"),
    };
    lobby
        .place_bet(alice.id, &round_id, &WagerSet::single(BetKind::Banker, 100))
        .unwrap();
    assert_eq!(lobby.balance(alice.id).unwrap(), 900);

    let draws = handle.await.unwrap().unwrap();
    assert_eq!(draws.len(), 1);
    let draw = &draws[0];
    assert_eq!(draw.result.round_id, round_id);
    assert_eq!(draw.bets_settled, 1);
    assert_eq!(
        lobby.balance(alice.id).unwrap(),
        900 + draw.result.total_payout
    );

    let round = lobby.lobby_round(&round_id).unwrap();
    assert_eq!(round.state, LobbyState::Completed);
    let details = lobby.ledger().round_details(&round_id).unwrap();
    assert_eq!(details.round.mode, RoundMode::Lobby);
    assert_eq!(details.bets[0].status, BetStatus::Settled);

    let late = lobby
        .place_bet(alice.id, &round_id, &WagerSet::single(BetKind::Tie, 5))
        .unwrap_err();
    assert!(matches!(
        late,
        TableError::BettingClosed {
            state: LobbyState::Completed,
            ..
        }
    ));
    assert_eq!(
        lobby.balance(alice.id).unwrap(),
        900 + draw.result.total_payout
    );
}

#[tokio::test(start_paused = true)]
async fn scheduler_stops_on_shutdown() {
    let lobby = lobby();
    let scheduler = Scheduler::new(Arc::clone(&lobby), config()).unwrap();
    let (stop, shutdown) = oneshot::channel();
    let handle = tokio::spawn(async move { scheduler.run(None, shutdown).await });

    tokio::time::sleep(Duration::from_secs(150)).await;
    stop.send(()).unwrap();
    let draws = handle.await.unwrap().unwrap();
    // Rounds open at 0s, 60s and 120s. The third is mid-window when the
    // signal arrives and still finishes before the loop sees it.
    assert_eq!(draws.len(), 3);
    assert!(lobby.current_round().unwrap().is_none());
}

#[test]
fn shared_round_settles_every_user_individually() {
    let lobby = lobby();
    let ledger = Arc::clone(lobby.ledger());
    let alice = ledger.create_user("alice", 1_000).unwrap();
    let bob = ledger.create_user("bob", 1_000).unwrap();
    let carol = ledger.create_user("carol", 1_000).unwrap();

    let round = lobby.open_round(Duration::from_secs(45)).unwrap();
    lobby
        .place_bet(alice.id, &round.round_id, &WagerSet::single(BetKind::Player, 200))
        .unwrap();
    lobby
        .place_bet(
            bob.id,
            &round.round_id,
            &WagerSet {
                banker: 150,
                lucky_six: 10,
                ..Default::default()
            },
        )
        .unwrap();
    lobby
        .place_bet(carol.id, &round.round_id, &WagerSet::single(BetKind::Tie, 25))
        .unwrap();
    lobby.close_round(&round.round_id).unwrap();
    let draw = lobby.draw_and_settle(&round.round_id).unwrap();
    assert_eq!(draw.bets_settled, 4);
    assert_eq!(draw.result.total_wagered, 385);

    let details = ledger.round_details(&round.round_id).unwrap();
    let mut credited_total = 0;
    for user in [&alice, &bob, &carol] {
        let wagered: u64 = details
            .bets
            .iter()
            .filter(|b| b.user_id == user.id)
            .map(|b| b.amount)
            .sum();
        let credited: u64 = details
            .bets
            .iter()
            .filter(|b| b.user_id == user.id)
            .map(|b| b.credited())
            .sum();
        credited_total += credited;
        assert_eq!(ledger.balance(user.id).unwrap(), 1_000 - wagered + credited);
    }
    assert_eq!(credited_total, details.round.total_paid);
    assert_eq!(
        ledger.journal_total(&round.round_id).unwrap(),
        details.round.total_paid as i64 - details.round.total_wagered as i64
    );
    assert!(audit_rounds(&ledger, &PayoutTable::default())
        .unwrap()
        .is_clean());
}

#[test]
fn stalled_rounds_are_recovered() {
    let lobby = lobby();
    let ledger = Arc::clone(lobby.ledger());
    let dan = ledger.create_user("dan", 500).unwrap();

    let closed = lobby.open_round(Duration::from_secs(45)).unwrap();
    lobby
        .place_bet(dan.id, &closed.round_id, &WagerSet::single(BetKind::Tie, 10))
        .unwrap();
    lobby.close_round(&closed.round_id).unwrap();
    let expired = lobby.open_round(Duration::ZERO).unwrap();
    let open = lobby.open_round(Duration::from_secs(3_600)).unwrap();

    // A fresh lobby over the same ledger, as after a restart
    let restarted = Lobby::with_shoes(ledger, PayoutTable::default(), SeededShoes::starting_at(1));
    let draws = restarted.recover_stalled().unwrap();
    assert_eq!(draws.len(), 2);
    assert_eq!(
        restarted.lobby_round(&closed.round_id).unwrap().state,
        LobbyState::Completed
    );
    assert_eq!(
        restarted.lobby_round(&expired.round_id).unwrap().state,
        LobbyState::Completed
    );
    assert_eq!(
        restarted.lobby_round(&open.round_id).unwrap().state,
        LobbyState::Betting
    );
    assert_eq!(
        restarted.current_round().unwrap().map(|r| r.round_id),
        Some(open.round_id)
    );
}

#[tokio::test(start_paused = true)]
async fn open_round_from_an_earlier_run_settles_when_its_window_ends() {
    let lobby = lobby();
    let ledger = Arc::clone(lobby.ledger());
    let erin = ledger.create_user("erin", 1_000).unwrap();
    let earlier = lobby.open_round(Duration::from_secs(3_600)).unwrap();
    lobby
        .place_bet(erin.id, &earlier.round_id, &WagerSet::single(BetKind::Player, 100))
        .unwrap();

    let restarted = Arc::new(Lobby::with_shoes(
        Arc::clone(&ledger),
        PayoutTable::default(),
        SeededShoes::starting_at(1),
    ));
    let scheduler = Scheduler::new(Arc::clone(&restarted), config()).unwrap();
    let (_stop, shutdown) = oneshot::channel();
    let draws = scheduler.run(Some(1), shutdown).await.unwrap();

    assert_eq!(draws.len(), 2);
    let resumed = &draws[0];
    assert_eq!(resumed.result.round_id, earlier.round_id);
    assert_eq!(resumed.bets_settled, 1);
    assert_eq!(
        restarted.lobby_round(&earlier.round_id).unwrap().state,
        LobbyState::Completed
    );
    assert_eq!(
        ledger.balance(erin.id).unwrap(),
        900 + resumed.result.total_payout
    );
    assert!(restarted.current_round().unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn scheduler_carries_on_after_a_failed_round() {
    let dealt = AtomicU64::new(0);
    // The first shoe is empty, so the first draw fails and rolls back.
    let shoes = move || match dealt.fetch_add(1, Ordering::Relaxed) {
        0 => Shoe::from_cards(Vec::new()),
        n => Shoe::shuffled(Some(n)),
    };
    let ledger = Arc::new(Ledger::open_in_memory().unwrap());
    let lobby = Arc::new(Lobby::with_shoes(
        Arc::clone(&ledger),
        PayoutTable::default(),
        shoes,
    ));
    let scheduler = Scheduler::new(Arc::clone(&lobby), config()).unwrap();
    let (_stop, shutdown) = oneshot::channel();
    let draws = scheduler.run(Some(3), shutdown).await.unwrap();

    // Three rounds opened; the failed one is drawn again at the next tick.
    assert_eq!(draws.len(), 3);
    let mut ids: Vec<_> = draws.iter().map(|d| d.result.round_id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
    for id in &ids {
        assert_eq!(lobby.lobby_round(id).unwrap().state, LobbyState::Completed);
    }
    assert!(lobby.current_round().unwrap().is_none());
    assert!(audit_rounds(&ledger, &PayoutTable::default())
        .unwrap()
        .is_clean());
}
