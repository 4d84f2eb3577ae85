use serde::{Deserialize, Serialize};

use crate::cards::format_cards;
use crate::round::RoundOutcome;

/// One dealt round as written to a JSONL round log.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Identifier of the round (format: YYYYMMDD-NNNNNN for logged deals)
    pub round_id: String,
    /// Shuffle seed, enabling the deal to be reproduced
    pub seed: Option<u64>,
    /// Player cards as comma-joined tokens, e.g. `S2,H3,D4`
    pub player_cards: String,
    pub banker_cards: String,
    pub player_score: u8,
    pub banker_score: u8,
    pub natural: bool,
    /// `Player`, `Banker` or `Tie`
    pub winner: String,
    /// `2cards` / `3cards` when Lucky Six triggered
    #[serde(default)]
    pub lucky_six: Option<String>,
    /// Timestamp when the round was logged (RFC3339 format)
    #[serde(default)]
    pub ts: Option<String>,
}

impl RoundRecord {
    pub fn from_outcome(round_id: impl Into<String>, outcome: &RoundOutcome) -> Self {
        Self {
            round_id: round_id.into(),
            seed: outcome.seed,
            player_cards: format_cards(outcome.player.cards()),
            banker_cards: format_cards(outcome.banker.cards()),
            player_score: outcome.player_score,
            banker_score: outcome.banker_score,
            natural: outcome.natural,
            winner: outcome.winner.label().to_string(),
            lucky_six: outcome.lucky_six.label().map(str::to_string),
            ts: None,
        }
    }
}

pub fn format_round_id(yyyymmdd: &str, seq: u32) -> String {
    format!("{}-{:06}", yyyymmdd, seq)
}

use chrono::{SecondsFormat, Utc};
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

/// Appends [`RoundRecord`]s as JSON lines.
pub struct RoundLogger {
    writer: Option<BufWriter<File>>,
    date: String,
    seq: u32,
}

impl RoundLogger {
    /// Opens `path` for appending. Numbering continues after the records
    /// already in the file.
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        let existing = match File::open(path) {
            Ok(f) => BufReader::new(f).lines().count(),
            Err(e) if e.kind() == ErrorKind::NotFound => 0,
            Err(e) => return Err(e),
        };
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Some(BufWriter::new(f)),
            date: Utc::now().format("%Y%m%d").to_string(),
            seq: u32::try_from(existing).unwrap_or(u32::MAX),
        })
    }

    pub fn with_seq_for_test(date: &str) -> Self {
        Self {
            writer: None,
            date: date.to_string(),
            seq: 0,
        }
    }

    pub fn next_id(&mut self) -> String {
        self.seq += 1;
        format_round_id(&self.date, self.seq)
    }

    pub fn write(&mut self, record: &RoundRecord) -> std::io::Result<()> {
        let mut rec = record.clone();
        if rec.ts.is_none() {
            rec.ts = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        let line = serde_json::to_string(&rec).map_err(std::io::Error::other)?;
        if let Some(w) = &mut self.writer {
            w.write_all(line.as_bytes())?;
            w.write_all(b"\n")?;
            w.flush()?;
        }
        Ok(())
    }
}
