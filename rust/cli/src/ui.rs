//! UI helper functions for terminal output formatting.

use std::io::Write;

pub fn write_error(err: &mut dyn Write, msg: &str) -> std::io::Result<()> {
    writeln!(err, "Error: {}", msg)
}

/// Display a warning message to stderr with "WARNING:" prefix
pub fn display_warning(err: &mut dyn Write, message: &str) -> std::io::Result<()> {
    writeln!(err, "WARNING: {}", message)
}

/// One line per settled round: `<id> <winner> P<score>/B<score> ...`.
pub fn round_line(
    round_id: &str,
    winner: &str,
    player_score: u8,
    banker_score: u8,
    lucky_six: Option<&str>,
    wagered: u64,
    paid: u64,
) -> String {
    let mut line = format!("{round_id} {winner} P{player_score}/B{banker_score}");
    if let Some(kind) = lucky_six {
        line.push_str(&format!(" lucky6={kind}"));
    }
    line.push_str(&format!(" wagered={wagered} paid={paid}"));
    line
}
