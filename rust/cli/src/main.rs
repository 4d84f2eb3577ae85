use std::io;

fn main() {
    // A second subscriber only happens in embedded use; the first one wins.
    let _ = baccarat_table::logging::init_logging();
    let code = baccarat_cli::run(std::env::args(), &mut io::stdout(), &mut io::stderr());
    std::process::exit(code);
}
