//! Conformance test runner binary: reads test cases as line-delimited
//! JSON on stdin, writes outcomes as line-delimited JSON on stdout.

use std::io::{self, Write};

use rule_engine::conformance;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut locked_out = stdout.lock();

    if let Err(e) = conformance::run_stream(stdin.lock(), &mut locked_out) {
        tracing::error!(error = %e, "conformance runner failed");
        let _ = locked_out.flush();
        std::process::exit(1);
    }
}
