//! Terminal sink for sandbox runs.

use jitbox_core::{MetaMember, SandboxSink};

use crate::colors;

/// Prints progress to stdout and errors to stderr.
pub struct TerminalSink {
    quiet: bool,
}

impl TerminalSink {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl SandboxSink for TerminalSink {
    fn log(&self, line: &str) {
        tracing::debug!("{}", line);
        if !self.quiet {
            println!("{}  {}{}", colors::DIM, line, colors::RESET);
            colors::flush_stdout();
        }
    }

    fn show_error(&self, text: &str) {
        eprintln!("{}Error:{}", colors::RED, colors::RESET);
        for line in text.lines() {
            eprintln!("    {line}");
        }
    }

    fn navigate_to(&self, member: Option<&MetaMember>) {
        match member {
            Some(m) => println!(
                "{}Compiled:{} {}{}{}",
                colors::GREEN,
                colors::RESET,
                colors::BOLD,
                m.signature,
                colors::RESET
            ),
            None => println!(
                "{}No compiled member found{}",
                colors::YELLOW,
                colors::RESET
            ),
        }
    }
}
