//! Display sinks of the popup. The controller pushes semantic values; each
//! implementation decides how a sink is rendered.

use ansi_term::Colour;

pub trait PopupView: Send {
    /// Platform label shown once the active tab has been classified.
    fn show_platform(&mut self, label: &str);

    /// Elapsed-time readout, updated on every tick and on session reset.
    fn show_timer(&mut self, elapsed_secs: u64);

    /// Output area holding either the backend's report or an error message.
    fn show_output(&mut self, text: &str);
}

/// Renders the popup sinks as terminal lines.
pub struct TerminalView;

impl PopupView for TerminalView {
    fn show_platform(&mut self, label: &str) {
        println!("{} {}", Colour::Cyan.bold().paint("Platform:"), label);
    }

    fn show_timer(&mut self, elapsed_secs: u64) {
        println!(
            "{} {} sec",
            Colour::Green.bold().paint("Time:"),
            elapsed_secs
        );
    }

    fn show_output(&mut self, text: &str) {
        println!("{}", text);
    }
}
