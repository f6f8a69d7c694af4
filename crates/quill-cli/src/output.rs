use console::style;
use quill::agent::ReplySink;
use std::io::Write;

/// Renders agent output to the terminal: text fragments are echoed as they
/// stream in, tool activity gets a colored one-line notice.
pub struct ConsoleSink;

impl ReplySink for ConsoleSink {
    fn on_content(&mut self, fragment: &str) {
        print!("{fragment}");
        let _ = std::io::stdout().flush();
    }

    fn on_tool_call(&mut self, name: &str) {
        println!();
        println!("{}", style(format!("→ Using tool: {name}")).cyan());
    }

    fn on_tool_result(&mut self) {
        println!("{}", style("→ Processing tool result...").yellow());
    }
}

pub const BANNER_TITLE: &str = " quill ";
pub const BANNER_TAGLINE: &str = "An AI coding assistant with local tools";
pub const BANNER_READY: &str =
    "Ready! Type /help for commands, /exit to quit";

pub fn welcome() {
    let _ = cliclack::intro(style(BANNER_TITLE).on_cyan().black().bold());
    let _ = cliclack::log::remark(BANNER_TAGLINE);
    let _ = cliclack::log::success(BANNER_READY);
}
