use anyhow::Result;
use console::style;

use quill::agent::Agent;
use quill::models::message::Role;

use crate::output::{welcome, ConsoleSink};

const PREVIEW_CHARS: usize = 100;

/// Slash commands recognized at the prompt. Anything else is a message
/// for the agent.
#[derive(Debug, PartialEq)]
enum Directive {
    Exit,
    Clear,
    History,
    Help,
    Unknown(String),
}

fn parse_directive(input: &str) -> Option<Directive> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }
    Some(match trimmed.to_ascii_lowercase().as_str() {
        "/exit" | "/quit" => Directive::Exit,
        "/clear" => Directive::Clear,
        "/history" => Directive::History,
        "/help" => Directive::Help,
        _ => Directive::Unknown(trimmed.to_string()),
    })
}

pub struct Session {
    agent: Agent,
}

impl Session {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }

    /// Interactive loop. An input error (Ctrl+C, closed stdin) ends the
    /// session; an agent error is reported and the loop continues.
    pub async fn run(&mut self) -> Result<()> {
        welcome();

        loop {
            let line: String = match cliclack::input("You:").placeholder("").interact() {
                Ok(line) => line,
                Err(_) => break,
            };

            if let Some(directive) = parse_directive(&line) {
                match directive {
                    Directive::Exit => break,
                    Directive::Clear => {
                        self.agent.clear_history();
                        println!("{}", style("History cleared").dim());
                    }
                    Directive::History => self.show_history(),
                    Directive::Help => show_help(),
                    Directive::Unknown(cmd) => {
                        println!("{}", style(format!("Unknown command: {cmd}")).red());
                        println!("Type {} for the command list", style("/help").cyan());
                    }
                }
                continue;
            }

            if line.trim().is_empty() {
                continue;
            }

            if let Err(e) = self.turn(&line).await {
                println!("{}", style(format!("Error: {e}")).red());
            }
        }

        let _ = cliclack::outro(style("Goodbye!").dim());
        Ok(())
    }

    /// Quick mode: one turn, no prompt loop.
    pub async fn run_once(&mut self, query: &str) -> Result<()> {
        self.turn(query).await
    }

    async fn turn(&mut self, user_text: &str) -> Result<()> {
        let mut sink = ConsoleSink;
        self.agent.reply(user_text, &mut sink).await?;
        println!();
        println!();
        Ok(())
    }

    fn show_history(&self) {
        let history = self.agent.history();
        if history.is_empty() {
            println!("{}", style("No messages yet").dim());
            return;
        }

        for (i, message) in history.iter().enumerate() {
            let label = match message.role {
                Role::User => style("User").cyan(),
                Role::Assistant => style("Agent").green(),
            };
            println!("{:3}. {}: {}", i + 1, label, preview(&message.content));
        }
    }
}

fn show_help() {
    println!("Commands:");
    println!("  /clear   - Clear the conversation history");
    println!("  /history - Show the conversation so far");
    println!("  /help    - Display this help message");
    println!("  /exit    - End the session");
}

/// Single-line preview of a message body, truncated on a char boundary.
fn preview(content: &str) -> String {
    let flattened = content.replace('\n', " ");
    if flattened.chars().count() <= PREVIEW_CHARS {
        return flattened;
    }
    let truncated: String = flattened.chars().take(PREVIEW_CHARS).collect();
    format!("{truncated}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directive_known_commands() {
        assert_eq!(parse_directive("/exit"), Some(Directive::Exit));
        assert_eq!(parse_directive("/quit"), Some(Directive::Exit));
        assert_eq!(parse_directive("/clear"), Some(Directive::Clear));
        assert_eq!(parse_directive("/history"), Some(Directive::History));
        assert_eq!(parse_directive("/help"), Some(Directive::Help));
    }

    #[test]
    fn test_parse_directive_case_and_whitespace() {
        assert_eq!(parse_directive("  /EXIT  "), Some(Directive::Exit));
        assert_eq!(parse_directive("/Clear"), Some(Directive::Clear));
    }

    #[test]
    fn test_parse_directive_unknown() {
        assert_eq!(
            parse_directive("/frobnicate"),
            Some(Directive::Unknown("/frobnicate".to_string()))
        );
    }

    #[test]
    fn test_plain_messages_are_not_directives() {
        assert_eq!(parse_directive("hello there"), None);
        assert_eq!(parse_directive("what does / mean in paths?"), None);
        assert_eq!(parse_directive(""), None);
    }

    #[test]
    fn test_preview_truncates_and_flattens() {
        let long = "line one\nline two ".repeat(20);
        let shown = preview(&long);
        assert!(!shown.contains('\n'));
        assert_eq!(shown.chars().count(), PREVIEW_CHARS + 3);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn test_preview_short_content_untouched() {
        assert_eq!(preview("hi there"), "hi there");
    }
}
