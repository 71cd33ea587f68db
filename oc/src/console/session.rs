//! Interactive console session

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::render::{render_history_line, render_pending, render_raw, render_settled};
use crate::lifecycle::{LifecycleController, RecordUpdate};
use crate::session::{ApplyOutcome, SessionLog};

/// Interactive console session
pub struct ConsoleSession {
    controller: LifecycleController,
    log: SessionLog,
    show_metadata: bool,
    endpoint: String,
}

impl ConsoleSession {
    /// Create a new console session
    pub fn new(controller: LifecycleController, endpoint: impl Into<String>, show_metadata: bool) -> Self {
        Self {
            controller,
            log: SessionLog::new(),
            show_metadata,
            endpoint: endpoint.into(),
        }
    }

    /// Run the console main loop until `/quit` or end of input
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        let mut editor = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;
        let prompt = format!("{} ", ">".bright_green());

        loop {
            let line = match editor.readline(&prompt) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => return Err(eyre::eyre!("Readline error: {}", err)),
            };

            match classify_line(&line) {
                LineAction::Skip => {}
                LineAction::Command(command) => {
                    let _ = editor.add_history_entry(command);
                    if self.handle_slash_command(command) == SlashResult::Quit {
                        break;
                    }
                }
                LineAction::Message(message) => {
                    let _ = editor.add_history_entry(message.trim());
                    self.process_user_input(message).await;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Orchestrator Console".bright_cyan().bold());
        println!("Endpoint: {}", self.endpoint);
        println!("Session: {}", self.log.token());
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts.first().copied().unwrap_or("");

        match cmd {
            "/help" | "/h" => {
                self.print_help();
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            "/new" | "/n" => {
                let token = self.log.new_session();
                println!("{} {}", "New session:".dimmed(), token);
                SlashResult::Continue
            }
            "/history" => {
                self.print_history();
                SlashResult::Continue
            }
            "/raw" => {
                self.print_raw();
                SlashResult::Continue
            }
            "/session" => {
                println!("Session: {}", self.log.token());
                SlashResult::Continue
            }
            "/metadata" | "/m" => {
                self.show_metadata = !self.show_metadata;
                let state = if self.show_metadata { "on" } else { "off" };
                println!("{} {}", "Metadata panel:".dimmed(), state);
                SlashResult::Continue
            }
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
                SlashResult::Continue
            }
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:14} Show this help", "/help".yellow());
        println!("  {:14} Exit the console", "/quit".yellow());
        println!("  {:14} Start a new session (clears history)", "/new".yellow());
        println!("  {:14} Show this session's requests", "/history".yellow());
        println!("  {:14} Print the last record as JSON", "/raw".yellow());
        println!("  {:14} Show the session token", "/session".yellow());
        println!("  {:14} Toggle the metadata panel", "/metadata".yellow());
        println!();
    }

    fn print_history(&self) {
        if self.log.is_empty() {
            println!("{}", "No requests in this session.".dimmed());
            return;
        }

        println!();
        println!("{}", "Session History:".bright_cyan());
        for (i, record) in self.log.records().iter().enumerate() {
            println!("{}", render_history_line(i, record));
        }
        println!();
    }

    fn print_raw(&self) {
        let Some(record) = self.log.records().last() else {
            println!("{}", "No requests in this session.".dimmed());
            return;
        };
        match render_raw(record) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!(error = %e, "print_raw: failed to serialize record"),
        }
    }

    /// Submit one line and render its updates as they arrive
    async fn process_user_input(&mut self, input: &str) {
        debug!(input_len = input.len(), "process_user_input: called");
        let (tx, mut rx) = mpsc::channel::<RecordUpdate>(4);

        let controller = &self.controller;
        let log = &mut self.log;
        let show_metadata = self.show_metadata;
        let token = log.token().clone();

        let submit = controller.submit_streaming(&token, input, tx);
        let render = async {
            while let Some(update) = rx.recv().await {
                let line = match &update {
                    RecordUpdate::Pending(record) => render_pending(record),
                    RecordUpdate::Settled(record) => render_settled(record, show_metadata),
                };
                if log.apply(update) != ApplyOutcome::Ignored {
                    println!("{}", line);
                }
            }
        };

        let (result, ()) = tokio::join!(submit, render);
        if let Err(rejected) = result {
            warn!(%rejected, "process_user_input: submission rejected");
            println!("{} {}", "!".yellow(), rejected);
        }
        println!();
    }
}

/// Result of handling a slash command
#[derive(Debug, PartialEq, Eq)]
enum SlashResult {
    Continue,
    Quit,
}

/// What a line typed at the prompt asks for
#[derive(Debug, PartialEq, Eq)]
enum LineAction<'a> {
    Skip,
    /// Trimmed slash command
    Command(&'a str),
    /// Message exactly as typed
    Message(&'a str),
}

fn classify_line(line: &str) -> LineAction<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        LineAction::Skip
    } else if trimmed.starts_with('/') {
        LineAction::Command(trimmed)
    } else {
        LineAction::Message(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_are_skipped() {
        assert_eq!(classify_line(""), LineAction::Skip);
        assert_eq!(classify_line("  \t "), LineAction::Skip);
    }

    #[test]
    fn test_slash_commands_are_trimmed() {
        assert_eq!(classify_line("  /raw  "), LineAction::Command("/raw"));
        assert_eq!(classify_line("/quit"), LineAction::Command("/quit"));
    }

    #[test]
    fn test_messages_keep_surrounding_whitespace() {
        assert_eq!(classify_line("  ping  "), LineAction::Message("  ping  "));
        assert_eq!(classify_line("a / b"), LineAction::Message("a / b"));
    }
}
