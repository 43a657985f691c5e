//! Interactive calculator loop.

use crate::commands::{HELP, ReplCommand, parse_command};
use crate::helper::CalcHelper;
use anyhow::Result;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use tabcalc_application::CalculatorContext;
use tabcalc_core::evaluation::EvaluationResult;

pub async fn run(context: &mut CalculatorContext) -> Result<()> {
    let mut rl = Editor::new()?;
    rl.set_helper(Some(CalcHelper::new()));

    let mut failures = context.failures();

    println!("{}", "=== TabCalc ===".bright_magenta().bold());
    println!(
        "{}",
        "Type an expression, ':help' for commands, or ':quit' to exit.".bright_black()
    );
    println!();

    // Input pre-filled by :prev / :next.
    let mut recalled = String::new();

    loop {
        if let Some(helper) = rl.helper_mut() {
            helper.set_variables(context.active_session().scope.bindings().keys());
        }

        let prompt = format!("[{}] > ", context.active_session().label);
        let readline = if recalled.is_empty() {
            rl.readline(&prompt)
        } else {
            rl.readline_with_initial(&prompt, (recalled.as_str(), ""))
        };
        recalled.clear();

        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                if trimmed.starts_with(':') {
                    match parse_command(trimmed) {
                        Ok(ReplCommand::Quit) => break,
                        Ok(command) => {
                            if let Some(text) = execute(context, command) {
                                recalled = text;
                            }
                        }
                        Err(message) => println!("{}", message.yellow()),
                    }
                } else {
                    let result = context.submit(trimmed);
                    print_result(&result);
                }

                // Give the deferred write a chance to run.
                tokio::task::yield_now().await;
                while let Ok(error) = failures.try_recv() {
                    eprintln!("{}", format!("Warning: {}", error).yellow());
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type ':quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    println!("{}", "Goodbye!".bright_green());
    Ok(())
}

/// Runs a command. Returns text to pre-fill the next input line, if any.
fn execute(context: &mut CalculatorContext, command: ReplCommand) -> Option<String> {
    let outcome = match command {
        ReplCommand::New(hint) => {
            let index = context.new_tab(hint.as_deref());
            println!(
                "{}",
                format!("Opened tab {} '{}'", index + 1, context.active_session().label).green()
            );
            Ok(())
        }
        ReplCommand::Close(index) => {
            let index = index.unwrap_or_else(|| context.active_index());
            context.close_tab(index)
        }
        ReplCommand::Rename(index, label) => context.rename_tab(index, &label),
        ReplCommand::Switch(index) => context.switch_tab(index),
        ReplCommand::ListTabs => {
            print_tabs(context);
            Ok(())
        }
        ReplCommand::Clear => {
            context.clear_history();
            Ok(())
        }
        ReplCommand::Previous => return recall(context.recall_previous()),
        ReplCommand::Next => return recall(context.recall_next()),
        ReplCommand::Vars => {
            for (name, value) in context.active_session().scope.iter() {
                println!("  {} = {}", name.bright_cyan(), value);
            }
            Ok(())
        }
        ReplCommand::Markup => {
            match context.active_session().history.last() {
                Some(entry) => println!("{}", context.render_markup(entry)),
                None => println!("{}", "No entries yet".bright_black()),
            }
            Ok(())
        }
        ReplCommand::Help => {
            println!("{}", HELP);
            Ok(())
        }
        ReplCommand::Quit => Ok(()),
    };

    if let Err(e) = outcome {
        println!("{}", e.to_string().yellow());
    }
    None
}

fn recall(text: &str) -> Option<String> {
    if text.is_empty() {
        println!("{}", "(end of history)".bright_black());
        None
    } else {
        Some(text.to_string())
    }
}

pub fn print_result(result: &EvaluationResult) {
    match result.result_text() {
        Some(text) => {
            for (name, value) in result.assignments() {
                println!("  {} = {}", name.bright_cyan(), value);
            }
            println!("{}", format!("= {}", text).bright_green().bold());
        }
        None => {
            let message = result.error_message().unwrap_or_default();
            println!("{}", format!("Error: {}", message).red());
        }
    }
}

pub fn print_tabs(context: &CalculatorContext) {
    for (index, session) in context.store().sessions().iter().enumerate() {
        let marker = if index == context.active_index() { "*" } else { " " };
        let line = format!(
            "{} {:>2}  {}  ({} entries, ans = {})",
            marker,
            index + 1,
            session.label,
            session.history.len(),
            session.scope.ans()
        );
        if index == context.active_index() {
            println!("{}", line.bright_green());
        } else {
            println!("{}", line);
        }
    }
}
