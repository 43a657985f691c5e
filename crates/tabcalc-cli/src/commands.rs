//! REPL `:` commands.

/// Every command name, for completion and hints.
pub const COMMAND_NAMES: &[&str] = &[
    ":new", ":close", ":rename", ":tab", ":tabs", ":clear", ":prev", ":next", ":vars",
    ":markup", ":help", ":quit",
];

/// A parsed REPL command. Tab numbers are 0-based here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    New(Option<String>),
    /// `None` closes the active tab.
    Close(Option<usize>),
    Rename(usize, String),
    Switch(usize),
    ListTabs,
    Clear,
    Previous,
    Next,
    Vars,
    Markup,
    Help,
    Quit,
}

/// Parses a line starting with `:`. Returns a usage message on bad input.
pub fn parse_command(line: &str) -> Result<ReplCommand, String> {
    let line = line.trim();
    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name {
        ":new" => ReplCommand::New((!rest.is_empty()).then(|| rest.to_string())),
        ":close" => {
            if rest.is_empty() {
                ReplCommand::Close(None)
            } else {
                ReplCommand::Close(Some(parse_tab_number(rest)?))
            }
        }
        ":rename" => {
            let (number, label) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| "Usage: :rename <n> <label>".to_string())?;
            let label = label.trim();
            if label.is_empty() {
                return Err("Usage: :rename <n> <label>".to_string());
            }
            ReplCommand::Rename(parse_tab_number(number)?, label.to_string())
        }
        ":tab" => {
            if rest.is_empty() {
                return Err("Usage: :tab <n>".to_string());
            }
            ReplCommand::Switch(parse_tab_number(rest)?)
        }
        ":tabs" => ReplCommand::ListTabs,
        ":clear" => ReplCommand::Clear,
        ":prev" => ReplCommand::Previous,
        ":next" => ReplCommand::Next,
        ":vars" => ReplCommand::Vars,
        ":markup" => ReplCommand::Markup,
        ":help" => ReplCommand::Help,
        ":quit" | ":q" | ":exit" => ReplCommand::Quit,
        other => return Err(format!("Unknown command {} (try :help)", other)),
    };
    Ok(command)
}

/// Converts a 1-based tab number to an index.
fn parse_tab_number(text: &str) -> Result<usize, String> {
    match text.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("Invalid tab number '{}'", text.trim())),
    }
}

pub const HELP: &str = "\
Enter an expression to evaluate it in the active tab.
Start with an operator (+5, *2) to continue from the previous answer.

  :new [hint]          open a new tab
  :close [n]           close tab n (default: active tab)
  :rename <n> <label>  rename tab n
  :tab <n>             switch to tab n
  :tabs                list tabs
  :clear               clear the active tab's history
  :prev / :next        recall older / newer input
  :vars                show the active tab's variables
  :markup              show the last result as markup
  :help                show this help
  :quit                exit";
