// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Interactive REPL over a module system.
//!
//! Every line is evaluated in one persistent pseudo-module, so `require`
//! resolves relative to the base directory and declarations carry over
//! between lines.

use modulus_engine::Value;
use modulus_loader::{LoadError, ModuleSystem, Session, VERSION};
use owo_colors::OwoColorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Config, Editor, Helper};
use std::borrow::Cow;
use std::path::PathBuf;
use tracing::warn;

const HISTORY_FILE: &str = ".modulus_history";
const MAX_HISTORY_SIZE: usize = 1000;
const SESSION_NAME: &str = "[repl]";

const KEYWORDS: &[&str] = &[
    "break",
    "case",
    "catch",
    "class",
    "const",
    "continue",
    "default",
    "delete",
    "do",
    "else",
    "extends",
    "finally",
    "for",
    "function",
    "if",
    "in",
    "instanceof",
    "let",
    "new",
    "of",
    "return",
    "super",
    "switch",
    "throw",
    "try",
    "typeof",
    "var",
    "void",
    "while",
];

const LITERALS: &[&str] = &[
    "true",
    "false",
    "null",
    "undefined",
    "NaN",
    "Infinity",
    "this",
];

const MODULE_BINDINGS: &[&str] = &["require", "module", "exports", "__filename", "__dirname"];

/// REPL commands that can be executed with a dot prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Exit,
    Clear,
    Version,
    Load,
    Cache,
    Reset,
}

impl ReplCommand {
    /// Parse a REPL command from input string
    pub fn parse(input: &str) -> Option<(Self, Option<&str>)> {
        let rest = input.trim().strip_prefix('.')?;
        let mut parts = rest.splitn(2, char::is_whitespace);
        let cmd = parts.next()?.to_lowercase();
        let arg = parts.next().map(str::trim).filter(|arg| !arg.is_empty());

        match cmd.as_str() {
            "help" | "h" | "?" => Some((ReplCommand::Help, arg)),
            "exit" | "quit" | "q" => Some((ReplCommand::Exit, arg)),
            "clear" | "cls" => Some((ReplCommand::Clear, arg)),
            "version" | "v" => Some((ReplCommand::Version, arg)),
            "load" | "l" => Some((ReplCommand::Load, arg)),
            "cache" => Some((ReplCommand::Cache, arg)),
            "reset" => Some((ReplCommand::Reset, arg)),
            _ => None,
        }
    }

    /// Get all available commands for help/completion
    pub fn all_commands() -> &'static [(&'static str, &'static str)] {
        &[
            (".help", "Show this help message"),
            (".exit", "Exit the REPL"),
            (".clear", "Clear the screen"),
            (".version", "Show version information"),
            (".load <module>", "Require a module and print its exports"),
            (".cache", "List the cached modules"),
            (".reset", "Clear the module cache and start a fresh scope"),
        ]
    }
}

/// Completion, hints, highlighting and multi-line validation
struct ModulusHelper {
    /// Fixed candidates: keywords, globals, commands
    keywords: Vec<String>,
    /// Names declared in the session so far
    names: Vec<String>,
}

impl ModulusHelper {
    fn new() -> Self {
        let commands = ReplCommand::all_commands()
            .iter()
            .filter_map(|(cmd, _)| cmd.split_whitespace().next());
        let keywords = KEYWORDS
            .iter()
            .chain(LITERALS)
            .chain(MODULE_BINDINGS)
            .copied()
            .chain(["console", "JSON", "Math", "Object", "Array", "Error"])
            .chain(commands)
            .map(String::from)
            .collect();

        Self {
            keywords,
            names: Vec::new(),
        }
    }

    fn candidates(&self) -> impl Iterator<Item = &String> {
        self.keywords.iter().chain(&self.names)
    }
}

/// Start of the word ending at `pos`
fn word_start(line: &str, pos: usize) -> usize {
    line[..pos]
        .rfind(|c: char| !c.is_alphanumeric() && c != '_' && c != '$' && c != '.')
        .map(|i| i + 1)
        .unwrap_or(0)
}

impl Completer for ModulusHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let word = &line[word_start(line, pos)..pos];
        if word.is_empty() {
            return Ok((pos, vec![]));
        }

        let mut matches: Vec<Pair> = self
            .candidates()
            .filter(|kw| kw.starts_with(word))
            .map(|kw| Pair {
                display: kw.clone(),
                replacement: kw[word.len()..].to_string(),
            })
            .collect();
        matches.dedup_by(|a, b| a.display == b.display);

        Ok((pos, matches))
    }
}

impl Hinter for ModulusHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if pos < line.len() {
            return None;
        }

        let word = &line[word_start(line, pos)..];
        if word.len() < 2 {
            return None;
        }

        self.candidates()
            .find(|kw| kw.starts_with(word) && kw.len() > word.len())
            .map(|kw| (&kw[word.len()..]).dimmed().to_string())
    }
}

impl Highlighter for ModulusHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let mut result = String::with_capacity(line.len() * 2);
        let mut current_word = String::new();

        for c in line.chars() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                current_word.push(c);
                continue;
            }
            if !current_word.is_empty() {
                result.push_str(&highlight_word(&current_word));
                current_word.clear();
            }
            let colored = match c {
                '(' | ')' | '[' | ']' | '{' | '}' => c.yellow().to_string(),
                '+' | '-' | '*' | '/' | '%' | '=' | '<' | '>' | '!' | '&' | '|' | '^' => {
                    c.cyan().to_string()
                }
                '"' | '\'' | '`' => c.green().to_string(),
                '.' if line.starts_with('.') => c.magenta().to_string(),
                _ => c.to_string(),
            };
            result.push_str(&colored);
        }

        if !current_word.is_empty() {
            result.push_str(&highlight_word(&current_word));
        }

        Cow::Owned(result)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

fn highlight_word(word: &str) -> String {
    if KEYWORDS.contains(&word) {
        word.magenta().bold().to_string()
    } else if LITERALS.contains(&word) {
        word.blue().to_string()
    } else if MODULE_BINDINGS.contains(&word) {
        word.cyan().to_string()
    } else if word.chars().all(|c| c.is_ascii_digit() || c == '.') {
        word.yellow().to_string()
    } else {
        word.to_string()
    }
}

impl Validator for ModulusHelper {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> rustyline::Result<ValidationResult> {
        let input = ctx.input();
        if !is_balanced(input) {
            return Ok(ValidationResult::Incomplete);
        }

        let trimmed = input.trim();
        if trimmed.starts_with('.') {
            return Ok(ValidationResult::Valid(None));
        }
        let continues = ['\\', '+', '-', '*', '/', '=', ',', '{', '(', '['];
        if trimmed.ends_with(continues) {
            return Ok(ValidationResult::Incomplete);
        }

        Ok(ValidationResult::Valid(None))
    }
}

/// Check if brackets, braces, and parentheses are balanced
fn is_balanced(input: &str) -> bool {
    let mut stack = Vec::new();
    let mut in_string = None;
    let mut escape_next = false;

    for c in input.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }

        if c == '\\' && in_string.is_some() {
            escape_next = true;
            continue;
        }

        match in_string {
            Some(quote) if c == quote => in_string = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' | '`' => in_string = Some(c),
                '(' => stack.push(')'),
                '[' => stack.push(']'),
                '{' => stack.push('}'),
                ')' | ']' | '}' => {
                    // A stray closer is left for the parser to report
                    if stack.pop() != Some(c) {
                        return true;
                    }
                }
                _ => {}
            },
        }
    }

    stack.is_empty() && in_string.is_none()
}

impl Helper for ModulusHelper {}

/// Result of executing a REPL command
enum CommandResult {
    Continue,
    Exit,
}

/// The interactive REPL
pub struct Repl {
    system: ModuleSystem,
    session: Session,
    editor: Editor<ModulusHelper, DefaultHistory>,
    history_path: PathBuf,
}

impl Repl {
    /// Create a REPL evaluating in a fresh session of `system`
    pub fn new(system: ModuleSystem) -> rustyline::Result<Self> {
        let config = Config::builder()
            .history_ignore_dups(true)?
            .history_ignore_space(true)
            .max_history_size(MAX_HISTORY_SIZE)?
            .auto_add_history(true)
            .build();

        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(ModulusHelper::new()));

        let history_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("modulus")
            .join(HISTORY_FILE);
        if let Some(parent) = history_path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "cannot create history directory");
            }
        }
        // Missing on first run
        let _ = editor.load_history(&history_path);

        let session = system.session(SESSION_NAME);
        Ok(Self {
            system,
            session,
            editor,
            history_path,
        })
    }

    /// Run the REPL main loop
    pub fn run(&mut self) -> rustyline::Result<()> {
        self.print_banner();

        loop {
            let prompt = format!("{} ", "modulus>".bright_green().bold());

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    if let Some((cmd, arg)) = ReplCommand::parse(trimmed) {
                        match self.execute_command(cmd, arg) {
                            CommandResult::Continue => continue,
                            CommandResult::Exit => break,
                        }
                    }

                    self.eval_and_print(trimmed);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C".dimmed());
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "^D".dimmed());
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        if let Err(e) = self.editor.save_history(&self.history_path) {
            warn!(path = %self.history_path.display(), error = %e, "cannot save history");
        }
        Ok(())
    }

    fn print_banner(&self) {
        println!();
        println!(
            "  {} {}{}",
            "modulus".bright_cyan().bold(),
            "v".dimmed(),
            VERSION.bright_yellow()
        );
        println!(
            "  {} {}",
            "Modules resolve from".dimmed(),
            self.system.base_dir().display().cyan()
        );
        println!(
            "  {} {} {}",
            "Type".dimmed(),
            ".help".cyan(),
            "for available commands".dimmed()
        );
        println!();
    }

    fn execute_command(&mut self, cmd: ReplCommand, arg: Option<&str>) -> CommandResult {
        match cmd {
            ReplCommand::Help => print_help(),
            ReplCommand::Exit => return CommandResult::Exit,
            ReplCommand::Clear => print!("\x1B[2J\x1B[H"),
            ReplCommand::Version => {
                println!("{}: {}", "modulus".bright_cyan().bold(), VERSION.yellow());
            }
            ReplCommand::Load => match arg {
                Some(specifier) => self.load_module(specifier),
                None => eprintln!(
                    "{}: {} {}",
                    "Error".red().bold(),
                    ".load".cyan(),
                    "requires a module path".dimmed()
                ),
            },
            ReplCommand::Cache => self.print_cache(),
            ReplCommand::Reset => {
                self.system.clear_cache();
                self.session = self.system.session(SESSION_NAME);
                self.refresh_names();
                println!("{}", "Module cache cleared, scope reset".dimmed());
            }
        }
        CommandResult::Continue
    }

    fn load_module(&mut self, specifier: &str) {
        match self.system.require_from(specifier, self.session.record()) {
            Ok(exports) => println!("{}", self.format_value(&exports)),
            Err(e) => print_error(&e),
        }
    }

    fn print_cache(&self) {
        let info = self.system.cache_info();
        println!("{} {}", "Cached modules:".white().bold(), info.count.yellow());
        for module in &info.modules {
            let loaded = self
                .system
                .module(module)
                .is_some_and(|record| record.is_loaded());
            let state = if loaded { "" } else { " (loading)" };
            println!("  {}{}", module.display().cyan(), state.dimmed());
        }
    }

    fn eval_and_print(&mut self, input: &str) {
        match self.session.evaluate(input) {
            Ok(value) => println!("{}", self.format_value(&value)),
            Err(e) => print_error(&e),
        }
        self.refresh_names();
    }

    fn refresh_names(&mut self) {
        let names = self
            .session
            .visible_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        if let Some(helper) = self.editor.helper_mut() {
            helper.names = names;
        }
    }

    /// Format a value for display with syntax coloring
    fn format_value(&self, value: &Value) -> String {
        let text = self.system.engine().inspect(value);
        match value {
            Value::Undefined => text.blue().dimmed().to_string(),
            Value::Null => text.blue().to_string(),
            Value::Boolean(_) | Value::Number(_) => text.yellow().to_string(),
            Value::String(s) => format!("'{}'", s).green().to_string(),
            Value::Object(object) if object.is_callable() => text.magenta().to_string(),
            Value::Object(_) => text.cyan().to_string(),
        }
    }
}

fn print_help() {
    println!();
    println!("{}", "REPL Commands:".white().bold());
    println!();
    for (cmd, desc) in ReplCommand::all_commands() {
        println!("  {:16} {}", cmd.cyan(), desc.dimmed());
    }
    println!();
    println!("{}", "Module bindings:".white().bold());
    println!();
    println!("  {}", MODULE_BINDINGS.join(", ").cyan());
    println!();
    println!("{}", "Keyboard Shortcuts:".white().bold());
    println!();
    println!("  {:16} {}", "Ctrl+C".yellow(), "Cancel current input".dimmed());
    println!("  {:16} {}", "Ctrl+D".yellow(), "Exit REPL".dimmed());
    println!("  {:16} {}", "Tab".yellow(), "Autocomplete".dimmed());
    println!();
}

/// Print an error with its name highlighted
fn print_error(error: &LoadError) {
    let text = error.to_string();
    match text.split_once(':') {
        Some((name, message)) if !name.contains(char::is_whitespace) => {
            eprintln!("{}:{}", name.red().bold(), message);
        }
        _ => eprintln!("{}", text.red()),
    }
}
