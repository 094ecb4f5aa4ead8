//! CLI logic for `imperc`, the imperative language front end.
//!
//! Two modes are supported:
//!
//! - **Lexer only** (`--lex-only`): print every token and list the invalid
//!   ones as `path(line,col): Invalid token: '<lexeme>'` on stderr.
//! - **Compile** (default): check the whole file for lexical errors first,
//!   reporting all of them, then lex it again from scratch and parse it.
//!   With `--debug` the token list and a dump of the syntax tree are printed.

pub mod error_adapter;

mod args;
mod config;
mod error;

pub use args::Args;
pub use config::{AppConfig, ConfigError, DebugConfig, DiagnosticsConfig, load_config};
pub use error::CompileError;

use std::{
    fs,
    io::{self, Write},
};

use log::{debug, info, warn};

use imperative_parser::{Lexer, ParseError, ast, check_lexical, parse, tokens::Token};

/// Run the CLI with the given arguments, writing to stdout and stderr.
///
/// # Errors
///
/// Returns `CompileError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Invalid tokens (in either mode)
/// - Syntax errors
pub fn run(args: &Args) -> Result<(), CompileError> {
    let stdout = io::stdout();
    let stderr = io::stderr();
    run_with_output(args, &mut stdout.lock(), &mut stderr.lock())
}

/// Like [`run`], but writes the listing and reports to the given streams.
///
/// # Errors
///
/// See [`run`].
pub fn run_with_output(
    args: &Args,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CompileError> {
    info!(
        input_path = args.input,
        lex_only = args.lex_only;
        "Processing source"
    );

    let app_config = load_config(args.config.as_ref())?;
    let source = fs::read_to_string(&args.input)?;

    if args.lex_only {
        list_tokens(&args.input, &source, out, err)
    } else {
        compile(args, &app_config, &source, out)
    }
}

/// Print every token; report invalid ones afterwards.
fn list_tokens(
    path: &str,
    source: &str,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CompileError> {
    let mut invalid = Vec::new();

    for token in Lexer::new(source) {
        if token.token == Token::EndOfFile {
            break;
        }
        writeln!(out, "{token}")?;
        if matches!(token.token, Token::Invalid(_)) {
            invalid.push(token);
        }
    }

    for token in &invalid {
        writeln!(
            err,
            "{path}({},{}): Invalid token: '{}'",
            token.span.line(),
            token.span.start(),
            token.lexeme
        )?;
    }

    if invalid.is_empty() {
        info!(path; "No lexical errors");
        Ok(())
    } else {
        Err(CompileError::InvalidTokens {
            count: invalid.len(),
        })
    }
}

fn compile(
    args: &Args,
    config: &AppConfig,
    source: &str,
    out: &mut dyn Write,
) -> Result<(), CompileError> {
    if let Err(err) = check_lexical(source) {
        let err = cap_diagnostics(err, config.diagnostics.max_lexical_errors);
        return Err(CompileError::new_lexical_error(err, source));
    }

    if args.debug || config.debug.tokens {
        writeln!(out, "Tokens:")?;
        for token in Lexer::new(source) {
            writeln!(out, "  {token}")?;
        }
    }

    let program = parse(source).map_err(|err| CompileError::new_parse_error(err, source))?;
    debug!(declarations = program.declarations.len(); "Syntax tree built");

    if args.debug || config.debug.ast {
        writeln!(out, "Syntax tree:")?;
        write!(out, "{}", ast::dump(&program))?;
    }

    writeln!(out, "Compilation completed successfully.")?;
    writeln!(out, "{} top-level declaration(s).", program.declarations.len())?;
    Ok(())
}

/// Keep at most `max` diagnostics; `0` keeps all of them.
fn cap_diagnostics(err: ParseError, max: usize) -> ParseError {
    let total = err.diagnostics().len();
    if max == 0 || total <= max {
        return err;
    }

    warn!(total, shown = max; "Too many lexical errors, truncating report");
    ParseError::new(err.diagnostics()[..max].to_vec())
}
