//! Line-oriented command scripts.
//!
//! One command per line; blank lines and lines starting with `#` are skipped:
//!
//! ```text
//! set A1 5
//! set B1 =A1*2
//! get B1
//! clear A1
//! values
//! ```

use std::io::{BufRead, Write};

use tabula_core::{Position, Sheet, SheetError};
use tracing::debug;

use crate::error::{Result, ScriptError};

/// A parsed script command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Set a cell from input text (may be empty, may contain spaces).
    Set(Position, String),
    Clear(Position),
    /// Print the evaluated value of a cell.
    Get(Position),
    /// Print the text of a cell.
    Text(Position),
    /// Print the printable area as `rows cols`.
    Size,
    Values,
    Texts,
}

/// Parse one script line. Returns `Ok(None)` for blank lines and comments.
pub fn parse_command(line: &str) -> std::result::Result<Option<Command>, String> {
    let line = line.trim_start().trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (name, rest) = line.split_once(' ').unwrap_or((line, ""));
    let command = match name.to_ascii_lowercase().as_str() {
        "set" => {
            let rest = rest.trim_start();
            let (cell, text) = rest.split_once(' ').unwrap_or((rest, ""));
            Command::Set(parse_position(cell)?, text.to_string())
        }
        "clear" => Command::Clear(single_position(name, rest)?),
        "get" => Command::Get(single_position(name, rest)?),
        "text" => Command::Text(single_position(name, rest)?),
        "size" => no_arguments(name, rest, Command::Size)?,
        "values" => no_arguments(name, rest, Command::Values)?,
        "texts" => no_arguments(name, rest, Command::Texts)?,
        other => return Err(format!("Unknown command: {}", other)),
    };
    Ok(Some(command))
}

fn parse_position(name: &str) -> std::result::Result<Position, String> {
    if name.is_empty() {
        return Err("Missing cell reference".to_string());
    }
    match Position::from_a1(name) {
        Some(pos) if pos.is_valid() => Ok(pos),
        Some(_) => Err(format!("Cell reference out of range: {}", name)),
        None => Err(format!("Invalid cell reference: {}", name)),
    }
}

fn single_position(command: &str, rest: &str) -> std::result::Result<Position, String> {
    let mut args = rest.split_whitespace();
    let pos = parse_position(args.next().unwrap_or(""))?;
    if args.next().is_some() {
        return Err(format!("{} takes exactly one cell reference", command));
    }
    Ok(pos)
}

fn no_arguments(
    command: &str,
    rest: &str,
    parsed: Command,
) -> std::result::Result<Command, String> {
    if rest.trim().is_empty() {
        Ok(parsed)
    } else {
        Err(format!("{} takes no arguments", command))
    }
}

/// Apply one command to `sheet`, writing any output to `out`.
pub fn execute<W: Write>(
    sheet: &mut Sheet,
    command: &Command,
    out: &mut W,
) -> std::result::Result<(), SheetError> {
    match command {
        Command::Set(pos, text) => sheet.set_cell(*pos, text)?,
        Command::Clear(pos) => sheet.clear_cell(*pos)?,
        Command::Get(pos) => {
            let value = sheet.cell(*pos)?.map(|cell| cell.value().to_string());
            writeln!(out, "{}", value.unwrap_or_default())?;
        }
        Command::Text(pos) => {
            let text = sheet.cell(*pos)?.map(|cell| cell.text());
            writeln!(out, "{}", text.unwrap_or_default())?;
        }
        Command::Size => {
            let size = sheet.printable_size();
            writeln!(out, "{} {}", size.rows, size.cols)?;
        }
        Command::Values => sheet.print_values(out)?,
        Command::Texts => sheet.print_texts(out)?,
    }
    Ok(())
}

/// Run every line of `input` against `sheet`.
///
/// A line that fails does not stop the script; its error is collected and
/// returned. Only I/O errors on `input` or `out` abort the run.
pub fn run_script<R, W>(sheet: &mut Sheet, input: R, out: &mut W) -> Result<Vec<ScriptError>>
where
    R: BufRead,
    W: Write,
{
    let mut errors = Vec::new();

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let number = index + 1;

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                errors.push(ScriptError::Parse { line: number, message });
                continue;
            }
        };

        match execute(sheet, &command, out) {
            Ok(()) => {}
            Err(SheetError::Io(e)) => return Err(ScriptError::Io(e)),
            Err(source) => {
                debug!(line = number, error = %source, "command failed");
                errors.push(ScriptError::Sheet { line: number, source });
            }
        }
    }

    Ok(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn a1(name: &str) -> Position {
        Position::from_a1(name).unwrap()
    }

    fn run(script: &str) -> (String, Vec<String>) {
        let mut sheet = Sheet::new();
        let mut out = Vec::new();
        let errors = run_script(&mut sheet, script.as_bytes(), &mut out).unwrap();
        (
            String::from_utf8(out).unwrap(),
            errors.iter().map(|e| e.to_string()).collect(),
        )
    }

    #[test]
    fn test_parse_set_keeps_spaces_in_text() {
        assert_eq!(
            parse_command("set A1 hello  world"),
            Ok(Some(Command::Set(a1("A1"), "hello  world".to_string())))
        );
        assert_eq!(
            parse_command("set B2 = 1 + 2"),
            Ok(Some(Command::Set(a1("B2"), "= 1 + 2".to_string())))
        );
        assert_eq!(
            parse_command("set C3"),
            Ok(Some(Command::Set(a1("C3"), String::new())))
        );
    }

    #[test]
    fn test_parse_skips_blank_and_comment_lines() {
        assert_eq!(parse_command(""), Ok(None));
        assert_eq!(parse_command("   \r"), Ok(None));
        assert_eq!(parse_command("# set A1 1"), Ok(None));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_command("frobnicate A1").unwrap_err().contains("Unknown command"));
        assert!(parse_command("get").unwrap_err().contains("Missing cell reference"));
        assert!(parse_command("get 1A").unwrap_err().contains("Invalid cell reference"));
        assert!(parse_command("get A1 B1").unwrap_err().contains("exactly one"));
        assert!(parse_command("size 3").unwrap_err().contains("no arguments"));
        assert!(parse_command("get ZZZZZ1").unwrap_err().contains("out of range"));
    }

    #[test]
    fn test_run_script_outputs() {
        let (out, errors) = run(
            "set A1 5\n\
             set B1 =A1*2\n\
             get B1\n\
             set A1 3\n\
             get B1\n\
             text B1\n\
             get C9\n\
             size\n\
             values\n",
        );
        assert!(errors.is_empty());
        assert_eq!(out, "10\n6\n=A1*2\n\n1 2\n3\t6\n");
    }

    #[test]
    fn test_run_script_collects_errors_and_continues() {
        let (out, errors) = run(
            "set A1 =B1\n\
             set B1 =A1\n\
             set C1 =1+\n\
             bogus\n\
             set B1 4\n\
             get A1\n",
        );
        assert_eq!(out, "4\n");
        assert_eq!(
            errors,
            vec![
                "line 2: Circular dependency detected at B1".to_string(),
                "line 3: Formula syntax error: Unexpected end of formula at offset 2".to_string(),
                "line 4: Unknown command: bogus".to_string(),
            ]
        );
    }
}
