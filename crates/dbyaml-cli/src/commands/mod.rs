pub mod add;
pub mod check;
pub mod definition;

use std::path::{Path, PathBuf};

use ansi_term_styles::{BLUE, GREEN, RED, RESET, YELLOW};
use anyhow::Context;
use dbyaml_config::Config;

/// Colour of a status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Done,
    Unchanged,
    Attention,
    Missing,
}

impl Tone {
    fn code(self) -> &'static str {
        match self {
            Tone::Done => GREEN,
            Tone::Unchanged => BLUE,
            Tone::Attention => YELLOW,
            Tone::Missing => RED,
        }
    }
}

/// A status line: the status word right-aligned in twelve columns, then the
/// message.
pub fn status_line(status: &str, message: &str, tone: Tone, color: bool) -> String {
    if color {
        format!("{}{status:>12}{}  {message}", tone.code(), RESET)
    } else {
        format!("{status:>12}  {message}")
    }
}

pub fn stdout_is_terminal() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stdout())
}

/// The `database.yml` to operate on: `--file` if given, otherwise the one
/// named by `dbyaml.toml`, otherwise `config/database.yml` in the working
/// directory.
pub fn resolve_file(file: Option<&Path>, config: &Config) -> anyhow::Result<PathBuf> {
    if let Some(file) = file {
        return Ok(file.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    Ok(config.database_file(&cwd))
}

pub fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_right_aligned() {
        assert_eq!(
            status_line("def_db", "cache (config/database.yml)", Tone::Done, false),
            "      def_db  cache (config/database.yml)"
        );
    }

    #[test]
    fn colored_status_resets() {
        let line = status_line("add_db", "x", Tone::Done, true);
        assert!(line.starts_with(GREEN));
        assert!(line.ends_with("  x"));
    }

    #[test]
    fn explicit_file_wins() -> anyhow::Result<()> {
        let config = Config::default();
        assert_eq!(
            resolve_file(Some(Path::new("other.yml")), &config)?,
            PathBuf::from("other.yml")
        );
        Ok(())
    }
}
