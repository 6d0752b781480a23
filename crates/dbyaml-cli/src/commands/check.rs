use std::path::PathBuf;

use bpaf::Bpaf;
use dbyaml::Status;

use super::{Tone, read, resolve_file, status_line, stdout_is_terminal};

#[derive(Debug, Clone, Bpaf)]
#[bpaf(generate(check_args))]
pub struct CheckArgs {
    /// Path to database.yml (default: from dbyaml.toml, else config/database.yml)
    #[bpaf(short('f'), long("file"), argument("PATH"))]
    pub file: Option<PathBuf>,

    /// Databases to check (default: `databases` from dbyaml.toml)
    #[bpaf(positional("NAME"))]
    pub names: Vec<String>,
}

pub fn report(status: &Status, file: &str, color: bool) -> Vec<String> {
    let name = &status.name;
    let mut lines = Vec::new();
    if status.defined {
        lines.push(status_line("defined", &format!("{name} ({file})"), Tone::Done, color));
    } else {
        lines.push(status_line("undefined", &format!("{name} ({file})"), Tone::Missing, color));
    }
    for (env, wired) in &status.environments {
        let message = format!("{name} -> {env} ({file})");
        if *wired {
            lines.push(status_line("wired", &message, Tone::Done, color));
        } else {
            lines.push(status_line("missing", &message, Tone::Missing, color));
        }
    }
    lines
}

/// Returns `true` if any database is not fully set up.
pub fn run(args: &CheckArgs) -> anyhow::Result<bool> {
    let config = dbyaml_config::load()?;
    let path = resolve_file(args.file.as_deref(), &config)?;
    let names = if args.names.is_empty() {
        &config.databases
    } else {
        &args.names
    };
    if names.is_empty() {
        anyhow::bail!("no databases named, and dbyaml.toml sets no `databases`");
    }

    let source = read(&path)?;
    let file = path.display().to_string();
    let color = stdout_is_terminal();

    let mut incomplete = false;
    for name in names {
        let status = dbyaml::check_database(&source, name).map_err(|e| e.in_file(&file))?;
        incomplete |= !status.is_complete();
        for line in report(&status, &file, color) {
            println!("{line}");
        }
    }
    Ok(incomplete)
}
