use std::path::PathBuf;

use anyhow::Context;
use bpaf::Bpaf;
use dbyaml::{Addition, DatabaseTemplate, Definition};

use super::{Tone, read, resolve_file, status_line, stdout_is_terminal};
use crate::diff;

#[derive(Debug, Clone, Bpaf)]
#[bpaf(generate(add_args))]
pub struct AddArgs {
    /// Path to database.yml (default: from dbyaml.toml, else config/database.yml)
    #[bpaf(short('f'), long("file"), argument("PATH"))]
    pub file: Option<PathBuf>,

    /// Print the changes as a diff instead of writing the file
    #[bpaf(long("dry-run"), switch)]
    pub dry_run: bool,

    /// Databases to add, in order (default: `databases` from dbyaml.toml)
    #[bpaf(positional("NAME"))]
    pub names: Vec<String>,
}

/// Every addition made, and the resulting text.
#[derive(Debug)]
pub struct Outcome {
    pub content: String,
    pub additions: Vec<Addition>,
}

/// Add each database in turn, feeding each result into the next.
///
/// # Errors
///
/// Stops at the first database that cannot be added.
pub fn apply(source: &str, names: &[String], template: &DatabaseTemplate) -> Result<Outcome, dbyaml::Error> {
    let mut content = source.to_string();
    let mut additions = Vec::with_capacity(names.len());
    for name in names {
        let addition = dbyaml::add_database(&content, name, template)?;
        content.clone_from(&addition.content);
        additions.push(addition);
    }
    Ok(Outcome { content, additions })
}

/// Status lines for one addition.
pub fn report(addition: &Addition, file: &str, verbose: bool, color: bool) -> Vec<String> {
    let name = &addition.name;
    let mut lines = Vec::new();

    match addition.definition {
        Definition::Inserted => {
            lines.push(status_line("def_db", &format!("{name} ({file})"), Tone::Done, color));
        }
        Definition::AlreadyPresent if verbose => {
            lines.push(status_line(
                "identical",
                &format!("{name} ({file})"),
                Tone::Unchanged,
                color,
            ));
        }
        Definition::AlreadyPresent => {}
    }

    for env in &addition.wired {
        lines.push(status_line(
            "add_db",
            &format!("{name} -> {env} ({file})"),
            Tone::Done,
            color,
        ));
    }
    if verbose {
        for env in &addition.skipped {
            lines.push(status_line(
                "identical",
                &format!("{name} -> {env} ({file})"),
                Tone::Unchanged,
                color,
            ));
        }
    }
    for env in &addition.defined {
        lines.push(status_line(
            "skip",
            &format!("{name} -> {env} ({file}): `{env}` configures `{name}` itself"),
            Tone::Attention,
            color,
        ));
    }
    lines
}

pub fn run(args: &AddArgs, verbose: bool) -> anyhow::Result<()> {
    let config = dbyaml_config::load()?;
    let path = resolve_file(args.file.as_deref(), &config)?;
    tracing::debug!(path = %path.display(), "resolved database file");
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
    let outcome = apply(&source, names, &config.template()).map_err(|e| e.in_file(&file))?;

    let color = stdout_is_terminal();
    for addition in &outcome.additions {
        for line in report(addition, &file, verbose, color) {
            println!("{line}");
        }
    }

    if outcome.content == source {
        return Ok(());
    }
    if args.dry_run {
        print!("{}", diff::render(&file, &source, &outcome.content, color));
    } else {
        std::fs::write(&path, &outcome.content)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    const SOURCE: &str = "default: &default\n  adapter: sqlite3\n\ndevelopment:\n  <<: *default\n\ntest:\n  <<: *default\n";

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn applies_databases_in_order() -> anyhow::Result<()> {
        let outcome = apply(SOURCE, &names(&["queue", "cache"]), &DatabaseTemplate::default())?;
        assert_eq!(outcome.additions.len(), 2);
        assert!(outcome.content.contains("development:\n  primary: *default\n  queue: *queue\n  cache: *cache\n"));
        // each definition lands right after the default block
        let cache = outcome.content.find("cache: &cache").expect("cache defined");
        let queue = outcome.content.find("queue: &queue").expect("queue defined");
        assert!(cache < queue);
        Ok(())
    }

    #[test]
    fn repeated_name_is_harmless() -> anyhow::Result<()> {
        let once = apply(SOURCE, &names(&["cache"]), &DatabaseTemplate::default())?;
        let twice = apply(SOURCE, &names(&["cache", "cache"]), &DatabaseTemplate::default())?;
        assert_eq!(once.content, twice.content);
        Ok(())
    }

    #[test]
    fn reports_status_lines() -> anyhow::Result<()> {
        let outcome = apply(SOURCE, &names(&["cache"]), &DatabaseTemplate::default())?;
        assert_eq!(
            report(&outcome.additions[0], "config/database.yml", false, false),
            [
                "      def_db  cache (config/database.yml)",
                "      add_db  cache -> development (config/database.yml)",
                "      add_db  cache -> test (config/database.yml)",
            ]
        );
        Ok(())
    }

    #[test]
    fn verbose_reports_unchanged_environments() -> anyhow::Result<()> {
        let first = apply(SOURCE, &names(&["cache"]), &DatabaseTemplate::default())?;
        let second = apply(&first.content, &names(&["cache"]), &DatabaseTemplate::default())?;
        let addition = &second.additions[0];
        assert!(report(addition, "db.yml", false, false).is_empty());
        assert_eq!(
            report(addition, "db.yml", true, false),
            [
                "   identical  cache (db.yml)",
                "   identical  cache -> development (db.yml)",
                "   identical  cache -> test (db.yml)",
            ]
        );
        Ok(())
    }

    #[test]
    fn run_writes_file() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("database.yml");
        fs::write(&path, SOURCE)?;

        let args = AddArgs {
            file: Some(path.clone()),
            dry_run: false,
            names: names(&["cable"]),
        };
        run(&args, false)?;
        assert!(fs::read_to_string(&path)?.contains("  cable: *cable\n"));
        Ok(())
    }

    #[test]
    fn dry_run_leaves_file_alone() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("database.yml");
        fs::write(&path, SOURCE)?;

        let args = AddArgs {
            file: Some(path.clone()),
            dry_run: true,
            names: names(&["cable"]),
        };
        run(&args, false)?;
        assert_eq!(fs::read_to_string(&path)?, SOURCE);
        Ok(())
    }

    #[test]
    fn failed_addition_leaves_file_alone() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("database.yml");
        fs::write(&path, SOURCE)?;

        let args = AddArgs {
            file: Some(path.clone()),
            dry_run: false,
            names: names(&["cable", "not valid"]),
        };
        let err = run(&args, false).expect_err("invalid name");
        assert!(err.downcast_ref::<dbyaml::Error>().is_some());
        assert_eq!(fs::read_to_string(&path)?, SOURCE);
        Ok(())
    }
}
