#![doc = include_str!("../README.md")]

mod commands;
mod diff;
mod options;

use std::process::ExitCode;

use bpaf::Bpaf;

use commands::add::{AddArgs, add_args};
use commands::check::{CheckArgs, check_args};
use commands::definition::{DefinitionArgs, definition_args};
use options::{GlobalOptions, global_options};

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version, fallback_to_usage, generate(cli))]
/// Add databases to a Rails config/database.yml
struct Cli {
    #[bpaf(external(commands))]
    command: Commands,
}

#[derive(Debug, Clone, Bpaf)]
enum Commands {
    #[bpaf(command("add"))]
    /// Define databases and reference them from every environment
    Add(
        #[bpaf(external(global_options), hide_usage)] GlobalOptions,
        #[bpaf(external(add_args))] AddArgs,
    ),

    #[bpaf(command("check"))]
    /// Check that databases are defined and referenced from every environment
    Check(
        #[bpaf(external(global_options), hide_usage)] GlobalOptions,
        #[bpaf(external(check_args))] CheckArgs,
    ),

    #[bpaf(command("definition"))]
    /// Print the block `add` would insert for a database
    Definition(
        #[bpaf(external(global_options), hide_usage)] GlobalOptions,
        #[bpaf(external(definition_args))] DefinitionArgs,
    ),

    #[bpaf(command("version"))]
    /// Print version information
    Version,
}

fn main() -> ExitCode {
    setup_miette();
    let cli = cli().run();

    let result = match cli.command {
        Commands::Add(global, args) => {
            global.init_tracing();
            commands::add::run(&args, global.verbose).map(|()| false)
        }
        Commands::Check(global, args) => {
            global.init_tracing();
            commands::check::run(&args)
        }
        Commands::Definition(global, args) => {
            global.init_tracing();
            commands::definition::run(&args).map(|()| false)
        }
        Commands::Version => {
            println!("dbyaml {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
    };

    match result {
        Ok(had_problems) => {
            if had_problems {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            match e.downcast::<dbyaml::Error>() {
                Ok(diagnostic) => eprintln!("{:?}", miette::Report::new(diagnostic)),
                Err(e) => eprintln!("Error: {e:#}"),
            }
            ExitCode::from(2)
        }
    }
}

fn setup_miette() {
    let theme = if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        miette::GraphicalTheme::unicode()
    } else {
        miette::GraphicalTheme::unicode_nocolor()
    };
    miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .context_lines(2)
                .graphical_theme(theme.clone())
                .build(),
        )
    }))
    .ok();
}
