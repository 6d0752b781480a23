use bpaf::Bpaf;
use tracing_subscriber::prelude::*;

/// Options shared by every command
#[derive(Debug, Clone, Bpaf)]
#[bpaf(generate(global_options))]
pub struct GlobalOptions {
    /// Also report environments that were left unchanged, and log progress.
    #[bpaf(short('v'), long("verbose"), switch, fallback(false))]
    pub verbose: bool,

    /// Log at this level and above: trace, debug, info, warn or error.
    #[bpaf(long("log-level"), argument("LEVEL"))]
    pub log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    const ALL: [Self; 5] = [Self::Trace, Self::Debug, Self::Info, Self::Warn, Self::Error];

    fn name(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl core::str::FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown log level '{s}'"))
    }
}

impl core::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl GlobalOptions {
    /// The filter directive implied by the flags, if logging is on.
    fn directive(&self) -> Option<String> {
        self.log_level
            .or(self.verbose.then_some(LogLevel::Info))
            .map(|level| level.to_string())
    }

    /// Install the tracing subscriber. `DBYAML_LOG` takes precedence over the
    /// flags and also turns on span entry/exit.
    pub fn init_tracing(&self) {
        let (filter, explicit) = match tracing_subscriber::EnvFilter::try_from_env("DBYAML_LOG") {
            Ok(f) => (f, true),
            Err(_) => match self.directive() {
                Some(directive) => (tracing_subscriber::EnvFilter::new(directive), false),
                None => return,
            },
        };
        tracing_subscriber::registry()
            .with(
                tracing_tree::HierarchicalLayer::new(2)
                    .with_targets(true)
                    .with_bracketed_fields(true)
                    .with_indent_lines(true)
                    .with_verbose_exit(explicit)
                    .with_verbose_entry(explicit)
                    .with_timer(tracing_tree::time::Uptime::default())
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .init();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bpaf::Parser;

    fn opts() -> bpaf::OptionParser<GlobalOptions> {
        global_options().to_options()
    }

    #[test]
    fn defaults() {
        let parsed = opts().run_inner(&[]).unwrap();
        assert!(!parsed.verbose);
        assert_eq!(parsed.log_level, None);
        assert_eq!(parsed.directive(), None);
    }

    #[test]
    fn verbose_logs_info() {
        let parsed = opts().run_inner(&["-v"]).unwrap();
        assert!(parsed.verbose);
        assert_eq!(parsed.directive().as_deref(), Some("info"));
    }

    #[test]
    fn log_level_wins_over_verbose() {
        let parsed = opts().run_inner(&["--verbose", "--log-level", "debug"]).unwrap();
        assert_eq!(parsed.log_level, Some(LogLevel::Debug));
        assert_eq!(parsed.directive().as_deref(), Some("debug"));
    }

    #[test]
    fn rejects_unknown_log_level() {
        assert!(opts().run_inner(&["--log-level", "loud"]).is_err());
    }

    #[test]
    fn log_level_names_are_case_insensitive() {
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        for level in LogLevel::ALL {
            assert_eq!(level.to_string().parse::<LogLevel>().unwrap(), level);
        }
    }
}
