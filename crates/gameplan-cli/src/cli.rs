//! Command-line surface

use clap::{value_parser, Arg, ArgAction, Command};
use gameplan_core::RunConfig;
use std::path::{Path, PathBuf};

/// Alternative separator for package managers that swallow `--`
pub(crate) const ALT_SEPARATOR: &str = "---";

pub(crate) fn command() -> Command {
    Command::new("gameplan")
        .version(gameplan_core::VERSION)
        .about("Generate a project from a gameplan repository")
        .override_usage("gameplan <repo> <name> [--prompt] [-- <gameplan-options>...]")
        .arg(
            Arg::new("repo")
                .required(true)
                .help("Gameplan repository, anything git can clone"),
        )
        .arg(
            Arg::new("name")
                .required(true)
                .help("Folder to generate the project into"),
        )
        .arg(
            Arg::new("prompt")
                .short('p')
                .long("prompt")
                .action(ArgAction::SetTrue)
                .help("Ask for every gameplan option interactively"),
        )
        .arg(
            Arg::new("tmp-dir")
                .long("tmp-dir")
                .env("GAMEPLAN_TMPDIR")
                .value_parser(value_parser!(PathBuf))
                .help("Root for the temporary clone (default: OS temp dir)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log debug output to stderr"),
        )
        .arg(
            Arg::new("gameplan-args")
                .num_args(0..)
                .last(true)
                .allow_hyphen_values(true)
                .help("Options passed to the gameplan"),
        )
}

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Invocation {
    pub(crate) repo: String,
    pub(crate) name: String,
    pub(crate) prompt: bool,
    pub(crate) tmp_dir: Option<PathBuf>,
    pub(crate) verbose: bool,
    pub(crate) args: Vec<String>,
}

impl Invocation {
    /// Parse a full argv (binary name first)
    pub(crate) fn parse_from<I>(argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = String>,
    {
        let (argv, extra) = split_alt_separator(argv.into_iter().collect());
        let matches = command().try_get_matches_from(argv)?;

        let mut args: Vec<String> = matches
            .get_many::<String>("gameplan-args")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        args.extend(extra);

        Ok(Self {
            repo: matches.get_one::<String>("repo").cloned().unwrap_or_default(),
            name: matches.get_one::<String>("name").cloned().unwrap_or_default(),
            prompt: matches.get_flag("prompt"),
            tmp_dir: matches.get_one::<PathBuf>("tmp-dir").cloned(),
            verbose: matches.get_flag("verbose"),
            args,
        })
    }

    /// Run configuration for a destination under `cwd`
    pub(crate) fn into_config(self, cwd: &Path) -> RunConfig {
        let mut config = RunConfig::new(self.repo, cwd.join(&self.name))
            .with_prompt(self.prompt)
            .with_args(self.args);
        if let Some(tmp_dir) = self.tmp_dir {
            config = config.with_temporary_directory(tmp_dir);
        }
        config
    }
}

/// Split off everything after the first `---`
fn split_alt_separator(mut argv: Vec<String>) -> (Vec<String>, Vec<String>) {
    match argv.iter().position(|arg| arg == ALT_SEPARATOR) {
        Some(index) => {
            let extra = argv.split_off(index + 1);
            argv.pop();
            (argv, extra)
        }
        None => (argv, Vec::new()),
    }
}
