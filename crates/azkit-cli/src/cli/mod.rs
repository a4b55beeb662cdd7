//! Argument definitions (clap derive).
//!
//! Names, aliases, help text and value enums live here; the handlers in
//! `crate::commands` turn them into service requests.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

#[derive(Debug, Parser)]
#[command(
    name     = "azkit",
    bin_name = "azkit",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Azure Functions build goals for Java projects",
    long_about = "azkit scaffolds Java Azure Functions from templates and packages \
                  built projects into a deployable staging directory.",
    after_help = "EXAMPLES:\n\
        \x20 azkit add --template HttpTrigger --function-name hello --package-name com.example\n\
        \x20 azkit package --app-name my-func-app --final-name my-app-1.0\n\
        \x20 azkit list\n\
        \x20 azkit completions bash > /usr/share/bash-completion/completions/azkit",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new function class from a template.
    #[command(
        visible_alias = "a",
        after_help = "EXAMPLES:\n\
            \x20 azkit add                                   # interactive\n\
            \x20 azkit add --batch -t TimerTrigger -n Nightly -p com.example -D schedule='0 0 * * * *'"
    )]
    Add(AddArgs),

    /// Stage a built project for deployment.
    #[command(
        visible_alias = "p",
        after_help = "EXAMPLES:\n\
            \x20 azkit package --app-name my-func-app\n\
            \x20 azkit package --app-name my-func-app --final-name my-app-1.0 --skip-install-extensions"
    )]
    Package(PackageArgs),

    /// List the function templates the project can use.
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Read and write configuration values.
    #[command(
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 azkit config get defaults.package_name\n\
            \x20 azkit config set package.skip_install_extensions true\n\
            \x20 azkit config list"
    )]
    Config(ConfigCommands),
}

#[derive(Debug, Args)]
pub struct AddArgs {
    #[arg(
        short = 'b',
        long = "base-dir",
        value_name = "DIR",
        default_value = ".",
        help = "Project root"
    )]
    pub base_dir: PathBuf,

    #[arg(
        long = "source-root",
        value_name = "DIR",
        help = "Java source root (default: <base-dir>/src/main/java)"
    )]
    pub source_root: Option<PathBuf>,

    #[arg(short = 't', long = "template", value_name = "NAME", help = "Function template")]
    pub template: Option<String>,

    #[arg(
        short = 'n',
        long = "function-name",
        value_name = "NAME",
        help = "Name of the function and its class"
    )]
    pub function_name: Option<String>,

    #[arg(
        short = 'p',
        long = "package-name",
        value_name = "PACKAGE",
        help = "Java package of the new class"
    )]
    pub package_name: Option<String>,

    /// Trigger-specific values, e.g. `-D authLevel=FUNCTION`.
    #[arg(
        short = 'D',
        long = "property",
        value_name = "KEY=VALUE",
        value_parser = parse_property,
        help = "Trigger-specific parameter (repeatable)"
    )]
    pub properties: Vec<(String, String)>,

    /// Never prompt; invalid required values fail.
    #[arg(long = "batch", help = "Run without prompting")]
    pub batch: bool,
}

#[derive(Debug, Args)]
pub struct PackageArgs {
    #[arg(
        short = 'b',
        long = "base-dir",
        value_name = "DIR",
        default_value = ".",
        help = "Project root"
    )]
    pub base_dir: PathBuf,

    #[arg(
        short = 'a',
        long = "app-name",
        value_name = "NAME",
        help = "Function app name (default: project directory name)"
    )]
    pub app_name: Option<String>,

    #[arg(
        short = 'f',
        long = "final-name",
        value_name = "NAME",
        help = "Built jar name without extension"
    )]
    pub final_name: Option<String>,

    #[arg(
        long = "staging-dir",
        value_name = "DIR",
        help = "Staging directory (default: target/azure-functions/<app-name>)"
    )]
    pub staging_dir: Option<PathBuf>,

    #[arg(
        long = "source-dir",
        value_name = "DIR",
        help = "Sources scanned for functions (default: src/main/java)"
    )]
    pub source_dir: Option<PathBuf>,

    #[arg(
        long = "skip-install-extensions",
        help = "Never run `func extensions install`"
    )]
    pub skip_install_extensions: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(
        short = 'b',
        long = "base-dir",
        value_name = "DIR",
        default_value = ".",
        help = "Project whose host.json filters the templates"
    )]
    pub base_dir: PathBuf,

    #[arg(long = "format", value_enum, default_value = "table", help = "Listing format")]
    pub format: ListFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListFormat {
    Table,
    /// One name per line.
    List,
    Json,
    Csv,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print one value, e.g. `defaults.package_name`.
    Get { key: String },
    /// Persist a value in the configuration file.
    Set { key: String, value: String },
    /// Print the effective configuration.
    List,
    /// Print the configuration file location.
    Path,
}

fn parse_property(input: &str) -> Result<(String, String), String> {
    match input.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{input}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_batch_add() {
        let cli = Cli::parse_from([
            "azkit",
            "add",
            "--batch",
            "-t",
            "HttpTrigger",
            "-n",
            "hello",
            "-p",
            "com.example",
            "-D",
            "authLevel=FUNCTION",
        ]);
        let Commands::Add(args) = cli.command else {
            panic!("expected add");
        };
        assert!(args.batch);
        assert_eq!(args.template.as_deref(), Some("HttpTrigger"));
        assert_eq!(
            args.properties,
            [("authLevel".to_string(), "FUNCTION".to_string())]
        );
    }

    #[test]
    fn property_values_may_contain_equals() {
        assert_eq!(
            parse_property("connection=a=b").unwrap(),
            ("connection".to_string(), "a=b".to_string())
        );
        assert!(parse_property("=x").is_err());
        assert!(parse_property("novalue").is_err());
    }

    #[test]
    fn package_defaults_to_current_dir() {
        let cli = Cli::parse_from(["azkit", "package", "--app-name", "demo"]);
        let Commands::Package(args) = cli.command else {
            panic!("expected package");
        };
        assert_eq!(args.base_dir, PathBuf::from("."));
        assert!(!args.skip_install_extensions);
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        let result = Cli::try_parse_from(["azkit", "--quiet", "--verbose", "list"]);
        assert!(result.is_err());
    }
}
