//! CLI mode implementation
//!
//! Command surface over the launcher pipeline: one-shot queries, the
//! interactive loop, and provider introspection.

use clap::{Parser, Subcommand};

/// Quickcast CLI
#[derive(Parser)]
#[command(name = "quickcast")]
#[command(about = "Fuzzy launcher: match queries against programs, bookmarks and web search", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output (no short flag to avoid conflicts)
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one query to completion and print the ranked results
    Query(QueryArgs),
    /// Read queries from stdin, printing live result updates (default)
    Interactive,
    /// List registered providers and their action keywords
    Providers,
}

/// Query command arguments
#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// Query text; the first word may be an action keyword ("ddg rust")
    #[arg(required = true)]
    pub text: Vec<String>,
}

impl QueryArgs {
    /// Raw launcher input, as if typed into the query box
    pub fn raw(&self) -> String {
        self.text.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_args_join() {
        let args = QueryArgs {
            text: vec!["ddg".to_string(), "rust".to_string(), "async".to_string()],
        };
        assert_eq!(args.raw(), "ddg rust async");
    }

    #[test]
    fn test_parse_query_command() {
        let cli = Cli::parse_from(["quickcast", "query", "install", "package"]);
        match cli.command {
            Some(Commands::Query(args)) => assert_eq!(args.raw(), "install package"),
            _ => panic!("expected query command"),
        }
    }

    #[test]
    fn test_no_subcommand_is_allowed() {
        let cli = Cli::parse_from(["quickcast", "--verbose"]);
        assert!(cli.command.is_none());
        assert!(cli.verbose);
    }
}
