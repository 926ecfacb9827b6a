use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;

#[derive(Parser)]
#[command(
    name = "blogscribe",
    about = "Blog Scribe - Turn YouTube videos into blog articles",
    version,
    long_about = "Downloads the audio of a YouTube video, transcribes it with AssemblyAI and asks a language model to write a blog article from the transcript. Articles are stored per user and served over HTTP."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to bind (overrides the config file)
        #[arg(long, value_name = "ADDR")]
        host: Option<IpAddr>,

        /// Port to bind (overrides the config file)
        #[arg(short, long, value_name = "PORT")]
        port: Option<u16>,
    },

    /// Generate and store an article for one video
    Generate {
        /// YouTube link
        #[arg(value_name = "LINK")]
        link: String,

        /// User the article is stored for
        #[arg(short, long, value_name = "USER", env = "BLOGSCRIBE_USER")]
        user: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Also print the transcript (text format only)
        #[arg(long)]
        show_transcript: bool,
    },

    /// List the stored articles of a user
    Posts {
        /// Owner of the articles
        #[arg(short, long, value_name = "USER", env = "BLOGSCRIBE_USER")]
        user: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON, same shape as the HTTP API
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::parse_from([
            "blogscribe",
            "generate",
            "https://youtu.be/abc123",
            "--user",
            "alice",
            "--format",
            "json",
        ]);

        match cli.command {
            Commands::Generate { link, user, format, show_transcript } => {
                assert_eq!(link, "https://youtu.be/abc123");
                assert_eq!(user, "alice");
                assert_eq!(format, OutputFormat::Json);
                assert!(!show_transcript);
            }
            _ => panic!("expected generate command"),
        }
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from(["blogscribe", "-v", "serve", "--port", "9000"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Serve { host: None, port: Some(9000) }));
    }
}
