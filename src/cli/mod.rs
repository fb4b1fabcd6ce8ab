use ballotbox::address::Address;
use clap::{Parser, Subcommand};

pub mod config;
pub mod create_topic;
pub mod finalize;
pub mod init;
pub mod session;
pub mod topics;
pub mod version;
pub mod vote;

#[derive(Parser)]
#[command(name = "ballotbox")]
#[command(author = "ballotbox contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator CLI for the ballotbox voting registry", long_about = None)]
pub struct Cli {
    /// Path to config file (default: ~/.local/share/ballotbox/config.toml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Pin ledger time to this Unix timestamp instead of the system clock
    #[arg(long, global = true)]
    pub at: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config file
    Init {
        /// Registry owner (also the default signer)
        #[arg(long)]
        owner: Address,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Create a voting topic
    CreateTopic {
        /// Topic description
        #[arg(long)]
        description: String,

        /// Option label (repeat for each option)
        #[arg(long = "option", required = true)]
        options: Vec<String>,

        /// Token whose balances weight the votes
        #[arg(long)]
        token: Address,

        /// Voting period from now, e.g. "7d" or "36h" (default: 7d)
        #[arg(long, conflicts_with = "end_time")]
        duration: Option<String>,

        /// Absolute end of voting (Unix seconds)
        #[arg(long)]
        end_time: Option<u64>,

        /// Caller address (default: [ledger] signer)
        #[arg(long)]
        caller: Option<Address>,
    },

    /// Vote on a topic
    Vote {
        /// Topic id
        #[arg(long)]
        topic: u64,

        /// Option label
        #[arg(long)]
        option: String,

        /// Caller address (default: [ledger] signer)
        #[arg(long)]
        caller: Option<Address>,
    },

    /// Finalize a topic and compute weighted tallies
    Finalize {
        /// Topic id
        #[arg(long)]
        topic: u64,

        /// Caller address (default: [ledger] signer)
        #[arg(long)]
        caller: Option<Address>,
    },

    /// List all topics
    Topics {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show one topic
    Show {
        /// Topic id
        #[arg(long)]
        topic: u64,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the tally for one option
    Votes {
        /// Topic id
        #[arg(long)]
        topic: u64,

        /// Option label
        #[arg(long)]
        option: String,
    },

    /// Display version information
    Version,
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let Cli {
        config,
        at,
        command,
    } = cli;

    match command {
        Commands::Init { owner, force } => init::execute(config, owner, force),
        Commands::CreateTopic {
            description,
            options,
            token,
            duration,
            end_time,
            caller,
        } => {
            create_topic::execute(
                config,
                at,
                create_topic::Args {
                    description,
                    options,
                    token,
                    duration,
                    end_time,
                    caller,
                },
            )
            .await
        }
        Commands::Vote {
            topic,
            option,
            caller,
        } => vote::execute(config, at, topic, option, caller).await,
        Commands::Finalize { topic, caller } => finalize::execute(config, at, topic, caller).await,
        Commands::Topics { json } => topics::list(config, at, json).await,
        Commands::Show { topic, json } => topics::show(config, at, topic, json).await,
        Commands::Votes { topic, option } => topics::votes(config, at, topic, option).await,
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "0x1896e024f4df09bc6b260558adb70b6487803219";
    const TOKEN: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["ballotbox", "init", "--owner", OWNER]);

        assert_eq!(cli.config, None);
        match cli.command {
            Commands::Init { owner, force } => {
                assert_eq!(owner, OWNER.parse::<Address>().unwrap());
                assert!(!force);
            }
            _ => panic!("Expected Init command"),
        }
    }

    #[test]
    fn test_cli_parse_init_rejects_bad_owner() {
        let result = Cli::try_parse_from(["ballotbox", "init", "--owner", "0x1234"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_create_topic() {
        let cli = Cli::parse_from([
            "ballotbox",
            "create-topic",
            "--description",
            "What is the best memecoin ever?",
            "--option",
            "NDMEME!",
            "--option",
            "$NDMEME",
            "--token",
            TOKEN,
        ]);

        match cli.command {
            Commands::CreateTopic {
                description,
                options,
                token,
                duration,
                end_time,
                caller,
            } => {
                assert_eq!(description, "What is the best memecoin ever?");
                assert_eq!(options, vec!["NDMEME!", "$NDMEME"]);
                assert_eq!(token, TOKEN.parse::<Address>().unwrap());
                assert_eq!(duration, None);
                assert_eq!(end_time, None);
                assert_eq!(caller, None);
            }
            _ => panic!("Expected CreateTopic command"),
        }
    }

    #[test]
    fn test_cli_parse_create_topic_requires_option() {
        let result = Cli::try_parse_from([
            "ballotbox",
            "create-topic",
            "--description",
            "d",
            "--token",
            TOKEN,
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_create_topic_duration_conflicts_with_end_time() {
        let result = Cli::try_parse_from([
            "ballotbox",
            "create-topic",
            "--description",
            "d",
            "--option",
            "a",
            "--token",
            TOKEN,
            "--duration",
            "1d",
            "--end-time",
            "1700000000",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_vote_with_globals() {
        let cli = Cli::parse_from([
            "ballotbox",
            "vote",
            "--topic",
            "3",
            "--option",
            "Option1",
            "--config",
            "/tmp/ballotbox.toml",
            "--at",
            "1700000000",
        ]);

        assert_eq!(cli.config, Some("/tmp/ballotbox.toml".to_string()));
        assert_eq!(cli.at, Some(1_700_000_000));
        match cli.command {
            Commands::Vote {
                topic,
                option,
                caller,
            } => {
                assert_eq!(topic, 3);
                assert_eq!(option, "Option1");
                assert_eq!(caller, None);
            }
            _ => panic!("Expected Vote command"),
        }
    }

    #[test]
    fn test_cli_parse_finalize() {
        let cli = Cli::parse_from(["ballotbox", "finalize", "--topic", "0", "--caller", OWNER]);

        match cli.command {
            Commands::Finalize { topic, caller } => {
                assert_eq!(topic, 0);
                assert_eq!(caller, Some(OWNER.parse::<Address>().unwrap()));
            }
            _ => panic!("Expected Finalize command"),
        }
    }

    #[test]
    fn test_cli_parse_topics() {
        let cli = Cli::parse_from(["ballotbox", "topics", "--json"]);
        assert!(matches!(cli.command, Commands::Topics { json: true }));
    }

    #[test]
    fn test_cli_parse_votes() {
        let cli = Cli::parse_from(["ballotbox", "votes", "--topic", "1", "--option", "B"]);

        match cli.command {
            Commands::Votes { topic, option } => {
                assert_eq!(topic, 1);
                assert_eq!(option, "B");
            }
            _ => panic!("Expected Votes command"),
        }
    }

    #[test]
    fn test_cli_parse_version() {
        let cli = Cli::parse_from(["ballotbox", "version"]);
        assert!(matches!(cli.command, Commands::Version));
    }
}
