// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// FUNPAD CLI - Operator Interface for a Local Engine Instance
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use funpad_core::AssetMetadata;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "funpad")]
#[command(about = "FunPad CLI - token launches, trading and migration", long_about = None)]
#[command(version)]
struct Cli {
    /// State directory (reads FUNPAD_STATE_DIR, defaults to ~/.funpad)
    #[arg(short, long, env = "FUNPAD_STATE_DIR")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Side {
    Buy,
    Sell,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new engine instance in the state directory
    Init {
        /// Instance name (ignored when --config is given)
        #[arg(short, long, default_value = "funpad-local")]
        name: String,

        /// Initial admin (also the fee recipient)
        #[arg(short, long)]
        admin: Option<String>,

        /// TOML engine config
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Overwrite an existing instance
        #[arg(long)]
        force: bool,
    },

    /// Launch a new asset on a bonding curve
    Launch {
        /// Caller address
        #[arg(long = "as")]
        caller: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        symbol: String,

        /// Native raise that exhausts the curve (default: 69 native coins)
        #[arg(long)]
        target: Option<u128>,

        /// Attached native value: creation fee plus optional first buy
        #[arg(long)]
        value: u128,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "")]
        image: String,

        #[arg(long, default_value = "")]
        twitter: String,

        #[arg(long, default_value = "")]
        telegram: String,

        #[arg(long, default_value = "")]
        website: String,
    },

    /// Buy an asset with native value
    Buy {
        #[arg(long = "as")]
        caller: String,

        #[arg(short, long)]
        asset: String,

        /// Native value to spend
        #[arg(long)]
        value: u128,

        #[arg(long, default_value = "0")]
        min_out: u128,

        #[arg(long)]
        referrer: Option<String>,
    },

    /// Sell an asset for native value
    Sell {
        #[arg(long = "as")]
        caller: String,

        #[arg(short, long)]
        asset: String,

        /// Token amount in atomic units
        #[arg(long)]
        amount: u128,

        #[arg(long, default_value = "0")]
        min_out: u128,

        #[arg(long)]
        referrer: Option<String>,
    },

    /// Price a trade without executing it
    Quote {
        #[arg(short, long)]
        asset: String,

        #[arg(long, value_enum)]
        side: Side,

        #[arg(long)]
        amount: u128,
    },

    /// Withdraw accrued native balance
    Withdraw {
        #[arg(long = "as")]
        caller: String,

        #[arg(long)]
        amount: u128,
    },

    /// Show asset details and its venue
    Info {
        asset: String,
    },

    /// Show an account's balances
    Balance {
        account: String,

        /// Only this asset
        #[arg(short, long)]
        asset: Option<String>,
    },

    /// List launched assets
    Tokens,

    /// Pause or resume trading (admin)
    Pause {
        #[arg(long = "as")]
        caller: String,

        #[arg(long)]
        resume: bool,
    },

    /// Retire a promoted asset (admin)
    Retire {
        #[arg(long = "as")]
        caller: String,

        #[arg(short, long)]
        asset: String,
    },

    /// Hand this instance over to the instance in another state directory (admin)
    Migrate {
        #[arg(long = "as")]
        caller: String,

        /// Destination state directory
        #[arg(long)]
        to: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    print_banner();

    let state_dir = cli.state_dir.unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join(".funpad")
    });
    std::fs::create_dir_all(&state_dir)?;

    let result = match cli.command {
        Commands::Init {
            name,
            admin,
            config,
            force,
        } => commands::admin::init(&state_dir, &name, admin.as_deref(), config.as_deref(), force),
        Commands::Launch {
            caller,
            name,
            symbol,
            target,
            value,
            description,
            image,
            twitter,
            telegram,
            website,
        } => {
            let metadata = AssetMetadata {
                name,
                symbol,
                description,
                image,
                twitter,
                telegram,
                website,
            };
            commands::trade::launch(&state_dir, &caller, metadata, target, value)
        }
        Commands::Buy {
            caller,
            asset,
            value,
            min_out,
            referrer,
        } => commands::trade::buy(&state_dir, &caller, &asset, value, min_out, referrer.as_deref()),
        Commands::Sell {
            caller,
            asset,
            amount,
            min_out,
            referrer,
        } => commands::trade::sell(&state_dir, &caller, &asset, amount, min_out, referrer.as_deref()),
        Commands::Quote {
            asset,
            side,
            amount,
        } => commands::query::quote(&state_dir, &asset, side, amount),
        Commands::Withdraw { caller, amount } => commands::trade::withdraw(&state_dir, &caller, amount),
        Commands::Info { asset } => commands::query::info(&state_dir, &asset),
        Commands::Balance { account, asset } => {
            commands::query::balance(&state_dir, &account, asset.as_deref())
        }
        Commands::Tokens => commands::query::tokens(&state_dir),
        Commands::Pause { caller, resume } => commands::admin::pause(&state_dir, &caller, !resume),
        Commands::Retire { caller, asset } => commands::admin::retire(&state_dir, &caller, &asset),
        Commands::Migrate { caller, to } => commands::admin::migrate(&state_dir, &caller, &to),
    };

    if let Err(e) = result {
        print_error(&e.to_string());
        std::process::exit(1);
    }
    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        "╔═══════════════════════════════════════════════╗".cyan()
    );
    println!(
        "{}",
        "║            FUNPAD - CLI v0.3.0                ║"
            .cyan()
            .bold()
    );
    println!(
        "{}",
        "║   Launch | Curve | Pool | Migrate             ║".cyan()
    );
    println!(
        "{}",
        "╚═══════════════════════════════════════════════╝".cyan()
    );
    println!();
}

fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue().bold(), msg);
}

// ─────────────────────────────────────────────────────────────────
// UNIT TESTS
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_init() {
        let cli = Cli::try_parse_from(["funpad", "init", "--admin", "root"]).unwrap();
        match cli.command {
            Commands::Init {
                name, admin, force, ..
            } => {
                assert_eq!(name, "funpad-local");
                assert_eq!(admin.as_deref(), Some("root"));
                assert!(!force);
            }
            _ => panic!("Expected Init"),
        }
    }

    #[test]
    fn test_cli_buy_u128_amounts() {
        let cli = Cli::try_parse_from([
            "funpad",
            "buy",
            "--as",
            "alice",
            "--asset",
            "FUNa00",
            "--value",
            "340282366920938463463374607431768211455",
            "--referrer",
            "bob",
        ])
        .unwrap();
        match cli.command {
            Commands::Buy {
                caller,
                value,
                min_out,
                referrer,
                ..
            } => {
                assert_eq!(caller, "alice");
                assert_eq!(value, u128::MAX);
                assert_eq!(min_out, 0);
                assert_eq!(referrer.as_deref(), Some("bob"));
            }
            _ => panic!("Expected Buy"),
        }
    }

    #[test]
    fn test_cli_launch_links() {
        let cli = Cli::try_parse_from([
            "funpad",
            "launch",
            "--as",
            "maker",
            "--name",
            "Frog",
            "--symbol",
            "FROG",
            "--value",
            "20000000",
            "--twitter",
            "https://x.com/frog",
            "--website",
            "https://frog.fun",
        ])
        .unwrap();
        match cli.command {
            Commands::Launch {
                twitter,
                telegram,
                website,
                target,
                ..
            } => {
                assert_eq!(twitter, "https://x.com/frog");
                assert_eq!(telegram, "");
                assert_eq!(website, "https://frog.fun");
                assert_eq!(target, None);
            }
            _ => panic!("Expected Launch"),
        }
    }

    #[test]
    fn test_cli_quote_side() {
        let cli = Cli::try_parse_from([
            "funpad", "quote", "--asset", "FUNa00", "--side", "sell", "--amount", "10",
        ])
        .unwrap();
        match cli.command {
            Commands::Quote { side, amount, .. } => {
                assert_eq!(side, Side::Sell);
                assert_eq!(amount, 10);
            }
            _ => panic!("Expected Quote"),
        }
    }

    #[test]
    fn test_cli_state_dir_flag() {
        let cli = Cli::try_parse_from(["funpad", "--state-dir", "/tmp/fp", "tokens"]).unwrap();
        assert_eq!(cli.state_dir, Some(PathBuf::from("/tmp/fp")));
        assert!(matches!(cli.command, Commands::Tokens));
    }

    #[test]
    fn test_cli_rejects_bad_side() {
        assert!(Cli::try_parse_from([
            "funpad", "quote", "--asset", "x", "--side", "hold", "--amount", "1"
        ])
        .is_err());
    }
}
