#![allow(clippy::print_stdout, clippy::print_stderr, reason = "CLI output")]

use clap::{Parser, Subcommand};
use guardian_lib::error::AppError;
use guardian_lib::{logging, session, AppPaths, Guardian};
use log::LevelFilter;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "guardian", version, about = "Digital wellness agent")]
struct Cli {
    /// Directory holding settings, stats and logs
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    /// Hosts file to edit instead of the system one
    #[arg(long, global = true)]
    hosts_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor processes and accept focus/timer/stats commands until `stop`
    Run {
        /// Start the pomodoro timer right away
        #[arg(long)]
        pomodoro: bool,
    },
    /// Points, level, streak and badges
    Status,
    /// Block a domain through the hosts file
    Block { domain: String },
    /// Remove a domain from the hosts file
    Unblock { domain: String },
    /// Domains currently blocked in the hosts file
    Blocked,
    /// Blocked applications
    Apps {
        #[command(subcommand)]
        action: ListAction,
    },
    /// Domains that can never be blocked
    Whitelist {
        #[command(subcommand)]
        action: ListAction,
    },
    /// Blocking profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Show where the settings file lives, or back it up and restore it
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the current settings to a file
    Export { path: PathBuf },
    /// Replace the settings with a previously exported file
    Import { path: PathBuf },
}

#[derive(Subcommand)]
enum ListAction {
    Add { name: String },
    Remove { name: String },
    List,
}

#[derive(Subcommand)]
enum ProfileAction {
    List,
    Use { name: String },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let mut paths = AppPaths::resolve(cli.home)?;
    if let Some(hosts_file) = cli.hosts_file {
        paths = paths.with_hosts_file(hosts_file);
    }

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(e) = logging::init(&paths.log_file, level) {
        eprintln!("warning: logging disabled: {e}");
    }

    let guardian = Guardian::open(paths);
    match cli.command {
        Commands::Run { pomodoro } => run_monitor(&guardian, pomodoro),
        Commands::Status => session::write_status(&guardian, &mut io::stdout().lock()),
        Commands::Block { domain } => {
            let domain = guardian.block_site(&domain)?;
            println!("Blocked {domain}");
            Ok(())
        }
        Commands::Unblock { domain } => {
            let domain = guardian.unblock_site(&domain)?;
            println!("Unblocked {domain}");
            Ok(())
        }
        Commands::Blocked => {
            for domain in guardian.scan_hosts()? {
                println!("{domain}");
            }
            Ok(())
        }
        Commands::Apps { action } => match action {
            ListAction::Add { name } => {
                if guardian.update_settings(|s| s.add_blocked_app(&name))? {
                    println!("Blocking {}", name.trim());
                } else {
                    println!("{} is already blocked", name.trim());
                }
                Ok(())
            }
            ListAction::Remove { name } => {
                if guardian.update_settings(|s| Ok(s.remove_blocked_app(&name)))? {
                    println!("No longer blocking {}", name.trim());
                } else {
                    println!("{} was not blocked", name.trim());
                }
                Ok(())
            }
            ListAction::List => {
                for app in &guardian.settings().blocked_apps {
                    println!("{app}");
                }
                Ok(())
            }
        },
        Commands::Whitelist { action } => match action {
            ListAction::Add { name } => {
                guardian.update_settings(|s| s.add_whitelist_domain(&name))?;
                println!("Whitelisted {name}");
                Ok(())
            }
            ListAction::Remove { name } => {
                if guardian.update_settings(|s| s.remove_whitelist_domain(&name))? {
                    println!("Removed {name} from the whitelist");
                } else {
                    println!("{name} was not whitelisted");
                }
                Ok(())
            }
            ListAction::List => {
                for domain in &guardian.settings().whitelist_domains {
                    println!("{domain}");
                }
                Ok(())
            }
        },
        Commands::Profile { action } => match action {
            ProfileAction::List => {
                let settings = guardian.settings();
                for (name, profile) in &settings.profiles {
                    let marker = if *name == settings.current_profile { "*" } else { " " };
                    let hours = if profile.hours.is_empty() {
                        "all day".to_string()
                    } else {
                        profile.hours.join(", ")
                    };
                    println!("{marker} {name} ({hours})");
                }
                Ok(())
            }
            ProfileAction::Use { name } => {
                guardian.update_settings(|s| s.switch_profile(&name))?;
                println!("Switched to profile {name}");
                Ok(())
            }
        },
        Commands::Config { action } => match action {
            None => {
                println!("{}", guardian.open_config().display());
                Ok(())
            }
            Some(ConfigAction::Export { path }) => {
                guardian.export_settings(&path)?;
                println!("Settings exported to {}", path.display());
                Ok(())
            }
            Some(ConfigAction::Import { path }) => {
                guardian.import_settings(&path)?;
                println!("Settings imported from {}", path.display());
                Ok(())
            }
        },
    }
}

fn run_monitor(guardian: &Guardian, pomodoro: bool) -> Result<(), AppError> {
    guardian.start();
    if pomodoro {
        guardian.start_focus_timer();
    }

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "Guardian is watching. Type 'help' for commands, Enter to stop.")?;
    stdout.flush()?;
    session::run(guardian, io::stdin().lock(), &mut stdout)?;

    guardian.stop()?;
    writeln!(stdout)?;
    session::write_status(guardian, &mut stdout)?;
    session::write_stats(guardian, &mut stdout)
}
