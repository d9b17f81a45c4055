//       ___           ___           ___           ___
//      /\__\         /\  \         /\  \         /\__\
//     /:/  /         \:\  \        \:\  \       /::|  |
//    /:/__/           \:\  \        \:\  \     /:|:|  |
//   /::\  \ ___       /::\  \       /::\  \   /:/|:|__|__
//  /:/\:\  /\__\     /:/\:\__\     /:/\:\__\ /:/ |::::\__\
//  \/__\:\/:/  /    /:/  \/__/    /:/  \/__/ \/__/~~/:/  /
//       \::/  /    /:/  /        /:/  /            /:/  /
//       /:/  /     \/__/         \/__/            /:/  /
//      /:/  /                                    /:/  /
//      \/__/                                     \/__/
//
// (c) Robert Swinford <robert.swinford<...at...>gmail.com>
//
// For the full copyright and license information, please view the LICENSE file
// that was distributed with this source code.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use zsysd::config::{CmdlineSource, Config, ProviderSource};
use zsysd::display::dump::{dump_machine, dump_machines};
use zsysd::display::info::format_info;
use zsysd::display::list::format_list;
use zsysd::Machines;

/// Assembles a fleet of ZFS-backed bootable machine states from a raw
/// dataset inventory.
#[derive(Parser, Debug)]
#[command(name = "machined", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Read the dataset inventory from this fixture file instead of `zfs list`.
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    /// Use this literal string as the kernel cmdline instead of `/proc/cmdline`.
    #[arg(long, global = true)]
    cmdline: Option<String>,

    /// Read the kernel cmdline from this file instead of `/proc/cmdline`.
    #[arg(long, global = true, conflicts_with = "cmdline")]
    cmdline_file: Option<PathBuf>,

    /// Enable debug-level logging (equivalent to `RUST_LOG=debug`).
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every known machine.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show one machine's history and user states.
    Info {
        id: String,
        #[arg(long)]
        full: bool,
        #[arg(long)]
        json: bool,
    },
    /// Build the graph once and print a one-line summary.
    Refresh,
}

fn main() {
    if let Err(error) = run() {
        eprintln!("Error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::init();
    }

    let provider_source = match &cli.fixture {
        Some(path) => ProviderSource::Fixture(path.clone()),
        None => ProviderSource::Command,
    };
    let cmdline_source = match (&cli.cmdline, &cli.cmdline_file) {
        (Some(literal), _) => CmdlineSource::Literal(literal.clone()),
        (None, Some(path)) => CmdlineSource::File(path.clone()),
        (None, None) => CmdlineSource::Proc,
    };
    let config = Config::new(provider_source, cmdline_source);

    let provider = config.build_provider().context("couldn't set up dataset provider")?;
    let cmdline = config.read_cmdline().context("couldn't read kernel cmdline")?;
    let machines = Machines::refresh(provider.as_ref(), &cmdline).context("couldn't build machines graph")?;

    match cli.command {
        Command::List { json } => {
            if json {
                println!("{}", dump_machines(&machines)?);
            } else {
                print!("{}", format_list(&machines));
            }
        }
        Command::Info { id, full, json } => {
            let m = machines.get_machine(&id)?;
            if json {
                println!("{}", dump_machine(m)?);
            } else {
                print!("{}", format_info(m));
                if full {
                    print!("{}", dump_machine(m)?);
                }
            }
        }
        Command::Refresh => {
            let history_count: usize = machines.all.values().map(|m| m.history.len()).sum();
            let user_count: usize = machines
                .all
                .values()
                .flat_map(|m| m.users.values())
                .map(|states| states.len())
                .sum();
            println!(
                "{} machine(s), {} history state(s), {} user state(s)",
                machines.all.len(),
                history_count,
                user_count
            );
        }
    }

    Ok(())
}
