//! Command-line front end: loads the catalogs, configuration and roster,
//! then drives one battle from commands read on stdin.
//!
//! Usage:
//!   pokemon-battle-sim --p1 Sparky --p2 Boulder
//!   pokemon-battle-sim --p1 Sparky --p2 Boulder --seed 7 --json
//!
//! Commands, always for the side whose action is next:
//!   attack <slot>
//!   item <NAME> [slot]
//!   status
//!   quit

use anyhow::{bail, Context, Result};
use clap::Parser;
use pokemon_battle_sim::catalog::{CatalogLoad, CatalogRecord};
use pokemon_battle_sim::{
    Battle, BattleConfig, Catalog, Combatant, ItemCatalog, MoveCatalog, PlayerAction, PlayerTarget,
    Roster, TurnReport, TurnRng,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pokemon-battle-sim")]
#[command(about = "Run a two-combatant battle from the command line", long_about = None)]
#[command(version)]
struct Cli {
    /// Move catalog, one '@'-separated record per line
    #[arg(long, default_value = "data/moves.txt")]
    moves: PathBuf,

    /// Item catalog, one '@'-separated record per line
    #[arg(long, default_value = "data/items.txt")]
    items: PathBuf,

    /// Engine configuration (RON); defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Combatant roster (RON)
    #[arg(long, default_value = "data/roster.ron")]
    roster: PathBuf,

    /// Roster entry for player 1
    #[arg(long)]
    p1: String,

    /// Roster entry for player 2
    #[arg(long)]
    p2: String,

    /// Seed for reproducible battles
    #[arg(long)]
    seed: Option<u64>,

    /// Print each turn's events as JSON lines instead of text
    #[arg(long)]
    json: bool,
}

enum Command {
    Attack(usize),
    Item { name: String, slot: Option<usize> },
    Status,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            bail!("empty command");
        };
        match verb.to_ascii_lowercase().as_str() {
            "attack" => {
                let slot = words.next().context("usage: attack <slot>")?;
                Ok(Command::Attack(slot.parse().context("slot must be a number")?))
            }
            "item" => {
                let mut words: Vec<&str> = words.collect();
                if words.is_empty() {
                    bail!("usage: item <NAME> [slot]");
                }
                // A trailing number is the move slot; everything before it is the name.
                let slot = match words.last().map(|word| word.parse::<usize>()) {
                    Some(Ok(slot)) if words.len() > 1 => {
                        words.pop();
                        Some(slot)
                    }
                    _ => None,
                };
                Ok(Command::Item {
                    name: words.join(" "),
                    slot,
                })
            }
            "status" => Ok(Command::Status),
            "quit" | "exit" => Ok(Command::Quit),
            other => bail!("unknown command {:?}", other),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BattleConfig::load(path)?,
        None => BattleConfig::default(),
    };
    let moves: MoveCatalog = load_catalog(&cli.moves)?;
    let items: ItemCatalog = load_catalog(&cli.items)?;
    let roster = Roster::load(&cli.roster)?;

    let player1 = build(&roster, &cli.p1, &moves, &items, &config)?;
    let player2 = build(&roster, &cli.p2, &moves, &items, &config)?;
    let rng = match cli.seed {
        Some(seed) => TurnRng::seeded(seed),
        None => TurnRng::new_random(),
    };

    let mut battle = Battle::new(&config, &moves, &items, player1, player2, rng);
    run(&mut battle, cli.json)?;

    if let Some(outcome) = battle.outcome() {
        info!(?outcome, "battle finished");
    }
    Ok(())
}

/// Bad records are skipped (the catalog logs each one); only an unreadable
/// file stops the program.
fn load_catalog<T: CatalogRecord>(path: &Path) -> Result<Catalog<T>> {
    let CatalogLoad { catalog, errors } = Catalog::<T>::load_from_path(path)
        .with_context(|| format!("loading catalog {}", path.display()))?;
    if !errors.is_empty() {
        warn!(path = %path.display(), skipped = errors.len(), "catalog has bad records");
    }
    Ok(catalog)
}

fn build(
    roster: &Roster,
    name: &str,
    moves: &MoveCatalog,
    items: &ItemCatalog,
    config: &BattleConfig,
) -> Result<Combatant> {
    let entry = roster.get(name)?;
    entry
        .build(moves, items, config)
        .with_context(|| format!("building roster entry {}", entry.name))
}

fn run(battle: &mut Battle<'_>, json: bool) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    prompt(battle, &mut stdout)?;

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let action = match Command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(Command::Status) => {
                print_status(battle, &mut stdout)?;
                prompt(battle, &mut stdout)?;
                continue;
            }
            Ok(Command::Attack(slot)) => PlayerAction::Attack { move_index: slot },
            Ok(Command::Item { name, slot }) => PlayerAction::UseItem {
                item: name,
                move_index: slot,
            },
            Err(err) => {
                writeln!(stdout, "{}", err)?;
                prompt(battle, &mut stdout)?;
                continue;
            }
        };

        match battle.submit(action) {
            Ok(report) => print_report(battle, &report, json, &mut stdout)?,
            Err(err) => writeln!(stdout, "Cannot do that: {}", err)?,
        }
        if battle.is_over() {
            break;
        }
        prompt(battle, &mut stdout)?;
    }
    Ok(())
}

fn prompt(battle: &Battle<'_>, out: &mut impl Write) -> io::Result<()> {
    let active = battle.active();
    write!(out, "{} ({})> ", active, battle.state().combatant(active).name)?;
    out.flush()
}

fn print_report(battle: &Battle<'_>, report: &TurnReport, json: bool, out: &mut impl Write) -> Result<()> {
    if json {
        for event in &report.events {
            writeln!(out, "{}", serde_json::to_string(event)?)?;
        }
    } else {
        for line in battle.format_events(report) {
            writeln!(out, "{}", line)?;
        }
    }
    Ok(())
}

fn print_status(battle: &Battle<'_>, out: &mut impl Write) -> io::Result<()> {
    for target in PlayerTarget::both() {
        let combatant = battle.state().combatant(target);
        writeln!(
            out,
            "{}: {} Lv{} HP {}/{} [{}]",
            target,
            combatant.name,
            combatant.level,
            combatant.current_hp(),
            combatant.max_hp(),
            combatant.status
        )?;
        for (slot, instance) in combatant.moves.iter().enumerate() {
            writeln!(
                out,
                "  {}: {} PP {}/{}",
                slot,
                instance.name(),
                instance.current.pp,
                instance.max.pp
            )?;
        }
        for (item, quantity) in &combatant.inventory {
            writeln!(out, "  {} x{}", item, quantity)?;
        }
    }
    writeln!(out, "Turn {}", battle.turn_number())
}
