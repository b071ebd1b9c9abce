use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use coffee_analysis_server::calibration::{
    seed_reference_calibrations, CalibrationKey, CalibrationRepository, CalibrationResolver,
    CoffeeOrigin, CoffeeType, NewCalibrationEntry, PartialCoefficients, ResolutionTier,
    SqliteCalibrationStore,
};

use rustyline::{
    completion::Completer, highlight::Highlighter, history::FileHistory, validate::Validator,
    CompletionType, Config, Editor, Helper,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let original_path = PathBuf::from(s);
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

fn parse_coffee_type(s: &str) -> Result<CoffeeType, String> {
    let code: i64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    CoffeeType::try_from(code)
}

fn parse_coffee_origin(s: &str) -> Result<CoffeeOrigin, String> {
    let code: i64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    CoffeeOrigin::try_from(code)
}

/// Operator console for the calibration table.
///
/// Without a command it starts an interactive prompt, otherwise it runs the
/// given command once and exits.
#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite calibration database file.
    #[clap(value_parser = parse_path)]
    pub path: PathBuf,

    /// A single command to run instead of the interactive prompt.
    #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

#[derive(Parser)]
#[command(name = "")]
struct InnerCli {
    #[command(subcommand)]
    command: InnerCommand,
}

#[derive(Args, Debug, Default)]
struct CoefficientArgs {
    #[arg(long)]
    co2_coeff: Option<f64>,
    #[arg(long)]
    co2_offset: Option<f64>,
    #[arg(long)]
    protein_coeff: Option<f64>,
    #[arg(long)]
    protein_offset: Option<f64>,
    #[arg(long)]
    amino_acids_coeff: Option<f64>,
    #[arg(long)]
    amino_acids_offset: Option<f64>,
    #[arg(long)]
    minerals_coeff: Option<f64>,
    #[arg(long)]
    minerals_offset: Option<f64>,
    #[arg(long)]
    flavor_compounds_coeff: Option<f64>,
    #[arg(long)]
    flavor_compounds_offset: Option<f64>,
    #[arg(long)]
    moisture_coeff: Option<f64>,
    #[arg(long)]
    moisture_offset: Option<f64>,
}

impl From<&CoefficientArgs> for PartialCoefficients {
    fn from(args: &CoefficientArgs) -> Self {
        PartialCoefficients {
            co2_coeff: args.co2_coeff,
            co2_offset: args.co2_offset,
            protein_coeff: args.protein_coeff,
            protein_offset: args.protein_offset,
            amino_acids_coeff: args.amino_acids_coeff,
            amino_acids_offset: args.amino_acids_offset,
            minerals_coeff: args.minerals_coeff,
            minerals_offset: args.minerals_offset,
            flavor_compounds_coeff: args.flavor_compounds_coeff,
            flavor_compounds_offset: args.flavor_compounds_offset,
            moisture_coeff: args.moisture_coeff,
            moisture_offset: args.moisture_offset,
        }
    }
}

#[derive(Subcommand)]
enum InnerCommand {
    /// Upserts the reference calibration rows (global Arabica/Robusta,
    /// per-origin rows and the default row).
    Seed,

    /// Shows all calibration rows.
    List,

    /// Shows a calibration row.
    Show { id: i64 },

    /// Adds a calibration row. Omitted values stay empty and resolve from the
    /// table defaults.
    Add {
        #[arg(value_parser = parse_coffee_type)]
        coffee_type: CoffeeType,
        #[arg(value_parser = parse_coffee_origin)]
        coffee_origin: CoffeeOrigin,
        #[arg(long)]
        variety: Option<String>,
        #[command(flatten)]
        values: CoefficientArgs,
    },

    /// Overwrites the given values of a calibration row.
    Update {
        id: i64,
        #[command(flatten)]
        values: CoefficientArgs,
    },

    /// Deletes a calibration row.
    Delete { id: i64 },

    /// Resolves the coefficient set the server would use.
    Resolve {
        #[arg(value_parser = parse_coffee_type)]
        coffee_type: CoffeeType,
        #[arg(value_parser = parse_coffee_origin)]
        coffee_origin: CoffeeOrigin,
        #[arg(long)]
        variety: Option<String>,
        #[arg(long, value_enum, default_value = "persisted")]
        tier: ResolutionTier,
    },

    /// Shows the path of the current calibration db.
    Where,

    /// Close this program.
    Exit,
}

#[derive(Debug, PartialEq)]
enum CommandExecutionResult {
    Ok,
    Exit,
    Error(String),
}

const PROMPT: &str = ">> ";

fn run_command(
    command: InnerCommand,
    resolver: &CalibrationResolver,
    db_path: &str,
) -> Result<CommandExecutionResult> {
    let repository = resolver.repository().as_ref();
    match command {
        InnerCommand::Seed => {
            let summary = seed_reference_calibrations(repository)?;
            println!(
                "Seeded reference calibrations: {} inserted, {} updated",
                summary.inserted, summary.updated
            );
        }
        InnerCommand::List => {
            let entries = repository.list_calibrations()?;
            if entries.is_empty() {
                println!("(no calibration rows)");
            }
            for entry in entries.iter() {
                println!(
                    "{:>4}  type={:<8} origin={:<15} variety={}",
                    entry.id,
                    entry.coffee_type.as_str(),
                    entry.coffee_origin.as_str(),
                    entry.coffee_variety.as_deref().unwrap_or("-")
                );
            }
        }
        InnerCommand::Show { id } => match repository.get_calibration(id)? {
            Some(entry) => println!("{:#?}", entry),
            None => {
                return Ok(CommandExecutionResult::Error(format!(
                    "Calibration row {} not found.",
                    id
                )))
            }
        },
        InnerCommand::Add {
            coffee_type,
            coffee_origin,
            variety,
            values,
        } => {
            let id = repository.insert_calibration(&NewCalibrationEntry {
                coffee_type,
                coffee_origin,
                coffee_variety: variety,
                values: (&values).into(),
            })?;
            println!("Added calibration row {}", id);
        }
        InnerCommand::Update { id, values } => {
            if !repository.update_calibration(id, &(&values).into())? {
                return Ok(CommandExecutionResult::Error(format!(
                    "Calibration row {} not found.",
                    id
                )));
            }
            println!("Updated calibration row {}", id);
        }
        InnerCommand::Delete { id } => {
            if !repository.delete_calibration(id)? {
                return Ok(CommandExecutionResult::Error(format!(
                    "Calibration row {} not found.",
                    id
                )));
            }
            println!("Deleted calibration row {}", id);
        }
        InnerCommand::Resolve {
            coffee_type,
            coffee_origin,
            variety,
            tier,
        } => {
            let key = CalibrationKey::new(coffee_type, coffee_origin, variety.as_deref());
            let resolution = resolver.resolve(tier, &key)?;
            println!("Source: {}", resolution.source.as_str());
            println!("{:#?}", resolution.coefficients);
        }
        InnerCommand::Where => {
            println!("{}", db_path);
        }
        InnerCommand::Exit => return Ok(CommandExecutionResult::Exit),
    }
    Ok(CommandExecutionResult::Ok)
}

fn execute_command(
    args: Vec<String>,
    resolver: &CalibrationResolver,
    db_path: &str,
) -> CommandExecutionResult {
    if args.is_empty() {
        return CommandExecutionResult::Ok;
    }

    let cli = InnerCli::try_parse_from(std::iter::once(" ").chain(args.iter().map(String::as_str)));

    match cli {
        Ok(cli) => match run_command(cli.command, resolver, db_path) {
            Ok(result) => result,
            Err(err) => CommandExecutionResult::Error(format!("{:#}", err)),
        },
        Err(e) => {
            if e.print().is_err() {
                println!("{}", e);
            }
            CommandExecutionResult::Ok
        }
    }
}

fn split_line(line: &str) -> Vec<String> {
    shlex::split(line).unwrap_or_else(|| line.split_whitespace().map(String::from).collect())
}

#[derive(rustyline_derive::Hinter)]
struct CommandHelper {
    commands_names: Vec<String>,
}

impl CommandHelper {
    pub fn new() -> Self {
        let commands_names: Vec<String> = InnerCli::command()
            .get_subcommands()
            .map(|sc| sc.get_name().to_string())
            .collect();

        CommandHelper { commands_names }
    }
}

impl Completer for CommandHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        _pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        if line.contains(' ') {
            return Ok((0, Vec::with_capacity(0)));
        }
        let matches = self
            .commands_names
            .iter()
            .filter(|c| c.starts_with(line))
            .map(|c| c.to_string())
            .collect::<Vec<_>>();

        Ok((0, matches))
    }
}

impl Highlighter for CommandHelper {}
impl Validator for CommandHelper {}
impl Helper for CommandHelper {}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    let db_path = cli_args.path.display().to_string();
    let store = SqliteCalibrationStore::new(&cli_args.path)
        .with_context(|| format!("Could not open calibration db at {}", db_path))?;
    let resolver = CalibrationResolver::new(Arc::new(store));

    if !cli_args.command.is_empty() {
        return match execute_command(cli_args.command, &resolver, &db_path) {
            CommandExecutionResult::Error(err) => anyhow::bail!(err),
            _ => Ok(()),
        };
    }

    InnerCli::command().print_long_help()?;

    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();

    let mut rl = Editor::<CommandHelper, FileHistory>::with_config(config)?;
    rl.set_helper(Some(CommandHelper::new()));

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                match execute_command(split_line(&line), &resolver, &db_path) {
                    CommandExecutionResult::Ok => {}
                    CommandExecutionResult::Exit => break,
                    CommandExecutionResult::Error(err) => {
                        eprintln!("Error: {}", err);
                        continue;
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("CTRL-D: exiting.");
                break;
            }
            Err(e) => {
                println!("Error: {:?}", e);
                break;
            }
        }
    }
    Ok(())
}
