use crate::error::AppError;
use std::path::PathBuf;

pub const USAGE: &str = "usage:
  carpark-sim <arrival_rate> <service_time> <spaces> [--seed N] [--blocking] [--json] [--config PATH]
  carpark-sim serve [--config PATH]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Run(RunArgs),
    Serve { config_path: Option<PathBuf> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    pub arrival_rate: u32,
    pub service_time: u32,
    pub spaces: u32,
    pub seed: Option<u64>,
    pub blocking: bool,
    pub json: bool,
    pub config_path: Option<PathBuf>,
}

impl Command {
    pub fn config_path(&self) -> Option<&PathBuf> {
        match self {
            Command::Run(args) => args.config_path.as_ref(),
            Command::Serve { config_path } => config_path.as_ref(),
        }
    }
}

/// Parse arguments, excluding the program name.
pub fn parse<I>(args: I) -> Result<Command, AppError>
where
    I: IntoIterator<Item = String>,
{
    let mut positional = Vec::new();
    let mut seed = None;
    let mut blocking = false;
    let mut json = false;
    let mut config_path = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => {
                let value = args.next().ok_or_else(|| usage("--seed needs a value"))?;
                seed = Some(parse_number::<u64>("seed", &value)?);
            }
            "--config" => {
                let value = args.next().ok_or_else(|| usage("--config needs a path"))?;
                config_path = Some(PathBuf::from(value));
            }
            "--blocking" => blocking = true,
            "--json" => json = true,
            "-h" | "--help" => return Err(AppError::Usage(USAGE.to_string())),
            flag if flag.starts_with("--") => {
                return Err(usage(&format!("unknown option {flag}")));
            }
            _ => positional.push(arg),
        }
    }

    if positional.first().map(String::as_str) == Some("serve") {
        if positional.len() > 1 || seed.is_some() || blocking || json {
            return Err(usage("serve only accepts --config"));
        }
        return Ok(Command::Serve { config_path });
    }

    let [arrival_rate, service_time, spaces] = positional.as_slice() else {
        return Err(usage("expected exactly three numbers"));
    };

    Ok(Command::Run(RunArgs {
        arrival_rate: parse_number("arrival_rate", arrival_rate)?,
        service_time: parse_number("service_time", service_time)?,
        spaces: parse_number("spaces", spaces)?,
        seed,
        blocking,
        json,
        config_path,
    }))
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, AppError> {
    value
        .parse()
        .map_err(|_| usage(&format!("{name} must be a non-negative integer, got {value:?}")))
}

fn usage(reason: &str) -> AppError {
    AppError::Usage(format!("{reason}\n{USAGE}"))
}
