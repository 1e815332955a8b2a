use carpark_sim::cli::{self, Command, RunArgs};
use carpark_sim::config::{self, Config, ConfigSource};
use carpark_sim::error::AppError;
use carpark_sim::simulation::SimulationConfig;
use carpark_sim::simulation::arrivals::resolve_seed;
use carpark_sim::simulation::occupancy::OverflowPolicy;
use carpark_sim::{api, display, report, state};
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tracing::Level;

fn init_tracing(level: Level) {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let command = match cli::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(AppError::Usage(message)) => {
            eprintln!("{message}");
            std::process::exit(2);
        }
        Err(err) => return Err(err.into()),
    };

    let (config, source) = config::load(command.config_path().map(|path| path.as_path()))?;
    init_tracing(config.log_level()?);
    tracing::info!(app = %config.app.name, "carpark-sim starting");
    match source {
        ConfigSource::File(path) => tracing::info!(path = %path.display(), "Loaded config"),
        ConfigSource::BuiltinDefaults => tracing::info!(
            path = config::DEFAULT_CONFIG_PATH,
            "Config file not found, using built-in defaults"
        ),
    }

    match command {
        Command::Run(args) => run_once(&config, args)?,
        Command::Serve { .. } => serve(config)?,
    }
    Ok(())
}

fn run_once(config: &Config, args: RunArgs) -> Result<(), AppError> {
    let simulation = SimulationConfig::new(args.arrival_rate, args.service_time, args.spaces)?;
    let mut settings = config.simulation.clone();
    if args.blocking {
        settings.policy = OverflowPolicy::Block;
    }
    let seed = resolve_seed(args.seed.or(settings.seed));

    let report = report::run_and_report(simulation, settings, seed);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", display::render_text(&report));
    }
    Ok(())
}

#[tokio::main]
async fn serve(config: Config) -> Result<(), AppError> {
    let state = Arc::new(RwLock::new(state::AppState::new(config.simulation.clone())));
    let app = api::router(state);
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::config;

    #[test]
    fn default_config_is_valid_toml() -> Result<(), Box<dyn std::error::Error>> {
        let _config = config::load_default()?;
        Ok(())
    }
}
