use clap::{Parser, Subcommand};
use glam::Vec2;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use hideandseek::cli::commands::{self, RunOptions};
use hideandseek::config::level::LevelParams;
use hideandseek::config::simulation::SimulationConfig;
use hideandseek::persistence;
use hideandseek::world::generation::{generate_level, print_level_summary};

#[derive(Parser)]
#[command(name = "hideandseek")]
#[command(about = "Headless driver for the hide-and-seek survival simulation")]
#[command(version)]
struct Cli {
    /// Path to the simulation configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a level from parameters and save it
    Generate {
        /// Path to level parameters file
        #[arg(short, long, default_value = "level.toml")]
        level: String,

        /// Output directory for saved levels
        #[arg(short, long, default_value = "levels")]
        output: String,
    },

    /// Run a level headlessly, printing frames as JSON
    Run {
        /// Saved level file, or a `.toml` parameters file to generate from.
        /// Defaults to the newest level in --levels-dir.
        #[arg(short, long)]
        level: Option<String>,

        #[arg(long, default_value = "levels")]
        levels_dir: String,

        /// Maximum number of ticks to run
        #[arg(short, long, default_value_t = 3600)]
        ticks: u64,

        /// Print a frame every N ticks (0 for none)
        #[arg(long, default_value_t = 60)]
        frame_every: u64,

        /// Joystick input held for the whole run
        #[arg(long, num_args = 2, value_names = ["DX", "DY"], allow_negative_numbers = true)]
        input: Option<Vec<f32>>,
    },

    /// Show a saved level
    Inspect {
        /// Path to the level file
        file: String,

        /// Also draw the terrain map
        #[arg(long)]
        map: bool,
    },

    /// Manage saved levels
    Levels {
        #[command(subcommand)]
        action: LevelAction,
    },
}

#[derive(Subcommand)]
enum LevelAction {
    /// List saved levels
    List {
        #[arg(short, long, default_value = "levels")]
        dir: String,
    },
}

fn load_config(path: &str) -> SimulationConfig {
    let path = Path::new(path);
    if !path.exists() {
        return SimulationConfig::default();
    }
    match SimulationConfig::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(log_level: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

fn main() {
    let cli = Cli::parse();
    let config = load_config(&cli.config);
    init_tracing(&config.log_level, cli.log_json);

    match cli.command {
        Commands::Generate { level, output } => {
            let params = match LevelParams::from_file(Path::new(&level)) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("Error loading level parameters: {}", e);
                    std::process::exit(1);
                }
            };
            println!("Generating level from {}...", level);
            let generated = match generate_level(&params) {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("Cannot generate level: {}", e);
                    std::process::exit(1);
                }
            };
            print_level_summary(&generated);

            match persistence::save_level(&generated, Path::new(&output)) {
                Ok(path) => println!("\nLevel saved to {}", path.display()),
                Err(e) => {
                    eprintln!("Cannot save level: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Run {
            level,
            levels_dir,
            ticks,
            frame_every,
            input,
        } => {
            let loaded = match commands::load_level_source(level.as_deref(), Path::new(&levels_dir))
            {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            };
            let input = match input.as_deref() {
                Some([dx, dy]) => Vec2::new(*dx, *dy),
                _ => Vec2::ZERO,
            };
            let options = RunOptions {
                max_ticks: ticks,
                frame_every,
                input,
            };
            match commands::run_headless(&config, loaded, &options) {
                Ok(stats) => commands::print_run_summary(&stats),
                Err(e) => {
                    eprintln!("Simulation error: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Inspect { file, map } => {
            if let Err(e) = commands::inspect(Path::new(&file), map) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }

        Commands::Levels { action } => match action {
            LevelAction::List { dir } => {
                let levels_dir = Path::new(&dir);
                match persistence::list_levels(levels_dir) {
                    Ok(levels) => {
                        if levels.is_empty() {
                            println!("No levels found in {}", levels_dir.display());
                        } else {
                            println!("{:<40} {:>20} {:>10}", "File", "Seed", "Size");
                            println!("{}", "-".repeat(72));
                            for l in &levels {
                                let name = l
                                    .path
                                    .file_name()
                                    .and_then(|n| n.to_str())
                                    .unwrap_or("?");
                                println!(
                                    "{:<40} {:>20} {:>7} KB",
                                    name,
                                    l.seed,
                                    l.file_size / 1024
                                );
                            }
                            println!("\n{} level(s) in {}", levels.len(), levels_dir.display());
                        }
                    }
                    Err(e) => {
                        eprintln!("Error listing levels: {}", e);
                        std::process::exit(1);
                    }
                }
            }
        },
    }
}
