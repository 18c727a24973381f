use clap::Parser;
use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use goldrush::{
    controllers::ControllerConfig,
    errors::{GoldrushError, GoldrushErrorTypes, GoldrushResult},
    harness::Harness,
    simulator::Simulator,
};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Scenario configuration (arena, time, logs)
    #[arg(short, long, default_value = "games/two_colours_assignment.yaml")]
    config: PathBuf,
    /// Print the loaded configuration before running
    #[arg(long, default_value_t = false)]
    show_config: bool,
    /// Controller configuration files, one per robot. Asked interactively if absent.
    controller_configs: Vec<PathBuf>,
}

/// Split a comma separated list of files, ignoring blanks.
fn parse_controller_list(line: &str) -> Vec<PathBuf> {
    line.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn prompt_controllers<R: BufRead>(input: &mut R) -> GoldrushResult<Vec<PathBuf>> {
    loop {
        print!("Enter the names of the controller files to run, separated by commas: ");
        io::stdout().flush().ok();
        let mut line = String::new();
        let read = input.read_line(&mut line).map_err(|e| {
            GoldrushError::new(
                GoldrushErrorTypes::UnknownError,
                format!("Cannot read the controller files: {e}"),
            )
        })?;
        if read == 0 {
            return Err(GoldrushError::new(
                GoldrushErrorTypes::ConfigError,
                "No controller file given".to_string(),
            ));
        }
        let paths = parse_controller_list(&line);
        if !paths.is_empty() {
            return Ok(paths);
        }
    }
}

fn doit(args: Cli) -> GoldrushResult<()> {
    let simulator = Simulator::from_config_path(&args.config)?;
    if args.show_config {
        simulator.show();
    }

    let controller_paths = if args.controller_configs.is_empty() {
        prompt_controllers(&mut io::stdin().lock())?
    } else {
        args.controller_configs
    };
    let controllers = controller_paths
        .iter()
        .map(|path| ControllerConfig::load_from_path(path))
        .collect::<GoldrushResult<Vec<_>>>()?;

    let mut harness = Harness::new(
        simulator, None, //<- plugin API, to load external controllers
    );
    let summary = harness.run(&controllers)?;
    for report in &summary.controllers {
        log::info!(
            "{}: {}",
            report.name,
            if report.finished {
                "finished".to_string()
            } else {
                report.error.clone().unwrap_or_default()
            }
        );
    }
    if !summary.stragglers.is_empty() {
        println!(
            "WARNING: {} robot controller threads still active.",
            summary.stragglers.len()
        );
        println!("They stop at their next motion, the simulation is over.");
    }
    Ok(())
}

fn main() {
    let args = Cli::parse();

    if let Err(e) = doit(args) {
        println!("{}", e.detailed_error());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn controller_list_is_split_on_commas() {
        assert_eq!(
            parse_controller_list(" a.yaml, b.yaml ,,c.yaml\n"),
            vec![
                PathBuf::from("a.yaml"),
                PathBuf::from("b.yaml"),
                PathBuf::from("c.yaml")
            ]
        );
        assert!(parse_controller_list(" , \n").is_empty());
    }

    #[test]
    fn prompt_repeats_until_an_answer() {
        let mut input = Cursor::new("\n  \nrobot.yaml\n");
        assert_eq!(
            prompt_controllers(&mut input).unwrap(),
            vec![PathBuf::from("robot.yaml")]
        );
        let mut input = Cursor::new("\n");
        assert!(prompt_controllers(&mut input).is_err());
    }

    #[test]
    fn default_arguments() {
        let cli = Cli::parse_from(["goldrush"]);
        assert_eq!(cli.config, PathBuf::from("games/two_colours_assignment.yaml"));
        assert!(cli.controller_configs.is_empty());
        let cli = Cli::parse_from(["goldrush", "-c", "arena.yaml", "a.yaml", "b.yaml"]);
        assert_eq!(cli.config, PathBuf::from("arena.yaml"));
        assert_eq!(cli.controller_configs.len(), 2);
    }
}
