use idlbridge::runtime::model::{InterfaceModel, LoadedModel};
use idlbridge::runtime::registry;
use idlbridge::taskmanager;
use idlbridge::{init_cli_logging, init_from_config, interface_symbols, namespace_symbols, BridgeConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info};

#[derive(Debug)]
enum Command {
    Check(Vec<PathBuf>),
    /// `None` lists the built-in TaskManager model
    Symbols(Option<PathBuf>),
}

#[derive(Debug)]
struct Cli {
    command: Command,
    config: Option<PathBuf>,
    verbose: bool,
}

impl Cli {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let prog = args.first().map(String::as_str).unwrap_or("idlbridge");

        let mut config = None;
        let mut verbose = false;
        let mut positional = Vec::new();

        let mut iter = args.iter().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--help" | "-h" => return Err(Self::usage(prog)),
                "--verbose" | "-v" => verbose = true,
                "--config" => {
                    let path = iter
                        .next()
                        .ok_or_else(|| format!("--config needs a path\n\n{}", Self::usage(prog)))?;
                    config = Some(PathBuf::from(path));
                }
                opt if opt.starts_with('-') => {
                    return Err(format!("Unknown option: {}\n\n{}", opt, Self::usage(prog)))
                }
                value => positional.push(value.to_string()),
            }
        }

        let mut positional = positional.into_iter();
        let command = match positional.next().as_deref() {
            Some("check") => {
                let files: Vec<PathBuf> = positional.map(PathBuf::from).collect();
                if files.is_empty() {
                    return Err("check: no model files specified".to_string());
                }
                Command::Check(files)
            }
            Some("symbols") => {
                let file = positional.next().map(PathBuf::from);
                if let Some(extra) = positional.next() {
                    return Err(format!("symbols: unexpected argument '{}'", extra));
                }
                Command::Symbols(file)
            }
            Some(other) => return Err(format!("Unknown command: {}\n\n{}", other, Self::usage(prog))),
            None => return Err(Self::usage(prog)),
        };

        Ok(Self { command, config, verbose })
    }

    fn usage(prog: &str) -> String {
        format!(
            "idlbridge - handle-based boundary bindings for IDL interfaces\n\n\
            USAGE:\n    {} [OPTIONS] <COMMAND>\n\n\
            COMMANDS:\n    \
            check <model.json>...   Validate and register interface models\n    \
            symbols [model.json]    List the C entry points of a model (default: TaskManager)\n\n\
            OPTIONS:\n    \
            -h, --help              Print help information\n    \
            -v, --verbose           Debug logging\n    \
            --config <path>         Use this idlbridge.toml instead of discovering one",
            prog
        )
    }
}

fn load_model(path: &Path) -> Result<LoadedModel, String> {
    let source = fs::read_to_string(path)
        .map_err(|e| format!("Error reading {}: {}", path.display(), e))?;
    let model = InterfaceModel::from_json(&source).map_err(|e| format!("{}: {}", path.display(), e))?;
    registry().load(&model).map_err(|e| format!("{}: {}", path.display(), e))
}

fn check(files: &[PathBuf]) -> usize {
    let mut failures = 0;
    for file in files {
        info!(file = %file.display(), "checking model");
        match load_model(file) {
            Ok(loaded) => println!(
                "{}: ok (namespace {}, {} interface(s), {} enum(s))",
                file.display(),
                if loaded.namespace.is_empty() { "<none>" } else { loaded.namespace.as_str() },
                loaded.interfaces.len(),
                loaded.enums.len()
            ),
            Err(message) => {
                error!(file = %file.display(), error = %message, "model rejected");
                eprintln!("{}", message);
                failures += 1;
            }
        }
    }
    failures
}

fn symbols(file: Option<&PathBuf>) -> Result<(), String> {
    let (namespace, interfaces) = match file {
        Some(path) => {
            let loaded = load_model(path)?;
            let ids: Vec<_> = loaded.interfaces.iter().map(|(_, id)| *id).collect();
            (loaded.namespace, ids)
        }
        None => {
            let ids = taskmanager::ids().map_err(|e| e.to_string())?;
            (
                "TaskManager".to_string(),
                vec![ids.task, ids.project, ids.manager],
            )
        }
    };

    for symbol in namespace_symbols(&namespace) {
        println!("{}", symbol);
    }
    for id in interfaces {
        let desc = registry()
            .interface(id)
            .ok_or_else(|| format!("interface {} vanished from the registry", id))?;
        println!();
        for symbol in interface_symbols(&namespace, &desc) {
            println!("{}", symbol);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::from_args() {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("{}", message);
            return ExitCode::FAILURE;
        }
    };

    let config = match &cli.config {
        Some(path) => BridgeConfig::load(path).map(Some),
        None => BridgeConfig::discover()
            .map(|path| BridgeConfig::load(&path))
            .transpose(),
    };
    let _guard = match config {
        Ok(Some(config)) if !cli.verbose => match init_from_config(&config) {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        Ok(config) => {
            if let Some(config) = config {
                config.apply();
            }
            init_cli_logging(cli.verbose)
        }
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    debug!(command = ?cli.command, "idlbridge starting");

    match &cli.command {
        Command::Check(files) => {
            let failures = check(files);
            if failures > 0 {
                eprintln!("\n{} of {} model(s) rejected", failures, files.len());
                return ExitCode::FAILURE;
            }
        }
        Command::Symbols(file) => {
            if let Err(message) = symbols(file.as_ref()) {
                eprintln!("{}", message);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
