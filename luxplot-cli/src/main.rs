mod command;

use std::fs::File;
use std::process::ExitCode;

use luxplot_core::config::Config;
use luxplot_core::dispatch::dispatch_action;
use luxplot_core::state::persistence::{load_document, save_document};
use luxplot_core::state::Session;

use command::{Invocation, Parsed};

fn init_logging(verbose: bool) {
    use simplelog::{LevelFilter, WriteLogger};

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("luxplot")
        .join("luxplot.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path)
        .or_else(|_| File::create(std::env::temp_dir().join("luxplot.log")))
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("luxplot: cannot create log file: {}", e);
            return;
        }
    };

    if let Err(e) = WriteLogger::init(log_level, simplelog::Config::default(), log_file) {
        eprintln!("luxplot: cannot initialise logging: {}", e);
        return;
    }

    log::info!("luxplot starting (log level: {:?})", log_level);
}

fn run(invocation: &Invocation) -> luxplot_core::Result<()> {
    let config = Config::load();
    let mut session = Session::from_config(&config);
    if invocation.file.exists() {
        session.document = load_document(&invocation.file)?;
    } else {
        log::info!("{} does not exist, starting a new plot", invocation.file.display());
    }

    let result = dispatch_action(&invocation.action, &mut session)?;
    for line in &result.lines {
        println!("{}", line);
    }
    for warning in &result.warnings {
        eprintln!("warning: {}", warning);
    }

    if invocation.action.is_mutating() {
        save_document(&invocation.file, &session.document)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match command::parse_args(&args) {
        Ok(Parsed::Run(invocation)) => invocation,
        Ok(Parsed::Help) => {
            print!("{}", command::usage());
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("luxplot: {}", message);
            return ExitCode::from(2);
        }
    };
    init_logging(invocation.verbose);

    match run(&invocation) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:?} failed: {}", invocation.action, e);
            eprintln!("luxplot: {}", e);
            ExitCode::FAILURE
        }
    }
}
