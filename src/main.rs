mod cli;
mod logging;
mod reporter;

use std::process;
use std::time::SystemTime;

use clap::{CommandFactory, Parser};
use cli::{ArchiveArgs, Cli, Commands, ScanArgs};
use dclean::config::{self, AppConfig};
use dclean::scanner::scan_candidates;
use dclean::{ArchiveOptions, Archiver, AssumeYes, Confirm, Error, TerminalConfirm};
use dotenv::dotenv;
use reporter::ConsoleReporter;
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let app_config = match config::load_configuration(args.config.as_deref()) {
        Ok(app_config) => app_config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let result = match args.command {
        Some(Commands::Archive(archive_args)) => run_archive(&archive_args, &app_config),
        Some(Commands::Scan(scan_args)) => run_scan(&scan_args, &app_config),
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = result {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn options_from(scan_args: &ScanArgs, app_config: &AppConfig) -> ArchiveOptions {
    let mut options = ArchiveOptions::new(scan_args.path.clone(), app_config);
    if let Some(days) = scan_args.days {
        options.days = days;
    }
    options
}

fn run_archive(args: &ArchiveArgs, app_config: &AppConfig) -> anyhow::Result<()> {
    let mut options = options_from(&args.scan, app_config);
    options.use_zip = args.use_zip();
    options.remove_dependency_caches = args.remove_dependency_caches;
    options.archive_all = args.all;

    info!(
        "Archiving directories under {} not modified in the last {} days",
        options.root.display(),
        options.days
    );

    let mut confirm: Box<dyn Confirm> = if args.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalConfirm)
    };

    let archiver = Archiver::new(options);
    match archiver.run(confirm.as_mut(), &ConsoleReporter::new()) {
        Ok(_) => Ok(()),
        Err(Error::UserAborted) => {
            println!("Archiving cancelled.");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn run_scan(args: &ScanArgs, app_config: &AppConfig) -> anyhow::Result<()> {
    let options = options_from(args, app_config);
    println!(
        "Scanning {} for directories not updated in the last {} days",
        options.root.display(),
        options.days
    );

    let statuses = scan_candidates(&options, SystemTime::now())?;
    reporter::print_statuses(&statuses);

    let old = statuses.iter().filter(|s| s.is_eligible()).count();
    println!("{} of {} directories are old enough to archive", old, statuses.len());
    Ok(())
}
