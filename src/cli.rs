use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)] // requires `derive` feature
#[command(name = "dclean")]
#[command(about = "A simple and powerful directory archiving tool", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to ./dclean.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Archive old directories by copying or zipping them
    Archive(ArchiveArgs),
    /// List top-level directories and whether they are old enough to archive
    Scan(ScanArgs),
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// Days since the last modification before a directory counts as old
    #[arg(short, long)]
    pub days: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ArchiveArgs {
    #[command(flatten)]
    pub scan: ScanArgs,

    /// Zip each directory (the default)
    #[arg(short, long, overrides_with = "no_zip")]
    pub zip: bool,

    /// Copy directories into the archive instead of zipping them
    #[arg(long, overrides_with = "zip")]
    pub no_zip: bool,

    /// Remove dependency caches such as node_modules before archiving
    #[arg(long, alias = "remove-node-modules")]
    pub remove_dependency_caches: bool,

    /// Archive every top-level directory regardless of age
    #[arg(short, long)]
    pub all: bool,

    /// Answer yes to every prompt, including deleting the originals
    #[arg(short, long)]
    pub yes: bool,
}

impl ArchiveArgs {
    pub fn use_zip(&self) -> bool {
        !self.no_zip
    }
}
