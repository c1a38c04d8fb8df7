use std::process::ExitCode;

use archivist_cli::{finish, run_dir_archive, DirArchiveArgs, LoggingContext};
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let args = DirArchiveArgs::parse();
    let _logging = LoggingContext::init(&args.common);
    finish(run_dir_archive(args).await)
}
