use std::process::ExitCode;

use archivist_cli::{finish, run_mobi2archive, LoggingContext, Mobi2ArchiveArgs};
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Mobi2ArchiveArgs::parse();
    let _logging = LoggingContext::init(&args.common);
    finish(run_mobi2archive(args).await)
}
