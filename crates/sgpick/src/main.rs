use std::process::ExitCode;

use sgpick::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    sgpick::init(cli.verbose);
    sgpick::run(cli).into()
}
