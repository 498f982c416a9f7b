use std::process::ExitCode;

fn main() -> ExitCode {
    kronos_cli::run()
}
