use std::process::ExitCode;

fn main() -> ExitCode {
    cotibot_cli::run()
}
