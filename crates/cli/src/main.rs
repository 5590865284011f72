use std::process::ExitCode;

fn main() -> ExitCode {
    orderwatch_cli::run()
}
