//! plainledger - Plain-text double-entry accounting reports.

fn main() -> std::process::ExitCode {
    plainledger::cmd::main()
}
