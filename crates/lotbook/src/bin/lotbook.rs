//! lotbook - FIFO gains, tax terms and allocations for equity trades.

fn main() -> std::process::ExitCode {
    lotbook::cmd::main()
}
