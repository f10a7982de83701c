//! The `clubench` binary.

fn main() -> anyhow::Result<()> {
    clubench_cli::run()
}
