//! BatchBench binary entry point.

fn main() -> anyhow::Result<()> {
    batchbench_cli::run()
}
