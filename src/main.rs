use nsrouter::cli::run_cli;

fn main() -> anyhow::Result<()> {
    run_cli()
}
