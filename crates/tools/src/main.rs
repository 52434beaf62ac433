use clap::Parser;
use tools::Cli;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), tools::ToolError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let out = pollster::block_on(tools::run(&cli))?;
    println!("{out}");
    Ok(())
}
