use anyhow::Context;
use clap::Parser;

mod app;
mod beep;
mod interpreter;
mod keymap;
mod machine;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// ROM file to load
    #[clap(value_parser)]
    filename: String,
}

fn main() -> Result<(), anyhow::Error> {
    // parse command-line arguments
    let cli = Cli::parse();

    // open the rom file
    let rom = std::fs::File::open(&cli.filename)
        .with_context(|| format!("error opening rom file: {}", &cli.filename))?;

    // load the rom into a fresh machine
    let machine = machine::Machine::load_rom(rom).context("error loading rom")?;

    // run
    app::run(interpreter::Interpreter::new(machine))?;
    Ok(())
}
