use blockstate_core::{cli::Cli, logging};
use blockstate_hal::LinuxHal;
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut stdout = std::io::stdout().lock();
    match blockstate_core::run(cli, LinuxHal::new(), &mut stdout) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            log::error!("{:#}", err);
            eprintln!("Error: {:#}", err);
            std::process::exit(1);
        }
    }
}
