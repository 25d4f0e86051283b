use simplelog::{
    ColorChoice, Config, LevelFilter, SimpleLogger, TermLogger, TerminalMode,
};
use structopt::StructOpt;

use extractor::export_to_json::ExportToJsonCommand;
use extractor::extract::ExtractCommand;
use extractor::extract_all::ExtractAllCommand;

#[derive(StructOpt)]
#[structopt(about = "Facetex face pixel extractor")]
struct Opts {
    #[structopt(
        help = "Enable verbose logging",
        global = true,
        long,
        short = "v"
    )]
    verbose: bool,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
enum Command {
    Extract(ExtractCommand),
    ExtractAll(ExtractAllCommand),
    ExportToJson(ExportToJsonCommand),
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let config = Config::default();
    if TermLogger::init(
        level,
        config,
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .is_err()
    {
        let _ = SimpleLogger::init(level, Config::default());
    }
}

fn main() {
    let opts = Opts::from_args();

    init_logging(opts.verbose);

    let res = match &opts.command {
        Command::Extract(command) => command.run(),
        Command::ExtractAll(command) => command.run(),
        Command::ExportToJson(command) => command.run(),
    };

    if let Err(err) = res {
        eprintln!("error: {:?}", err);
        std::process::exit(1);
    }
}
