use tracesim::{
    emulator::{Emulator, WordMemory},
    symbolic::Program,
};

use clap::{App, Arg, ArgMatches};
use slog::{o, Drain, Logger};
use slog_term::{FullFormat, TermDecorator};

const DEFAULT_SOURCE: &str = "PP3_input.txt";

enum Error {
    IO(std::io::Error),
    InvalidArgument(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::IO(e)
    }
}

fn parse_arguments() -> ArgMatches<'static> {
    App::new("tracesimrun")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Mitja Karhusaari <mitja@karhusaari.me>")
        .about("Executes a program and prints the machine state after every instruction")
        .arg(Arg::with_name("source")
             .help("File containing the program source")
             .value_name("SOURCE")
             .default_value(DEFAULT_SOURCE)
             .index(1))
        .arg(Arg::with_name("verbose")
             .help("Enables verbose logging")
             .long("verbose")
             .short("v"))
        .arg(Arg::with_name("max-steps")
             .help("Stops after executing this many instructions")
             .long("max-steps")
             .value_name("N")
             .takes_value(true))
        .get_matches()
}

fn logger(verbose: bool) -> Option<Logger> {
    if !verbose {
        return None;
    }

    let decorator = TermDecorator::new().stderr().build();
    let drain = FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    Some(Logger::root(drain, o!()))
}

fn main() {
    let args = parse_arguments();

    let file_path = args.value_of("source").unwrap_or(DEFAULT_SOURCE);

    println!("Simple Assembly Simulator");

    match run(&args, file_path) {
        Ok(()) => println!("\nSimulation complete."),
        Err(Error::IO(error)) => {
            eprintln!("Error: Cannot open {}", file_path);

            if args.is_present("verbose") {
                eprintln!("{}", error);
            }

            std::process::exit(1);
        },
        Err(Error::InvalidArgument(message)) => {
            eprintln!("Error: {}", message);
            std::process::exit(2);
        },
    }
}

fn run(args: &ArgMatches, file_path: &str) -> Result<(), Error> {
    let max_steps = match args.value_of("max-steps") {
        None => None,
        Some(value) => Some(value.parse::<usize>()
            .map_err(|_| Error::InvalidArgument(format!("invalid step count '{}'", value)))?),
    };

    let logger = logger(args.is_present("verbose"));
    let program = load(file_path, logger.clone())?;
    let mut emulator = Emulator::with_logger(program, WordMemory::default(), logger);

    let mut steps = 0;

    while max_steps.map_or(true, |max| steps < max) {
        match emulator.step() {
            Some(trace) => println!("{}", trace),
            None => break,
        }

        steps += 1;
    }

    Ok(())
}

fn load(file_path: &str, logger: Option<Logger>) -> Result<Program, Error> {
    let source = std::fs::read_to_string(file_path)?;
    Ok(Program::parse_with_logger(&source, logger))
}
