use std::io::Write;
use std::str::FromStr;

use clap::{App, Arg, ArgMatches};
use edit_distance::edit_distance;
use slog::{debug, o, Discard, Drain, Logger};
use slog_term::{FullFormat, TermDecorator};

use tracesim::{
    emulator::{Emulator, Memory, WordMemory},
    instruction::Register,
    symbolic::{Parser, Program},
};

const COMMANDS: &[&str] = &[
    "help",
    "regs",
    "registers",
    "reg",
    "register",
    "flags",
    "mem",
    "memory",
    "labels",
    "pi",
    "print_instruction",
    "reset",
];

#[derive(Debug)]
enum CommandError {
    InvalidFormat,
    UnknownCommand {
        command: String,
        suggestion: Option<&'static str>,
    },
    InvalidRegister(String),
}

impl ::std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            CommandError::InvalidFormat => write!(f, "invalid format"),
            CommandError::UnknownCommand { command, suggestion: Some(suggestion) } => {
                write!(f, "unknown command '{}', did you mean '.{}'?", command, suggestion)
            }
            CommandError::UnknownCommand { command, suggestion: None } => {
                write!(f, "unknown command '{}', type .help for a list of commands", command)
            }
            CommandError::InvalidRegister(register) => write!(f, "invalid register {}", register),
        }
    }
}

struct REPL {
    emulator: Emulator<WordMemory>,
    parser: Parser,
    logger: Logger,
}

impl REPL {
    fn new() -> REPL {
        REPL {
            emulator: Emulator::load(Program::default()),
            parser: Parser::new(),
            logger: Logger::root(Discard, o!()),
        }
    }

    fn set_logger(&mut self, logger: Logger) {
        self.logger = logger.clone();
        self.parser = Parser::new().with_logger(logger.clone());
        self.emulator.set_logger(logger);
    }

    fn suggest(command: &str) -> Option<&'static str> {
        COMMANDS
            .iter()
            .map(|candidate| (edit_distance(command, candidate), *candidate))
            .min()
            .filter(|(distance, _)| *distance <= 2)
            .map(|(_, candidate)| candidate)
    }

    fn handle_command(&mut self, command: &str) -> Result<(), CommandError> {
        let command = command.trim();

        let cmd = command
            .split(char::is_whitespace)
            .next()
            .filter(|cmd| !cmd.is_empty())
            .ok_or(CommandError::InvalidFormat)?;

        let rest = command[cmd.len()..].trim();
        let args: Vec<_> = rest.split_whitespace().collect();

        match (cmd, args.as_slice()) {
            ("help", _) => {
                println!("Available commands:");
                println!("  .regs, .registers                    List all registers and their values");
                println!("  .reg <reg>, .register <reg>          Print the value of a register");
                println!("  .flags                               Print the NZCV flags");
                println!("  .mem, .memory                        List all memory words and their addresses");
                println!("  .labels                              List all labels and the instructions they point to");
                println!("  .pi <ins>, .print_instruction <ins>  Print the decoded instruction");
                println!("  .reset                               Clear registers, flags and memory");
            }
            ("regs", _) | ("registers", _) => {
                for register in Register::ALL.iter() {
                    println!("Register {} = 0x{:X}", register, self.emulator.context.r[register.index()]);
                }
            }
            ("reg", [register]) | ("register", [register]) => {
                let register = Register::from_str(register)
                    .map_err(|_| CommandError::InvalidRegister(register.to_string()))?;

                println!("Register {} = 0x{:X}", register, self.emulator.context.r[register.index()]);
            }
            ("flags", _) => {
                println!("NZCV: {}", self.emulator.context.flags);
            }
            ("mem", _) | ("memory", _) => {
                let memory = &self.emulator.memory;
                println!("Memory window at 0x{:X}:", memory.base());

                for (slot, word) in memory.words().iter().enumerate() {
                    println!("0x{:X} = 0x{:X}", memory.address_of(slot), word);
                }
            }
            ("labels", _) => {
                let labels = &self.emulator.program.labels;

                if labels.is_empty() {
                    println!("No labels defined");
                    return Ok(());
                }

                println!("{} label(s):", labels.len());

                for (label, index) in self.emulator.program.labels.iter() {
                    let text = self.emulator.program
                        .get(index)
                        .map(|ins| ins.text.as_str())
                        .unwrap_or("");

                    println!("Label '{}' @ {} = {}", label, index, text);
                }
            }
            ("print_instruction", _) | ("pi", _) => {
                let mut scratch = Program::default();

                match self.parser.decode_line(rest, &mut scratch).and_then(|i| scratch.get(i)) {
                    Some(ins) if !ins.opcode.is_recognized() => {
                        println!("{:?}", ins);
                        println!("Unrecognized opcode, the instruction does nothing");
                    }
                    Some(ins) => println!("{:?}", ins),
                    None => println!("Nothing to decode"),
                }
            }
            ("reset", _) => {
                self.emulator.reset();
                self.emulator.context.pc = self.emulator.program.len();
            }
            (cmd, _) if COMMANDS.contains(&cmd) => return Err(CommandError::InvalidFormat),
            (cmd, _) => {
                return Err(CommandError::UnknownCommand {
                    command: cmd.to_string(),
                    suggestion: REPL::suggest(cmd),
                });
            }
        }

        Ok(())
    }

    fn run(&mut self) {
        println!("Type .help for a list of all available commands or start typing instructions");

        loop {
            print!("{}> ", self.emulator.program.len());
            let _ = ::std::io::stdout().flush();

            let mut input = String::new();

            match ::std::io::stdin().read_line(&mut input) {
                Ok(0) => break,
                Ok(_) => (),
                Err(err) => {
                    eprintln!("Error: {}", err);
                    break;
                }
            }

            if let Err(err) = self.handle_line(&input) {
                eprintln!("Error: {}", err);
            }
        }
    }

    fn handle_line(&mut self, input: &str) -> Result<(), CommandError> {
        let input = input.trim_end_matches(|c| c == '\n' || c == '\r');

        if let Some(command) = input.trim_start().strip_prefix('.') {
            return self.handle_command(command);
        }

        let index = match self.parser.decode_line(input, &mut self.emulator.program) {
            Some(index) => index,
            None => return Ok(()),
        };

        debug!(self.logger, "appended instruction"; "index" => index);

        while let Some(trace) = self.emulator.step() {
            println!("{}", trace);
        }

        Ok(())
    }
}

fn parse_args() -> ArgMatches<'static> {
    App::new("tracesimrepl")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Mitja Karhusaari <mitja@karhusaari.me>")
        .about("Read-Evaluate-Print-Loop utility for the tracing interpreter")
        .arg(
            Arg::with_name("verbose")
                .help("Enables verbose logging")
                .long("verbose")
                .short("v"),
        )
        .get_matches()
}

fn main() {
    let args = parse_args();

    let mut repl = REPL::new();

    if args.is_present("verbose") {
        let decorator = TermDecorator::new().stderr().build();
        let drain = FullFormat::new(decorator).build().fuse();
        let drain = slog_async::Async::new(drain).build().fuse();
        repl.set_logger(Logger::root(drain, o!()));
    }

    repl.run();
}
