//! Command line interface to chessnote.
//!
//! `chessnote format` and `chessnote parse` convert a sequence of moves in one
//! go, starting from `--fen`. Without a subcommand an interactive session
//! reads moves from stdin and prints their notation.

use std::io::{self, Write};
use std::process::ExitCode;

use chessnote_core::coretypes::Move;
use chessnote_core::error::{self, ErrorKind};
use chessnote_core::fen::{Fen, START_FEN};
use chessnote_core::{san, Position, Rules};
use clap::{command, Arg, ArgAction, ArgMatches, Command};
use log::error;

fn main() -> ExitCode {
    env_logger::init();

    let matches = create_command().get_matches();
    let fen = matches
        .get_one::<String>("fen")
        .expect("'fen' has a default value");
    let position = match Position::parse_fen(fen) {
        Ok(position) => position,
        Err(err) => {
            error!("Failed to read position '{fen}'. Inner error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let result = match matches.subcommand() {
        Some(("format", args)) => handle_format_subcommand(position, values(args, "moves")),
        Some(("parse", args)) => handle_parse_subcommand(position, values(args, "tokens")),
        Some((_, _)) => unreachable!("clap should prevent coming to this branch"),
        None => run_interactive(position).map_err(|err| error!("Failed to read stdin: {err}")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(()) => ExitCode::FAILURE,
    }
}

fn create_command() -> Command {
    command!()
        .arg(
            Arg::new("fen")
                .long("fen")
                .global(true)
                .default_value(START_FEN)
                .help("position the first move is played from"),
        )
        .subcommand(
            Command::new("format")
                .about("print the algebraic notation of coordinate moves, eg e2e4 e7e8q")
                .arg(Arg::new("moves").required(true).action(ArgAction::Append)),
        )
        .subcommand(
            Command::new("parse")
                .about("print the coordinate move of algebraic notation tokens, eg Nf3 O-O")
                .arg(Arg::new("tokens").required(true).action(ArgAction::Append)),
        )
}

fn values<'a>(args: &'a ArgMatches, id: &str) -> Vec<&'a String> {
    args.get_many::<String>(id)
        .map(|values| values.collect())
        .unwrap_or_default()
}

fn handle_format_subcommand(mut position: Position, moves: Vec<&String>) -> Result<(), ()> {
    for input in moves {
        let move_: Move = match input.parse() {
            Ok(move_) => move_,
            Err(err) => {
                error!("Failed to read move '{input}'. Inner error: {err}");
                return Err(());
            }
        };
        match san::format(&position, move_) {
            Ok(token) => println!("{token}"),
            Err(err) => {
                error!("Failed to format move '{input}'. Inner error: {err}");
                return Err(());
            }
        }
        position = position.make_move(move_);
    }
    Ok(())
}

/// Resolves `token` to a legal move. Castling tokens decode from the side to
/// move alone, so the board has the final say.
fn parse_legal(position: &Position, token: &str) -> error::Result<Move> {
    let move_ = san::parse(position, token)?;
    match position.legal_moves().contains(&move_) {
        true => Ok(move_),
        false => Err((ErrorKind::SanIllegalMove, format!("{token} ({move_})")).into()),
    }
}

fn handle_parse_subcommand(mut position: Position, tokens: Vec<&String>) -> Result<(), ()> {
    for token in tokens {
        match parse_legal(&position, token) {
            Ok(move_) => {
                println!("{move_}");
                position = position.make_move(move_);
            }
            Err(err) => {
                error!("Failed to parse token '{token}'. Inner error: {err}");
                return Err(());
            }
        }
    }
    Ok(())
}

enum InputKind<'a> {
    Exit,
    Newgame,
    Help,
    Moves,
    Fen(&'a str),
    Error,
    GameMove(Move),
    Token(&'a str),
}

impl<'a> From<&'a str> for InputKind<'a> {
    fn from(s: &'a str) -> Self {
        if let Ok(move_) = s.parse() {
            return Self::GameMove(move_);
        }
        match s.split_once(' ') {
            Some(("fen", fen)) => Self::Fen(fen.trim()),
            Some(_) => Self::Error,
            None => match s {
                "exit" => Self::Exit,
                "newgame" | "ng" => Self::Newgame,
                "help" => Self::Help,
                "moves" => Self::Moves,
                "" => Self::Error,
                token => Self::Token(token),
            },
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("newgame | ng => Begin a new game from the start position.");
    println!("fen <FEN> => Continue from the given position.");
    println!("moves => List all legal moves in algebraic notation.");
    println!("help => Print this help text.");
    println!("exit => End the session.");
    println!("\nTo make a move, enter it in algebraic notation or coordinate form.");
    println!("Examples: Nf3, exd5, O-O, e8=Q, d2d4, e7e8n");
}

fn run_interactive(mut position: Position) -> io::Result<()> {
    println!("chessnote {}\n", env!("CARGO_PKG_VERSION"));
    let mut input = String::new();

    loop {
        println!("{position}");
        print!("> ");
        io::stdout().flush()?;
        input.clear();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }

        let move_ = match InputKind::from(input.trim()) {
            InputKind::Exit => break,
            InputKind::Newgame => {
                position = Position::start_position();
                println!("Starting new game...");
                continue;
            }
            InputKind::Help => {
                print_help();
                continue;
            }
            InputKind::Moves => {
                let tokens: Vec<String> = position
                    .legal_moves()
                    .into_iter()
                    .filter_map(|move_| san::format(&position, move_).ok())
                    .collect();
                println!("{}", tokens.join(" "));
                continue;
            }
            InputKind::Fen(fen) => {
                match Position::parse_fen(fen) {
                    Ok(new_position) => position = new_position,
                    Err(err) => println!("Invalid fen: {err}"),
                }
                continue;
            }
            InputKind::Error => {
                println!("Invalid command: {}", input.trim());
                continue;
            }
            InputKind::GameMove(move_) => move_,
            InputKind::Token(token) => match parse_legal(&position, token) {
                Ok(move_) => move_,
                Err(err) => {
                    println!("{err}");
                    continue;
                }
            },
        };

        match san::format(&position, move_) {
            Ok(token) => println!("{token} ({move_})"),
            Err(err) => {
                println!("{err}. No action taken.");
                continue;
            }
        }
        position = position.make_move(move_);

        if position.is_checkmate() {
            println!("CHECKMATE. Enter newgame or fen to continue.");
        } else if position.is_stalemate() {
            println!("STALEMATE. Enter newgame or fen to continue.");
        }
    }
    Ok(())
}
