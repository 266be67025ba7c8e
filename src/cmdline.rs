use crate::interpreter::{self, Interpreter};
use ansi_term::Colour::Red;
use linefeed::{DefaultTerminal, Interface, ReadResult, Terminal};
use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const USAGE: &str = "usage: monkie [FILE]
    with no FILE, start an interactive session
    -h, --help    print this message";

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Usage(String),
    Script(interpreter::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Usage(problem) => write!(f, "{}\n{}", problem, USAGE),
            Error::Script(e @ interpreter::Error::Parse(_)) => write!(f, "{}", e),
            Error::Script(e) => write!(f, "Error Occured: {}", e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl std::error::Error for Error {}

pub fn setup() -> io::Result<Interface<DefaultTerminal>> {
    let interface = Interface::new("monkie")?;
    interface.set_prompt(">> ")?;
    if let Some(path) = history_path() {
        interface.load_history(path).ok();
    };
    Ok(interface)
}

fn history_path() -> Option<PathBuf> {
    dirs::data_dir().map(|mut path| {
        path.push(".monkie_history");
        path
    })
}

pub fn save_history<T: Terminal>(interface: &Interface<T>) -> io::Result<()> {
    match history_path() {
        Some(path) => interface.save_history(path),
        None => Ok(()),
    }
}

fn is_exit(line: &str) -> bool {
    line.trim() == "exit"
}

/// Evaluates one line and renders the outcome, painting failures red when
/// `colour` is set.
pub fn respond(interpreter: &Interpreter, line: &str, colour: bool) -> String {
    match interpreter.run(line) {
        Ok(value) => value.to_string(),
        Err(e) if colour => Red.paint(e.render()).to_string(),
        Err(e) => e.render(),
    }
}

pub fn repl<T: Terminal>(interface: &Interface<T>, mut processor: impl FnMut(&str) -> String) {
    loop {
        match interface.read_line() {
            Ok(ReadResult::Eof) => break,
            Ok(ReadResult::Signal(sig)) => {
                writeln!(interface, "Received signal {:?}", sig).ok();
            }
            Ok(ReadResult::Input(line)) => {
                if is_exit(&line) {
                    break;
                }
                if line.trim().is_empty() {
                    continue;
                }
                interface.add_history_unique(line.clone());
                writeln!(interface, "{}", processor(&line)).ok();
            }
            Err(e) => {
                writeln!(interface, "Error: {}", e).ok();
                break;
            }
        }
    }
}

/// The loop used when stdin is not a terminal: no prompt, no history.
pub fn plain_repl(
    input: impl BufRead,
    mut output: impl Write,
    mut processor: impl FnMut(&str) -> String,
) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        if is_exit(&line) {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        writeln!(output, "{}", processor(&line))?;
    }
    Ok(())
}

fn interactive() -> Result<(), Error> {
    let interpreter = Interpreter::new();
    let colour = atty::is(atty::Stream::Stdout);
    log::info!("starting session");
    if atty::is(atty::Stream::Stdin) {
        let interface = setup()?;
        repl(&interface, |line| respond(&interpreter, line, colour));
        save_history(&interface)?;
    } else {
        let stdin = io::stdin();
        plain_repl(stdin.lock(), io::stdout(), |line| {
            respond(&interpreter, line, colour)
        })?;
    }
    log::info!("session finished");
    Ok(())
}

pub fn run_file(path: &str) -> Result<(), Error> {
    log::info!("running {}", path);
    let source = std::fs::read_to_string(path)?;
    Interpreter::new().run(&source).map_err(Error::Script)?;
    Ok(())
}

pub fn launch(args: Vec<String>) -> Result<(), Error> {
    match args.get(1..).unwrap_or_default() {
        [] => interactive(),
        [flag] if flag == "-h" || flag == "--help" => {
            println!("{}", USAGE);
            Ok(())
        }
        [path] => run_file(path),
        _ => Err(Error::Usage("too many arguments".into())),
    }
}
