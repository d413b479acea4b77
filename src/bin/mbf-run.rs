use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use rust_mbf::{
    BracketStrategy, ByteSource, HaltPolicy, Machine, MachineConfig, ReaderSource, WriterSink,
};
use std::fs;
use std::io::{self, IsTerminal, StdinLock, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum HaltArg {
    FirstFinished,
    AllFinished,
}

impl From<HaltArg> for HaltPolicy {
    fn from(value: HaltArg) -> Self {
        match value {
            HaltArg::FirstFinished => HaltPolicy::FirstFinished,
            HaltArg::AllFinished => HaltPolicy::AllFinished,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "mbf-run")]
#[command(about = "Run a tape program split round-robin across N processors", long_about = None)]
struct Args {
    /// Path to the program source
    program: Option<PathBuf>,

    /// Inline program source (instead of a file)
    #[arg(short, long, conflicts_with = "program")]
    eval: Option<String>,

    /// Number of processors to partition the program across
    #[arg(short = 'n', long, default_value_t = 1)]
    processors: usize,

    /// When the round-robin run stops
    #[arg(long, value_enum, default_value_t = HaltArg::FirstFinished)]
    halt: HaltArg,

    /// Resolve brackets from a precomputed table instead of scanning
    #[arg(long, action = ArgAction::SetTrue)]
    jump_table: bool,

    /// Write a JSON dump of every processor after the run
    #[arg(long)]
    dump_state: Option<PathBuf>,
}

/// `,` reads a single key straight from the console when stdin is a
/// terminal, otherwise one byte from the pipe.
enum ConsoleSource {
    Terminal,
    Piped(ReaderSource<StdinLock<'static>>),
}

impl ConsoleSource {
    fn from_stdin() -> Self {
        let stdin = io::stdin();
        if stdin.is_terminal() {
            Self::Terminal
        } else {
            Self::Piped(ReaderSource::new(stdin.lock()))
        }
    }
}

struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::terminal::disable_raw_mode();
    }
}

fn read_key() -> io::Result<char> {
    let _raw = RawModeGuard::enable()?;
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if let Some(ch) = key_char(key.code, key.modifiers) {
            return ch;
        }
    }
}

/// Character a key press produces, the way an interactive console reports
/// it. Ctrl+letter yields the control code; Ctrl-C interrupts.
fn key_char(code: KeyCode, modifiers: KeyModifiers) -> Option<io::Result<char>> {
    let ch = match code {
        KeyCode::Char('c') | KeyCode::Char('C') if modifiers.contains(KeyModifiers::CONTROL) => {
            return Some(Err(io::Error::new(io::ErrorKind::Interrupted, "interrupted")));
        }
        KeyCode::Char(ch) if modifiers.contains(KeyModifiers::CONTROL) && ch.is_ascii() => {
            ((ch as u8) & 0x1f) as char
        }
        KeyCode::Char(ch) => ch,
        KeyCode::Enter => '\r',
        KeyCode::Tab => '\t',
        KeyCode::Backspace => '\u{8}',
        KeyCode::Esc => '\u{1b}',
        _ => return None,
    };
    Some(Ok(ch))
}

/// Non-ASCII keys become `?`.
fn ascii_byte(ch: char) -> u8 {
    if ch.is_ascii() {
        ch as u8
    } else {
        b'?'
    }
}

impl ByteSource for ConsoleSource {
    fn get(&mut self) -> rust_mbf::Result<u8> {
        match self {
            Self::Terminal => {
                let ch = read_key()?;
                let mut stdout = io::stdout();
                write!(stdout, "{ch}")?;
                stdout.flush()?;
                Ok(ascii_byte(ch))
            }
            Self::Piped(reader) => reader.get(),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_source(args: &Args) -> Result<String> {
    match (&args.eval, &args.program) {
        (Some(source), _) => Ok(source.clone()),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("failed to read program {}", path.display())),
        (None, None) => bail!("no program given (pass a path or --eval)"),
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let source = load_source(&args)?;

    let config = MachineConfig {
        processors: args.processors,
        halt: args.halt.into(),
        brackets: if args.jump_table {
            BracketStrategy::Table
        } else {
            BracketStrategy::Scan
        },
    };
    let mut machine = Machine::with_config(config, &source).context("failed to load program")?;

    let mut out = WriterSink::new(io::stdout());
    let mut input = ConsoleSource::from_stdin();
    let result = machine.run(&mut out, &mut input);

    // Dump even after a fault so the failing state can be inspected.
    if let Some(path) = &args.dump_state {
        let json = serde_json::to_string_pretty(&machine.snapshot())?;
        fs::write(path, json)
            .with_context(|| format!("failed to write state dump {}", path.display()))?;
    }

    let summary = result.context("run aborted")?;
    tracing::info!(
        ticks = summary.ticks,
        halted_on = ?summary.halted_on,
        "run complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_for(code: KeyCode, modifiers: KeyModifiers) -> Option<char> {
        key_char(code, modifiers).map(|res| res.unwrap())
    }

    #[test]
    fn control_letters_map_to_control_codes() {
        assert_eq!(
            char_for(KeyCode::Char('a'), KeyModifiers::CONTROL),
            Some('\u{1}')
        );
        assert_eq!(
            char_for(KeyCode::Char('z'), KeyModifiers::CONTROL),
            Some('\u{1a}')
        );
        assert_eq!(
            char_for(KeyCode::Char('['), KeyModifiers::CONTROL),
            Some('\u{1b}')
        );
    }

    #[test]
    fn ctrl_c_interrupts() {
        let err = key_char(KeyCode::Char('c'), KeyModifiers::CONTROL)
            .unwrap()
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Interrupted);
    }

    #[test]
    fn plain_and_special_keys() {
        assert_eq!(char_for(KeyCode::Char('a'), KeyModifiers::NONE), Some('a'));
        assert_eq!(char_for(KeyCode::Char('A'), KeyModifiers::SHIFT), Some('A'));
        assert_eq!(char_for(KeyCode::Enter, KeyModifiers::NONE), Some('\r'));
        assert_eq!(char_for(KeyCode::Left, KeyModifiers::NONE), None);
    }

    #[test]
    fn non_ascii_keys_encode_as_question_mark() {
        assert_eq!(ascii_byte('x'), b'x');
        assert_eq!(ascii_byte('é'), b'?');
    }
}
