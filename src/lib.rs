//! Round-robin multi-processor interpreter for the eight-opcode tape language.
//!
//! A source program is split across N processors by [`program::partition`].
//! Each [`Processor`] owns a private [`Tape`] and executes one opcode per
//! tick; the [`Machine`] drives ticks in strict round-robin order.

use thiserror::Error;

pub mod io;
pub mod processor;
pub mod program;
pub mod scheduler;
pub mod snapshot;
pub mod tape;

pub use io::{
    to_ascii, ByteSink, ByteSource, NullSource, ReaderSource, SliceSource, WriterSink,
};
pub use processor::{BracketStrategy, Processor};
pub use program::{partition, JumpTable, Op, Program};
pub use scheduler::{HaltPolicy, Machine, MachineConfig, RunSummary, StepOutcome};
pub use snapshot::{MachineSnapshot, ProcessorSnapshot};
pub use tape::{CellValue, Tape, CELL_MAX};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("tape index {index} out of bounds (tape size is {size})")]
    OutOfBounds { index: usize, size: usize },
    #[error("value {value} does not fit in a byte cell (0..=255)")]
    ValueOutOfRange { value: CellValue },
    #[error("processor {processor}: unmatched '{bracket}' at position {position}")]
    MalformedProgram {
        processor: usize,
        position: usize,
        bracket: char,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("input exhausted")]
    InputExhausted,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
