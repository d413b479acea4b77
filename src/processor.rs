use crate::io::{to_ascii, ByteSink, ByteSource};
use crate::program::{JumpTable, Op, Program};
use crate::tape::{CellValue, Tape};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// How `[` and `]` find their partner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BracketStrategy {
    /// Linear nesting-counter scan on every jump.
    #[default]
    Scan,
    /// Partners resolved once at construction.
    Table,
}

/// One execution unit: a subprogram, an instruction pointer, a data
/// pointer and a private tape.
#[derive(Debug, Clone)]
pub struct Processor {
    id: usize,
    program: Program,
    jumps: Option<JumpTable>,
    ip: usize,
    dp: usize,
    tape: Tape,
}

impl Processor {
    pub fn new(id: usize, program: Program) -> Self {
        Self::with_strategy(id, program, BracketStrategy::Scan)
    }

    pub fn with_strategy(id: usize, program: Program, strategy: BracketStrategy) -> Self {
        let jumps = match strategy {
            BracketStrategy::Scan => None,
            BracketStrategy::Table => Some(JumpTable::build(&program)),
        };
        Self {
            id,
            program,
            jumps,
            ip: 0,
            dp: 0,
            tape: Tape::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn instruction_pointer(&self) -> usize {
        self.ip
    }

    pub fn data_pointer(&self) -> usize {
        self.dp
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn strategy(&self) -> BracketStrategy {
        if self.jumps.is_some() {
            BracketStrategy::Table
        } else {
            BracketStrategy::Scan
        }
    }

    pub fn is_finished(&self) -> bool {
        self.ip == self.program.len()
    }

    /// Executes the instruction under the instruction pointer. No-op once
    /// finished. On error the instruction pointer is left in place.
    pub fn tick<S, I>(&mut self, out: &mut S, input: &mut I) -> Result<()>
    where
        S: ByteSink + ?Sized,
        I: ByteSource + ?Sized,
    {
        let Some(op) = self.program.get(self.ip) else {
            return Ok(());
        };
        tracing::trace!(
            processor = self.id,
            ip = self.ip,
            op = %op.as_char(),
            dp = self.dp,
            "tick"
        );

        let mut next = self.ip + 1;
        match op {
            Op::Increment => self.tape.increment(self.dp)?,
            Op::Decrement => self.tape.decrement(self.dp)?,
            Op::Left => {
                // At the left edge the new cell takes index 0 and the
                // pointer stays put.
                if self.dp == 0 {
                    self.tape.grow_left();
                } else {
                    self.dp -= 1;
                }
            }
            Op::Right => {
                if self.dp == self.tape.size() - 1 {
                    self.tape.grow_right();
                }
                self.dp += 1;
            }
            Op::LoopStart => {
                if self.tape.read(self.dp)? == 0 {
                    next = self.loop_end()? + 1;
                }
            }
            Op::LoopEnd => {
                // Land on the matching `[` so its condition is checked again.
                next = self.loop_start()?;
            }
            Op::Output => {
                let value = self.tape.read(self.dp)?;
                out.put(to_ascii(to_byte(value)?))?;
            }
            Op::Input => {
                let byte = to_ascii(input.get()?);
                self.tape.write(self.dp, CellValue::from(byte))?;
            }
        }
        self.ip = next;
        Ok(())
    }

    fn loop_end(&self) -> Result<usize> {
        if let Some(table) = &self.jumps {
            return table.partner(self.ip).ok_or_else(|| self.unmatched('['));
        }
        let mut depth = 1usize;
        let mut x = self.ip;
        loop {
            x += 1;
            match self.program.get(x) {
                Some(Op::LoopStart) => depth += 1,
                Some(Op::LoopEnd) => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(x);
                    }
                }
                Some(_) => {}
                None => return Err(self.unmatched('[')),
            }
        }
    }

    fn loop_start(&self) -> Result<usize> {
        if let Some(table) = &self.jumps {
            return table.partner(self.ip).ok_or_else(|| self.unmatched(']'));
        }
        let mut depth = 1usize;
        let mut x = self.ip;
        loop {
            x = x.checked_sub(1).ok_or_else(|| self.unmatched(']'))?;
            match self.program.get(x) {
                Some(Op::LoopEnd) => depth += 1,
                Some(Op::LoopStart) => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(x);
                    }
                }
                _ => {}
            }
        }
    }

    fn unmatched(&self, bracket: char) -> Error {
        Error::MalformedProgram {
            processor: self.id,
            position: self.ip,
            bracket,
        }
    }
}

fn to_byte(value: CellValue) -> Result<u8> {
    u8::try_from(value).map_err(|_| Error::ValueOutOfRange { value })
}
