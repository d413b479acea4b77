use crate::io::{ByteSink, ByteSource};
use crate::processor::{BracketStrategy, Processor};
use crate::program::partition;
use crate::snapshot::{MachineSnapshot, ProcessorSnapshot};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// When a round-robin run stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HaltPolicy {
    /// Stop the whole machine the first time the sweep reaches a processor
    /// that is already finished, even if others still have work left.
    #[default]
    FirstFinished,
    /// Keep sweeping, skipping finished processors, until all are finished.
    AllFinished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfig {
    pub processors: usize,
    #[serde(default)]
    pub halt: HaltPolicy,
    #[serde(default)]
    pub brackets: BracketStrategy,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            processors: 1,
            halt: HaltPolicy::default(),
            brackets: BracketStrategy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Ticks delivered to unfinished processors.
    pub ticks: u64,
    /// Processor whose finished state stopped the sweep
    /// (`None` under [`HaltPolicy::AllFinished`]).
    pub halted_on: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Ticked { processor: usize },
    Halted { on: Option<usize> },
}

/// A partitioned program loaded onto N processors.
#[derive(Debug, Clone)]
pub struct Machine {
    config: MachineConfig,
    processors: Vec<Processor>,
    cursor: usize,
    ticks: u64,
}

impl Machine {
    pub fn new(processors: usize, source: &str) -> Result<Self> {
        Self::with_config(
            MachineConfig {
                processors,
                ..MachineConfig::default()
            },
            source,
        )
    }

    pub fn with_config(config: MachineConfig, source: &str) -> Result<Self> {
        if config.processors == 0 {
            return Err(Error::InvalidConfiguration(
                "processor count must be at least 1".into(),
            ));
        }
        let processors: Vec<Processor> = partition(source, config.processors)?
            .into_iter()
            .enumerate()
            .map(|(id, program)| Processor::with_strategy(id, program, config.brackets))
            .collect();
        tracing::debug!(
            processors = processors.len(),
            lengths = ?processors.iter().map(|p| p.program().len()).collect::<Vec<_>>(),
            halt = ?config.halt,
            brackets = ?config.brackets,
            "machine assembled"
        );
        Ok(Self {
            config,
            processors,
            cursor: 0,
            ticks: 0,
        })
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn processors(&self) -> &[Processor] {
        &self.processors
    }

    pub fn processor(&self, id: usize) -> Option<&Processor> {
        self.processors.get(id)
    }

    /// Index of the processor the sweep will look at next.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn all_finished(&self) -> bool {
        self.processors.iter().all(Processor::is_finished)
    }

    /// Advances the sweep by one position: either ticks the processor under
    /// the cursor or reports that the halt policy has been met.
    pub fn step<S, I>(&mut self, out: &mut S, input: &mut I) -> Result<StepOutcome>
    where
        S: ByteSink + ?Sized,
        I: ByteSource + ?Sized,
    {
        match self.config.halt {
            HaltPolicy::FirstFinished => {
                if self.processors[self.cursor].is_finished() {
                    return Ok(StepOutcome::Halted {
                        on: Some(self.cursor),
                    });
                }
            }
            HaltPolicy::AllFinished => {
                if self.all_finished() {
                    return Ok(StepOutcome::Halted { on: None });
                }
                while self.processors[self.cursor].is_finished() {
                    self.advance_cursor();
                }
            }
        }
        let id = self.cursor;
        self.processors[id].tick(out, input)?;
        self.ticks += 1;
        self.advance_cursor();
        Ok(StepOutcome::Ticked { processor: id })
    }

    /// Drives ticks in ascending round-robin order until the halt policy
    /// is met. Any fault aborts the run; bytes already emitted stay emitted.
    pub fn run<S, I>(&mut self, out: &mut S, input: &mut I) -> Result<RunSummary>
    where
        S: ByteSink + ?Sized,
        I: ByteSource + ?Sized,
    {
        let start = self.ticks;
        let halted_on = loop {
            if let StepOutcome::Halted { on } = self.step(out, input)? {
                break on;
            }
        };
        let summary = RunSummary {
            ticks: self.ticks - start,
            halted_on,
        };
        tracing::debug!(
            ticks = summary.ticks,
            halted_on = ?summary.halted_on,
            all_finished = self.all_finished(),
            "machine halted"
        );
        Ok(summary)
    }

    fn advance_cursor(&mut self) {
        self.cursor = (self.cursor + 1) % self.processors.len();
    }

    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            config: self.config,
            ticks: self.ticks,
            processors: self
                .processors
                .iter()
                .map(ProcessorSnapshot::capture)
                .collect(),
        }
    }
}
