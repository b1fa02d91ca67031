//! Filter bank voice: the engine behind the rate-converting I/O.

use crate::error::Error;
use crate::filter::{BlockOutput, ControlFrame, Filter, FilterAlgorithm};
use crate::io::layout::OutputMode;
use crate::io::{AudioIo, IoConfig};
use crate::{CpuMode, NUM_CHANNELS};

#[derive(Debug, Clone)]
pub struct Voice {
    filter: Filter,
    io: AudioIo,
    block: BlockOutput,
}

impl Default for Voice {
    fn default() -> Self {
        Self::new(IoConfig::default())
    }
}

impl Voice {
    pub fn new(config: IoConfig) -> Self {
        Self {
            filter: Filter::new(config.cpu_mode),
            io: AudioIo::new(config),
            block: BlockOutput::default(),
        }
    }

    /// Restores channel defaults, clears the filter state and flushes the
    /// I/O queues.
    pub fn reset(&mut self) {
        self.filter.reset();
        self.io.reset();
        self.block = BlockOutput::default();
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut Filter {
        &mut self.filter
    }

    pub fn io(&self) -> &AudioIo {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut AudioIo {
        &mut self.io
    }

    /// Output of the most recent block: envelope preloads, pitch and levels.
    pub fn block_output(&self) -> &BlockOutput {
        &self.block
    }

    pub fn set_algorithm(&mut self, algorithm: FilterAlgorithm) {
        self.filter.set_algorithm(algorithm);
    }

    pub fn set_cpu_mode(&mut self, cpu_mode: CpuMode) {
        self.filter.set_cpu_mode(cpu_mode);
        self.io.set_cpu_mode(cpu_mode);
    }

    pub fn set_output_mode(&mut self, output_mode: OutputMode) {
        self.io.set_output_mode(output_mode);
    }

    pub fn set_host_sample_rate(&mut self, sample_rate: f32) -> Result<(), Error> {
        self.io.set_host_sample_rate(sample_rate)
    }

    /// Processes one host frame. See [`AudioIo::tick`].
    pub fn tick(
        &mut self,
        controls: &ControlFrame,
        input: &[f32],
        output: &mut [f32; NUM_CHANNELS],
    ) -> usize {
        let filter = &mut self.filter;
        let block = &mut self.block;

        self.io.tick(input, output, |engine_in, engine_out| {
            filter.process_audio_block(controls, engine_in, block);
            *engine_out = block.out;
        })
    }
}
