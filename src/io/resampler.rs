//! Streaming linear-interpolation sample rate converter.
//!
//! The read position advances by `input_rate / output_rate` per output
//! sample. Output sample `n` interpolates between the input samples just
//! before and at the position, where the sample before the first input of a
//! call is the last one consumed by the previous call. This delays the
//! signal by one input sample.
//!
//! Output is bounded by the output slice, and only the input that the next
//! output no longer needs is consumed. Whatever is left stays with the
//! caller for the next call.

#[derive(Debug, Clone)]
pub struct Resampler {
    input_rate: f32,
    output_rate: f32,
    step: f64,
    position: f64,
    last: f32,
}

impl Resampler {
    pub fn new(input_rate: f32, output_rate: f32) -> Self {
        let mut resampler = Self {
            input_rate: 0.0,
            output_rate: 0.0,
            step: 1.0,
            position: 0.0,
            last: 0.0,
        };
        resampler.set_rates(input_rate, output_rate);
        resampler
    }

    /// Changes the rate pair. The read position and history are kept, so
    /// the stream continues without a gap.
    pub fn set_rates(&mut self, input_rate: f32, output_rate: f32) {
        if input_rate == self.input_rate && output_rate == self.output_rate {
            return;
        }

        self.input_rate = input_rate;
        self.output_rate = output_rate;
        self.step = input_rate as f64 / output_rate as f64;
    }

    pub fn rates(&self) -> (f32, f32) {
        (self.input_rate, self.output_rate)
    }

    /// Input samples advanced per output sample.
    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn reset(&mut self) {
        self.position = 0.0;
        self.last = 0.0;
    }

    /// Input samples needed to produce `output_len` samples in one call.
    pub fn required_input(&self, output_len: usize) -> usize {
        if output_len == 0 {
            return 0;
        }

        let mut position = self.position;
        for _ in 1..output_len {
            position += self.step;
        }

        position as usize + 1
    }

    /// Converts `input` into `output`. Returns the number of input samples
    /// consumed and output samples produced.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) -> (usize, usize) {
        let mut produced = 0;

        while produced < output.len() {
            let index = self.position as usize;
            if index >= input.len() {
                break;
            }

            let fraction = (self.position - index as f64) as f32;
            let before = if index == 0 {
                self.last
            } else {
                input[index - 1]
            };
            let at = input[index];

            output[produced] = before + (at - before) * fraction;
            produced += 1;
            self.position += self.step;
        }

        let consumed = (self.position as usize).min(input.len());
        if consumed > 0 {
            self.last = input[consumed - 1];
            self.position -= consumed as f64;
        }

        (consumed, produced)
    }
}
