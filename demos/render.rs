//! Offline render of a slowly morphing filter bank fed with a sawtooth.

use hound::{SampleFormat, WavSpec, WavWriter};
use simple_logger::SimpleLogger;

use rainbow_dsp::filter::{ControlFrame, FilterAlgorithm};
use rainbow_dsp::io::layout::OutputMode;
use rainbow_dsp::io::IoConfig;
use rainbow_dsp::voice::Voice;
use rainbow_dsp::{CpuMode, NUM_CHANNELS};

const SAMPLE_RATE: u32 = 48000;
const DURATION: f32 = 8.0;
const FREQUENCY: f32 = 55.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init()?;

    let mut voice = Voice::new(IoConfig {
        host_sample_rate: SAMPLE_RATE as f32,
        cpu_mode: CpuMode::High,
        output_mode: OutputMode::Stereo,
        ..Default::default()
    });

    std::fs::create_dir_all("out")?;
    let spec = WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create("out/render.wav", spec)?;

    let ticks = (DURATION * SAMPLE_RATE as f32) as usize;
    let mut output = [0.0; NUM_CHANNELS];
    let mut phase = 0.0;
    let mut controls = ControlFrame::default();

    for tick in 0..ticks {
        let position = tick as f32 / ticks as f32;

        // Second half plays the blended-table algorithm from another bank.
        if tick == ticks / 2 {
            voice.set_algorithm(FilterAlgorithm::Bpre);
            voice.filter_mut().change_bank(8);
        }

        controls.q = [2000.0 + 2000.0 * position; NUM_CHANNELS];
        controls.morph_pos = [(position * 4.0).fract(); NUM_CHANNELS];
        controls.fadeto_note = core::array::from_fn(|i| (i * 3 + 5) % 20);
        if tick >= ticks / 2 {
            controls.freq_nudge = [0.0; NUM_CHANNELS];
        }

        phase = (phase + FREQUENCY / SAMPLE_RATE as f32).fract();
        let saw = 2.0 * phase - 1.0;

        voice.tick(&controls, &[saw * 4.0], &mut output);

        // Scale the 5 V range down to full scale, with headroom for resonance.
        writer.write_sample(output[0] / 50.0)?;
        writer.write_sample(output[1] / 50.0)?;
    }

    writer.finalize()?;
    log::info!("rendered {DURATION} s to out/render.wav");

    Ok(())
}
