//! Tests for the filter engine.


use rainbow_dsp::filter::bpre::{nudge_fraction, resonance_fraction, BpreCoefficients};
use rainbow_dsp::filter::one_pass::OnePassCoefficients;
use rainbow_dsp::filter::two_pass::TwoPassResonance;
use rainbow_dsp::filter::{
    resonance_coefficient, resonate, BlockOutput, ControlFrame, Filter, FilterAlgorithm,
    InputBlock, F_MAX,
};
use rainbow_dsp::utils::random::Random;
use rainbow_dsp::{CpuMode, Error, MAX_12BIT, NUM_BANKNOTES, NUM_CHANNELS, NUM_SAMPLES};

const ALGORITHMS: [FilterAlgorithm; 3] = [
    FilterAlgorithm::TwoPass,
    FilterAlgorithm::OnePass,
    FilterAlgorithm::Bpre,
];

fn noise_block(random: &mut Random) -> InputBlock {
    core::array::from_fn(|_| core::array::from_fn(|_| (random.get_bipolar() * MAX_12BIT) as i32))
}

fn impulse_block(amplitude: i32) -> InputBlock {
    let mut block = [[0; NUM_SAMPLES]; NUM_CHANNELS];
    for channel in block.iter_mut() {
        channel.copy_from_slice(&modulation::impulse(amplitude, NUM_SAMPLES));
    }
    block
}

fn silence() -> InputBlock {
    [[0; NUM_SAMPLES]; NUM_CHANNELS]
}

fn all_zero(filter: &Filter, channel: usize) -> bool {
    filter
        .history_a()
        .channel(channel)
        .iter()
        .chain(filter.history_b().channel(channel).iter())
        .all(|slot| slot.iter().all(|&value| value == 0.0))
}

fn assert_close(actual: f32, expected: f32) {
    let tolerance = 1e-4 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance,
        "{actual} differs from {expected}"
    );
}

#[test]
fn one_pass_impulse_trace() {
    let coefficients = OnePassCoefficients {
        c0: 0.5,
        c1: 0.0,
        c2: 1.0,
    };
    let mut state = [0.0; 3];
    let mut out = [0.0; 4];

    let clipped = coefficients.process(&mut state, &[1, 0, 0, 0], &mut out);

    assert_eq!(out, [-1.0, -0.5, -0.25, -0.125]);
    assert!(!clipped);
}

#[test]
fn bpre_impulse_trace() {
    let coefficients = BpreCoefficients {
        c0: 1.0,
        c1: 0.0,
        c2: 0.0,
    };
    let mut state = [0.0; 3];
    let mut out = [0.0; 4];

    coefficients.process(&mut state, &[1, 0, 0, 0], &mut out);

    assert_eq!(out, [1.0, 0.0, -1.0, 0.0]);
}

#[test]
fn stable_at_extreme_settings() {
    for cpu_mode in [CpuMode::High, CpuMode::Low] {
        for algorithm in ALGORITHMS {
            let mut filter = Filter::new(cpu_mode);
            let mut random = Random::new(0x1234);
            let mut output = BlockOutput::default();
            let mut wav_data = Vec::new();

            filter.set_algorithm(algorithm);
            for (i, channel) in filter.channels_mut().iter_mut().enumerate() {
                channel.scale = i * 2;
                channel.note = 19 - i;
            }

            let controls = ControlFrame {
                q: [4095.0, 4095.0, 3950.0, 2048.0, 0.0, 4000.0],
                freq_shift: [8.0, 1.0, 1.0, 4.0, 1.0, 0.5],
                freq_nudge: [1.0, 0.5, 1.0, 1.0, 0.0, 1.0],
                morph_pos: [0.0, 0.5, 1.0, 0.0, 0.25, 0.0],
                ..Default::default()
            };

            for _ in 0..3000 {
                filter.process_audio_block(&controls, &noise_block(&mut random), &mut output);
                assert!(output.out.iter().flatten().all(|x| x.is_finite()));
                wav_data.extend(output.out[0].iter().map(|x| x / 1e6));
            }

            // Ring out without input.
            for _ in 0..3000 {
                filter.process_audio_block(&controls, &silence(), &mut output);
                assert!(output.out.iter().flatten().all(|x| x.is_finite()));
            }

            wav_writer::write(
                format!("filter/stability_{algorithm:?}_{cpu_mode:?}.wav"),
                &wav_data,
                cpu_mode.internal_sample_rate(),
            )
            .ok();
        }
    }
}

#[test]
fn bank_change_matches_fresh_filter() {
    for algorithm in ALGORITHMS {
        let controls = ControlFrame::default();
        let mut random = Random::new(7);
        let mut output = BlockOutput::default();

        let mut used = Filter::new(CpuMode::High);
        used.set_algorithm(algorithm);
        for _ in 0..8 {
            used.process_audio_block(&controls, &noise_block(&mut random), &mut output);
        }
        used.change_bank(3);

        let mut fresh = Filter::new(CpuMode::High);
        fresh.set_algorithm(algorithm);
        fresh.change_bank(3);

        let input = noise_block(&mut random);
        let mut expected = BlockOutput::default();
        used.process_audio_block(&controls, &input, &mut output);
        fresh.process_audio_block(&controls, &input, &mut expected);

        assert_eq!(output.out, expected.out);
    }
}

#[test]
fn bank_change_skips_locked_channels() {
    let controls = ControlFrame::default();
    let mut random = Random::new(11);
    let mut output = BlockOutput::default();
    let mut filter = Filter::new(CpuMode::High);

    filter.channels_mut()[0].lock = true;
    for _ in 0..8 {
        filter.process_audio_block(&controls, &noise_block(&mut random), &mut output);
    }

    filter.change_bank(5);
    filter.process_audio_block(&controls, &silence(), &mut output);

    assert_eq!(filter.channels()[0].scale_bank, 0);
    assert!(!all_zero(&filter, 0));

    for channel in 1..NUM_CHANNELS {
        assert_eq!(filter.channels()[channel].scale_bank, 5);
        assert!(all_zero(&filter, channel));
    }
}

#[test]
fn algorithm_change_clears_history() {
    let controls = ControlFrame::default();
    let mut random = Random::new(3);
    let mut output = BlockOutput::default();
    let mut filter = Filter::new(CpuMode::Low);

    for _ in 0..4 {
        filter.process_audio_block(&controls, &noise_block(&mut random), &mut output);
    }

    // Selecting the running algorithm is not a change.
    filter.set_algorithm(FilterAlgorithm::TwoPass);
    filter.process_audio_block(&controls, &silence(), &mut output);
    assert!((0..NUM_CHANNELS).all(|channel| !all_zero(&filter, channel)));

    filter.set_algorithm(FilterAlgorithm::OnePass);
    assert_eq!(filter.algorithm(), FilterAlgorithm::TwoPass);

    filter.process_audio_block(&controls, &silence(), &mut output);
    assert_eq!(filter.algorithm(), FilterAlgorithm::OnePass);
    assert!((0..NUM_CHANNELS).all(|channel| all_zero(&filter, channel)));
}

#[test]
fn user_scale_swaps_at_block_boundary() {
    let controls = ControlFrame::default();
    let mut random = Random::new(5);
    let mut output = BlockOutput::default();
    let mut filter = Filter::new(CpuMode::High);

    filter.channels_mut()[2].lock = true;
    for _ in 0..4 {
        filter.process_audio_block(&controls, &noise_block(&mut random), &mut output);
    }

    let scale = vec![0.05; NUM_BANKNOTES];
    filter.stage_user_scale(&scale).unwrap();

    let user_scale = filter.coefficient_store().user_scale();
    assert!(user_scale.is_pending());
    assert_eq!(user_scale.version(), 0);
    assert_ne!(user_scale.coefficients(), scale.as_slice());

    filter.process_audio_block(&controls, &silence(), &mut output);

    let user_scale = filter.coefficient_store().user_scale();
    assert!(!user_scale.is_pending());
    assert_eq!(user_scale.version(), 1);
    assert_eq!(user_scale.coefficients(), scale.as_slice());

    // Every channel is cleared, locked or not.
    assert!((0..NUM_CHANNELS).all(|channel| all_zero(&filter, channel)));
}

#[test]
fn user_scale_rejects_wrong_length() {
    let mut filter = Filter::new(CpuMode::High);

    assert_eq!(
        filter.stage_user_scale(&[0.1; 5]),
        Err(Error::UserScaleLength {
            expected: NUM_BANKNOTES,
            actual: 5,
        })
    );
    assert!(!filter.coefficient_store().user_scale().is_pending());
}

#[test]
fn crossfade_regions() {
    assert_eq!(TwoPassResonance::new(1500.0, 1.0).ratio_a, 1.0);
    assert_eq!(TwoPassResonance::new(1500.0, 1.0).ratio_b, 0.0);
    assert_close(TwoPassResonance::new(2900.0, 1.0).ratio_a, 0.5);
    assert_eq!(TwoPassResonance::new(3900.0, 1.0).ratio_a, 0.0);
}

/// Runs one two-pass channel by hand with the resonators.
fn two_pass_reference(filter: &Filter, q: f32, input: &[i32]) -> (Vec<f32>, Vec<f32>) {
    let channel = filter.channels()[0];
    let freq_scale = filter.freq_scale();
    let c1 = (filter
        .coefficient_store()
        .maxq(channel.scale_bank, channel.scale, channel.note)
        * freq_scale)
        .min(F_MAX);

    let resonance = TwoPassResonance::new(q, freq_scale);
    let (c2_a, c2) = resonance.amplitudes(c1);
    let mut state_a = [0.0; 3];
    let mut state_b = [0.0; 3];
    let mut a = Vec::new();
    let mut b = Vec::new();

    for &x in input {
        let y_a = resonate(&mut state_a, resonance.c0_a, c1, c2_a, x as f32);
        let y_b = resonate(&mut state_b, resonance.c0, c1, c2, y_a);
        a.push(y_a);
        b.push(y_b);
    }

    (a, b)
}

#[test]
fn two_pass_crossfade_boundaries() {
    for (q, first_pass) in [(1000.0, true), (4000.0, false)] {
        let mut filter = Filter::new(CpuMode::High);
        let mut output = BlockOutput::default();
        let controls = ControlFrame {
            q: [q; NUM_CHANNELS],
            ..Default::default()
        };
        let input = impulse_block(1000);

        filter.process_audio_block(&controls, &input, &mut output);

        let (a, b) = two_pass_reference(&filter, q, &input[0]);
        for i in 0..NUM_SAMPLES {
            if first_pass {
                assert_close(output.out[0][i], a[i]);
            } else {
                assert_close(output.out[0][i], -b[i]);
            }
        }
    }
}

#[test]
fn corrupt_selections_are_clamped() {
    let mut filter = Filter::new(CpuMode::High);
    let mut output = BlockOutput::default();
    let controls = ControlFrame {
        fadeto_note: [500; NUM_CHANNELS],
        fadeto_scale: [usize::MAX; NUM_CHANNELS],
        morph_pos: [0.5; NUM_CHANNELS],
        q: [f32::NAN, -10.0, 9000.0, 2048.0, 2048.0, 2048.0],
        ..Default::default()
    };

    for channel in filter.channels_mut().iter_mut() {
        channel.note = 99;
        channel.scale = 99;
        channel.scale_bank = 99;
    }

    for algorithm in ALGORITHMS {
        filter.set_algorithm(algorithm);
        filter.process_audio_block(&controls, &impulse_block(1000), &mut output);
        assert!(output.out.iter().flatten().all(|x| x.is_finite()));
    }

    for channel in filter.channels() {
        assert_eq!(channel.note, 19);
        assert_eq!(channel.scale, 10);
        assert_eq!(channel.scale_bank, 19);
    }

    let store = filter.coefficient_store();
    assert_eq!(store.maxq(99, 99, 99), store.maxq(19, 10, 20));
}

#[test]
fn full_morph_plays_target() {
    for algorithm in ALGORITHMS {
        let input = impulse_block(1000);

        let mut morphing = Filter::new(CpuMode::High);
        let mut output = BlockOutput::default();
        morphing.set_algorithm(algorithm);
        let target_note = (morphing.channels()[0].note + 4) % 20;
        let controls = ControlFrame {
            morph_pos: [1.0; NUM_CHANNELS],
            fadeto_note: [target_note; NUM_CHANNELS],
            fadeto_scale: [3; NUM_CHANNELS],
            freq_nudge: [0.0; NUM_CHANNELS],
            ..Default::default()
        };
        morphing.process_audio_block(&controls, &input, &mut output);

        let mut target = Filter::new(CpuMode::High);
        let mut expected = BlockOutput::default();
        target.set_algorithm(algorithm);
        target.channels_mut()[0].note = target_note;
        target.channels_mut()[0].scale = 3;
        let controls = ControlFrame {
            freq_nudge: [0.0; NUM_CHANNELS],
            ..Default::default()
        };
        target.process_audio_block(&controls, &input, &mut expected);

        for i in 0..NUM_SAMPLES {
            assert_close(output.out[0][i], expected.out[0][i]);
        }
    }
}

#[test]
fn glide_moves_pitch_output() {
    let mut filter = Filter::new(CpuMode::High);
    let mut output = BlockOutput::default();
    filter.set_algorithm(FilterAlgorithm::OnePass);

    let channel = filter.channels()[1];
    let store = filter.coefficient_store();
    let c1 = store.maxq(channel.scale_bank, channel.scale, channel.note);
    let c1_target = store.maxq(channel.scale_bank, 2, 7);

    let mut controls = ControlFrame {
        morph_pos: [0.25; NUM_CHANNELS],
        fadeto_note: [7; NUM_CHANNELS],
        fadeto_scale: [2; NUM_CHANNELS],
        ..Default::default()
    };

    filter.process_audio_block(&controls, &silence(), &mut output);
    assert_close(output.voct[1], c1);

    controls.glide = true;
    filter.process_audio_block(&controls, &silence(), &mut output);
    assert_close(output.voct[1], c1 * 0.75 + c1_target * 0.25);
}

#[test]
fn bpre_pitch_ignores_frequency_scale() {
    let mut filter = Filter::new(CpuMode::Low);
    let mut output = BlockOutput::default();
    filter.set_algorithm(FilterAlgorithm::Bpre);

    filter.process_audio_block(&ControlFrame::default(), &silence(), &mut output);

    for (channel, selection) in filter.channels().iter().enumerate() {
        let tuning = filter.coefficient_store().bpre_tuning(
            selection.scale_bank,
            selection.scale,
            selection.note,
        );
        assert_eq!(output.voct[channel], tuning);
    }
}

#[test]
fn bpre_blend_fractions() {
    assert_eq!(nudge_fraction(0.001), 0.0);
    assert_eq!(nudge_fraction(0.999), 1.0);
    assert_eq!(nudge_fraction(0.5), 0.5);

    assert_eq!(resonance_fraction(0.0), 0.0);
    assert_eq!(resonance_fraction(4066.0), 1.0);
    assert!(resonance_fraction(1000.0) > resonance_fraction(100.0));
}

#[test]
fn bpre_nudge_reaches_next_note() {
    let filter = Filter::new(CpuMode::High);
    let store = filter.coefficient_store();
    let note = store.bpre(0, 0, 4);
    let next = store.bpre(0, 0, 5);
    let after = store.bpre(0, 0, 6);

    let nudged = BpreCoefficients::new(&note, &next, 1.0, 2048.0);
    let plain = BpreCoefficients::new(&next, &after, 0.0, 2048.0);

    assert_close(nudged.c0, plain.c0);
    assert_close(nudged.c1, plain.c1);
    assert_close(nudged.c2, plain.c2);
}

#[test]
fn level_and_envelope() {
    let input = impulse_block(1500);
    let mut full = BlockOutput::default();
    let mut half = BlockOutput::default();

    Filter::new(CpuMode::High).process_audio_block(&ControlFrame::default(), &input, &mut full);
    Filter::new(CpuMode::High).process_audio_block(
        &ControlFrame {
            channel_level: [0.5; NUM_CHANNELS],
            ..Default::default()
        },
        &input,
        &mut half,
    );

    for channel in 0..NUM_CHANNELS {
        assert_ne!(full.out[channel][0], 0.0);

        for i in 0..NUM_SAMPLES {
            assert_eq!(half.out[channel][i], full.out[channel][i] * 0.5);
        }

        assert_eq!(full.env_preload[channel], full.out[channel][0].abs());
        assert_eq!(half.env_preload[channel], full.env_preload[channel]);
        assert_close(
            half.channel_level[channel],
            half.out[channel][0].abs() / 2047.0,
        );
    }
}

#[test]
fn input_clip_flag() {
    for algorithm in ALGORITHMS {
        let mut filter = Filter::new(CpuMode::High);
        let mut output = BlockOutput::default();
        filter.set_algorithm(algorithm);

        filter.process_audio_block(&ControlFrame::default(), &impulse_block(1949), &mut output);
        assert!(!output.input_clip);

        filter.process_audio_block(&ControlFrame::default(), &impulse_block(1950), &mut output);
        assert!(output.input_clip);

        filter.process_audio_block(&ControlFrame::default(), &impulse_block(-2048), &mut output);
        assert!(output.input_clip);
    }
}

#[test]
fn resonance_coefficient_range() {
    for q in [0.0, 1000.0, 2048.0, 4095.0] {
        for freq_scale in [1.0, 2.0] {
            let c0 = resonance_coefficient(q, freq_scale);
            assert!(c0 > 0.99 && c0 < 1.0);
        }
    }

    assert!(resonance_coefficient(4095.0, 1.0) > resonance_coefficient(0.0, 1.0));
}

#[test]
fn reset_restores_defaults() {
    let mut filter = Filter::new(CpuMode::High);
    let mut output = BlockOutput::default();
    let defaults = *filter.channels();

    filter.channels_mut()[3].note = 1;
    filter.channels_mut()[3].lock = true;
    filter.change_bank(4);
    filter.process_audio_block(&ControlFrame::default(), &impulse_block(1000), &mut output);

    filter.reset();

    assert_eq!(filter.channels(), &defaults);
    assert!((0..NUM_CHANNELS).all(|channel| all_zero(&filter, channel)));
}

#[test]
fn reset_drops_pending_algorithm() {
    let controls = ControlFrame::default();
    let mut output = BlockOutput::default();
    let mut filter = Filter::new(CpuMode::High);

    filter.set_algorithm(FilterAlgorithm::OnePass);
    filter.reset();
    filter.process_audio_block(&controls, &silence(), &mut output);
    assert_eq!(filter.algorithm(), FilterAlgorithm::TwoPass);

    filter.set_algorithm(FilterAlgorithm::OnePass);
    filter.process_audio_block(&controls, &silence(), &mut output);
    assert_eq!(filter.algorithm(), FilterAlgorithm::OnePass);
}

#[test]
fn morph_sweep_render() {
    let mut filter = Filter::new(CpuMode::High);
    let mut output = BlockOutput::default();
    let mut random = Random::new(99);
    let mut wav_data = Vec::new();
    let blocks = 3000;

    for block in 0..blocks {
        let controls = ControlFrame {
            q: [3000.0; NUM_CHANNELS],
            morph_pos: [modulation::ramp_up(block, blocks); NUM_CHANNELS],
            fadeto_note: [12; NUM_CHANNELS],
            ..Default::default()
        };
        let mut input = noise_block(&mut random);
        for channel in input.iter_mut() {
            for x in channel.iter_mut() {
                *x /= 8;
            }
        }

        filter.process_audio_block(&controls, &input, &mut output);

        assert!(output.out.iter().flatten().all(|x| x.is_finite()));
        wav_data.extend(output.out[0].iter().map(|x| x / 1e5));
    }

    wav_writer::write("filter/morph_sweep.wav", &wav_data, 96000.0).ok();
}
