//! Audio Pipeline Tests
//!
//! End-to-end checks for the voice effect: decode, layered mix, export.

use pitchpage::dsp::{process, ChorusEffect, MixPolicy};
use pitchpage::engine::{decode_audio, detect_container, export_wav, AudioContainer, WavFormat, Waveform};

fn fixture(name: &str) -> Vec<u8> {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name);
    std::fs::read(path).unwrap()
}

#[test]
fn test_silence_two_seconds() {
    let silence = Waveform::silence(2.0, 44100).unwrap();
    let mixed = process(silence.samples(), 44100, &[4, -3]).unwrap();

    assert_eq!(mixed.len(), 88200);
    assert!(mixed.iter().all(|s| s.is_finite()));
    assert!(mixed.iter().all(|s| s.abs() < 1e-6));
}

#[test]
fn test_no_shifts_returns_input() {
    let tone = Waveform::sine(220.0, 0.25, 16000, 0.5).unwrap();
    let out = process(tone.samples(), 16000, &[]).unwrap();
    assert_eq!(out, tone.samples());
}

#[test]
fn test_output_never_longer_than_input() {
    for len in [2usize, 3, 511, 2048, 10_000] {
        let samples: Vec<f32> = (0..len).map(|i| ((i as f32) * 0.01).sin() * 0.3).collect();
        let out = process(&samples, 22050, &[4, -3]).unwrap();
        assert!(out.len() <= samples.len(), "len {} produced {}", len, out.len());
        assert_eq!(out.len(), samples.len());
        assert!(out.iter().all(|s| s.is_finite()));
    }
}

#[test]
fn test_mix_adds_shifted_energy() {
    let tone = Waveform::sine(300.0, 0.5, 16000, 0.3).unwrap();
    let mixed = ChorusEffect::default().process(&tone).unwrap();

    assert_eq!(mixed.len(), tone.len());
    assert!(mixed.rms_db() > tone.rms_db() + 1.0);
}

#[test]
fn test_averaged_policy_is_quieter_than_direct_sum() {
    let tone = Waveform::sine(300.0, 0.5, 16000, 0.3).unwrap();
    let direct = ChorusEffect::new(vec![4, -3], MixPolicy::DirectSum).process(&tone).unwrap();
    let averaged = ChorusEffect::new(vec![4, -3], MixPolicy::Averaged).process(&tone).unwrap();

    // Averaging three layers is a -9.5 dB trim of the same sum
    let difference = direct.rms_db() - averaged.rms_db();
    assert!((difference - 20.0 * 3.0_f32.log10()).abs() < 0.01);
}

#[test]
fn test_wav_round_trip_through_effect() {
    let tone = Waveform::sine(440.0, 0.5, 22050, 0.25).unwrap();
    let upload = export_wav(&tone, "voice.wav", WavFormat::Pcm16).unwrap();

    let decoded = decode_audio(&upload.bytes).unwrap();
    let mixed = ChorusEffect::default().process(&decoded).unwrap();
    let output = export_wav(&mixed, "voice_filtered.wav", WavFormat::Float32).unwrap();

    let reread = decode_audio(&output.bytes).unwrap();
    assert_eq!(reread.sample_rate(), 22050);
    assert_eq!(reread.len(), tone.len());
    assert_eq!(reread.samples(), mixed.samples());
}

#[test]
fn test_mp3_upload_decodes_and_processes() {
    let bytes = fixture("tone_22050_mono.mp3");
    assert_eq!(detect_container(&bytes), AudioContainer::Mp3);

    let decoded = decode_audio(&bytes).unwrap();
    assert_eq!(decoded.sample_rate(), 22050);
    // 45 MPEG-2 frames of 576 samples each
    assert_eq!(decoded.len() % 576, 0);
    assert!(decoded.len() >= 30 * 576 && decoded.len() <= 45 * 576, "{} samples", decoded.len());
    assert!(decoded.is_finite());

    let mixed = ChorusEffect::default().process(&decoded).unwrap();
    let output = export_wav(&mixed, "tone_22050_mono_filtered.wav", WavFormat::Pcm16).unwrap();
    let reread = decode_audio(&output.bytes).unwrap();
    assert_eq!(reread.sample_rate(), 22050);
    assert_eq!(reread.len(), decoded.len());
}

#[test]
fn test_mp3_frame_sync_garbage() {
    let mut bytes = vec![0xFF, 0xFB, 0x00];
    bytes.resize(1024, 0);
    assert_eq!(decode_audio(&bytes).unwrap_err().error_code(), "DECODE_ERROR");
}
