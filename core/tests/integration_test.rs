// ============================================================================
// INTEGRATION TESTS
// ============================================================================
// Full modulate/demodulate round trips through the public API. Each call runs
// an FFT over the whole buffer (~58k samples), so debug builds take a few
// seconds for the noisy multi-seed tests:
//   cargo test -p cosbit-core --test integration_test --release
// ============================================================================

use cosbit_core::framing::{bits_to_string, FrameDecoder};
use cosbit_core::interleave::BitInterleaver;
use cosbit_core::packet::{bits_to_bytes, payload_to_text};
use cosbit_core::{
    demodulate, modulate, DecodeResult, Decoder, Encoder, FecError, FramingError, ModemConfig,
    ModemError,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::sync::Arc;
use std::thread;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn add_noise(samples: &[f32], sigma: f32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0f32, sigma).unwrap();
    samples.iter().map(|&x| x + normal.sample(&mut rng)).collect()
}

fn assert_failed(result: &DecodeResult) {
    assert!(!result.is_recovered(), "unexpected decode: {:?}", result.text());
}

#[test]
fn test_cq_round_trip() {
    init_logger();
    let samples = modulate("CQ CQ DE N0CALL K", 0.5);
    assert_eq!(samples.len(), 58040);

    let result = demodulate(&samples, None);
    assert_eq!(result.text(), Some("CQ CQ DE N0CALL K"));
}

#[test]
fn test_cq_frame_layout() {
    let encoder = Encoder::default();
    let bits = encoder.frame_bits("CQ CQ DE N0CALL K");

    // sync immediately precedes the 512-bit interleaved payload
    assert_eq!(bits_to_string(&bits[80..96]), "1010101000110011");
    let hit = FrameDecoder::new(&ModemConfig::default()).locate(&bits).unwrap();
    assert_eq!(hit.payload_start, 96);
    assert_eq!(hit.payload.len(), 512);

    let codeword = bits_to_bytes(&BitInterleaver::new(8).deinterleave(&hit.payload));
    assert_eq!(codeword.len(), 64);
    assert_eq!(payload_to_text(&codeword[..48]), "CQ CQ DE N0CALL K");
}

#[test]
fn test_round_trip_various_texts() {
    let encoder = Encoder::default();
    let decoder = Decoder::default();

    let texts = [
        "",
        "K",
        "TEST DE DL1ABC 73 SK",
        "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 /?.,=+-ABC", // 47 bytes
        "0123456789012345678901234567890123456789ABCDEFGH", // exactly 48 bytes
        "GRÜSSE AUS MÜNCHEN ÄÖÜ",
    ];
    for text in texts {
        assert!(encoder.validate_text(text).is_ok(), "{:?} too long", text);
        let samples = encoder.modulate(text, 0.5);
        let result = decoder.demodulate(&samples, None);
        assert_eq!(result.text(), Some(text), "round trip of {:?}", text);
    }
}

#[test]
fn test_round_trip_with_awgn() {
    init_logger();
    let clean = modulate("QRZ? DE N0CALL K", 0.5);
    for seed in [1, 2, 3] {
        let noisy = add_noise(&clean, 0.05, seed);
        let result = demodulate(&noisy, None);
        assert_eq!(result.text(), Some("QRZ? DE N0CALL K"), "seed {}", seed);
    }
}

#[test]
fn test_round_trip_with_leading_capture() {
    // Recordings start at arbitrary points, not on a bit boundary
    let clean = modulate("CQ DX", 0.5);
    for lead in [0, 37, 1000, 4801] {
        let mut samples = vec![0.0f32; lead];
        samples.extend_from_slice(&clean);
        let result = demodulate(&samples, None);
        assert_eq!(result.text(), Some("CQ DX"), "lead {}", lead);
    }
}

#[test]
fn test_quiet_and_loud_signals() {
    for amplitude in [0.05, 0.5, 1.0, 4.0] {
        let samples = modulate("VOLUME", amplitude);
        assert!(samples.iter().all(|x| x.abs() <= 1.0));
        assert_eq!(demodulate(&samples, None).text(), Some("VOLUME"), "amp {}", amplitude);
    }
}

#[test]
fn test_threshold_sensitivity() {
    let samples = modulate("THRESHOLD", 0.5);

    assert_eq!(demodulate(&samples, Some(1600.0)).text(), Some("THRESHOLD"));

    for threshold in [3000.0, 500.0] {
        let result = demodulate(&samples, Some(threshold));
        assert_eq!(
            result.failure(),
            Some(&ModemError::Framing(FramingError::NoSyncFound)),
            "threshold {}",
            threshold
        );
    }
}

#[test]
fn test_silence_and_noise_fail_cleanly() {
    for len in [0, 1, 100, 48000] {
        assert_failed(&demodulate(&vec![0.0; len], None));
    }
    for seed in [7, 8, 9] {
        let noise = add_noise(&vec![0.0; 48000], 0.3, seed);
        assert_failed(&demodulate(&noise, None));
    }
}

#[test]
fn test_truncated_capture() {
    let samples = modulate("CQ CQ DE N0CALL K", 0.5);
    let result = demodulate(&samples[..samples.len() / 2], None);
    assert!(matches!(
        result.failure(),
        Some(ModemError::Framing(FramingError::TruncatedPayload { .. }))
            | Some(ModemError::Framing(FramingError::NoSyncFound))
    ));
}

/// Overwrite `len` samples from `start` with a steady out-of-band tone.
fn jam(samples: &mut [f32], start: usize, len: usize, freq: f32) {
    for (i, x) in samples[start..start + len].iter_mut().enumerate() {
        let t = (start + i) as f32 / 48000.0;
        *x = 0.5 * (2.0 * std::f32::consts::PI * freq * t).sin();
    }
}

#[test]
fn test_burst_noise_repaired() {
    init_logger();
    let decoder = Decoder::default();
    let mut damaged = modulate("BURST TEST", 0.5);

    // 6 bit periods stuck on "mark" inside the payload
    jam(&mut damaged, 4800 + 1000 + 300 * 80, 6 * 80, 2600.0);

    let recovered = decoder.decode(&damaged, None).unwrap();
    assert_eq!(recovered.text, "BURST TEST");
    assert!(recovered.corrected_symbols > 0);
    assert!(recovered.corrected_symbols <= 8);
}

#[test]
fn test_heavy_damage_is_not_misdecoded() {
    init_logger();
    let mut damaged = modulate("HEAVY DAMAGE", 0.5);
    // jam most of the payload
    jam(&mut damaged, 4800 + 1000 + 200 * 80, 300 * 80, 2600.0);

    // the jam starts after the sync marker, so the frame is still located
    let result = demodulate(&damaged, None);
    assert_eq!(
        result.failure(),
        Some(&ModemError::Fec(FecError::Uncorrectable)),
        "decoded {:?}",
        result.text()
    );
}

#[test]
fn test_custom_configuration() {
    // Slower baud, different tones and sync marker; independent of the default
    let config = ModemConfig {
        baud_rate: 300,
        freq_space: 1000.0,
        freq_mark: 2200.0,
        threshold: 1600.0,
        filter_cutoff_ratio: 1.5,
        ..ModemConfig::default()
    }
    .with_sync_pattern("1110010011010000")
    .unwrap();

    let encoder = Encoder::new(config.clone()).unwrap();
    let decoder = Decoder::new(config.clone()).unwrap();
    let samples = encoder.modulate("SLOW MODE", 0.5);
    assert_eq!(samples.len(), config.transmission_samples());
    assert_eq!(decoder.demodulate(&samples, None).text(), Some("SLOW MODE"));

    // the default decoder does not lock onto a foreign sync marker
    assert_failed(&Decoder::default().demodulate(&samples, None));
}

#[test]
fn test_shared_across_threads() {
    let decoder = Arc::new(Decoder::default());
    let encoder = Arc::new(Encoder::default());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let decoder = Arc::clone(&decoder);
            let encoder = Arc::clone(&encoder);
            thread::spawn(move || {
                let text = format!("THREAD {}", i);
                let samples = encoder.modulate(&text, 0.5);
                (text, decoder.demodulate(&samples, None))
            })
        })
        .collect();

    for handle in handles {
        let (text, result) = handle.join().unwrap();
        assert_eq!(result.text(), Some(text.as_str()));
    }
}

#[test]
fn test_core_types_are_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Encoder>();
    assert_send_sync::<Decoder>();
    assert_send_sync::<ModemConfig>();
    assert_send_sync::<DecodeResult>();
}
