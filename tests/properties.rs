//! Property-based checks of padding and transform round trips

use proptest::prelude::*;
use split_fft::{get_padded, SplitFFT, BACK, FORWARD};

fn power_of_two_buffer(max_bits: u32) -> impl Strategy<Value = Vec<f64>> {
    (1..=max_bits).prop_flat_map(|bits| prop::collection::vec(-1.0e3f64..1.0e3, 1usize << bits))
}

proptest! {
    #[test]
    fn padding_preserves_prefix(data in prop::collection::vec(-1.0f64..1.0, 0..64), n in 0usize..128) {
        let padded = get_padded(&data, n);
        prop_assert_eq!(padded.len(), data.len().max(n));
        prop_assert_eq!(&padded[..data.len()], &data[..]);
        prop_assert!(padded[data.len()..].iter().all(|&x| x == 0.0));
    }

    #[test]
    fn complex_round_trip(data in power_of_two_buffer(12)) {
        let mut fft = SplitFFT::<f64>::new();
        let mut buf = data.clone();
        fft.complex_forward(&mut buf).unwrap();
        fft.complex_back(&mut buf).unwrap();

        let scale = (data.len() / 2) as f64;
        for (y, x) in buf.iter().zip(&data) {
            prop_assert!((y / scale - x).abs() <= 1e-9);
        }
    }

    #[test]
    fn real_round_trip(data in power_of_two_buffer(12)) {
        let mut fft = SplitFFT::<f64>::new();
        let mut buf = data.clone();
        fft.real_transform(&mut buf, FORWARD).unwrap();
        fft.real_transform(&mut buf, BACK).unwrap();

        let scale = (data.len() / 2) as f64;
        for (y, x) in buf.iter().zip(&data) {
            prop_assert!((y / scale - x).abs() <= 1e-9);
        }
    }

    #[test]
    fn parseval(data in power_of_two_buffer(10)) {
        // Σ|X|² = M Σ|x|² over M complex samples
        let mut fft = SplitFFT::<f64>::new();
        let mut buf = data.clone();
        fft.complex_forward(&mut buf).unwrap();

        let m = (data.len() / 2) as f64;
        let time: f64 = data.iter().map(|x| x * x).sum();
        let freq: f64 = buf.iter().map(|x| x * x).sum();
        prop_assert!((freq - m * time).abs() <= 1e-9 * (m * time).max(1.0));
    }

    #[test]
    fn rejects_non_powers_of_two(len in 3usize..4096) {
        prop_assume!(!len.is_power_of_two());
        let mut buf = vec![0.0f64; len];
        prop_assert!(SplitFFT::<f64>::new().complex_forward(&mut buf).is_err());
    }
}
