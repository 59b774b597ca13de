//! Property tests for the rolling mean and the windowed dataset

use crypto_forecast::dataset::{SerialIterator, WindowedDataset};
use crypto_forecast::indicators::SimpleMovingAverage;
use proptest::prelude::*;

proptest! {
    #[test]
    fn sma_matches_naive_mean(
        values in prop::collection::vec(0.0f64..100.0, 1..200),
        window in 1usize..50,
    ) {
        let out = SimpleMovingAverage::compute(window, &values).unwrap();
        prop_assert_eq!(out.len(), values.len());

        for (i, v) in out.iter().enumerate() {
            if i + 1 < window {
                prop_assert!(v.is_none());
            } else {
                let naive = values[i + 1 - window..=i].iter().sum::<f64>() / window as f64;
                prop_assert!((v.unwrap() - naive).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn windows_pair_inputs_with_next_value(
        series in prop::collection::vec(-10.0f32..10.0, 2..120),
        window in 1usize..40,
    ) {
        prop_assume!(series.len() > window);
        let ds = WindowedDataset::from_series(&series, window).unwrap();
        prop_assert_eq!(ds.len(), series.len() - window);

        for i in 0..ds.len() {
            let (x, t) = ds.sample(i).unwrap();
            prop_assert_eq!(x.to_vec(), series[i..i + window].to_vec());
            prop_assert_eq!(t, series[i + window]);
        }
    }

    #[test]
    fn split_partitions_samples(
        len in 2usize..300,
        window in 1usize..30,
        ratio in 0.05f64..0.95,
    ) {
        prop_assume!(len > window);
        let series: Vec<f32> = (0..len).map(|i| i as f32).collect();
        let ds = WindowedDataset::from_series(&series, window).unwrap();
        let (train, test) = ds.split(ratio).unwrap();

        prop_assert_eq!(train.len() + test.len(), ds.len());
        prop_assert_eq!(train.len(), ((len as f64 * ratio).floor() as usize).min(ds.len()));
        prop_assert_eq!(test.target_offset(), window + train.len());
    }

    #[test]
    fn one_pass_visits_every_index_once(
        len in 0usize..200,
        batch in 1usize..50,
        seed in any::<u64>(),
    ) {
        let mut seen: Vec<usize> = SerialIterator::new(len, batch, false, true, seed)
            .unwrap()
            .flatten()
            .collect();
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..len).collect::<Vec<_>>());
    }
}
