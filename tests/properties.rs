use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use transformer_kernels::{
    matmul, rms_norm, self_attention, softmax_rows, softmax_vector, softmax_vector_with, swish,
    AttentionScaling, KernelConfig, Matrix, MaxInit,
};

const SEEDS: std::ops::Range<u64> = 0..32;

fn random_vec(rng: &mut StdRng, n: usize, lo: f32, hi: f32) -> Vec<f32> {
    (0..n).map(|_| rng.gen_range(lo..hi)).collect()
}

fn assert_close(a: &[f32], b: &[f32], tol: f32) {
    assert_eq!(a.len(), b.len());
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        assert!((x - y).abs() <= tol, "index {i}: {x} vs {y} (tol {tol})");
    }
}

#[test]
fn softmax_sums_to_one() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = rng.gen_range(1..64);
        let mut values = random_vec(&mut rng, n, -10.0, 10.0);
        // Keep one element >= 1.0 so the legacy max never falls back to 1.0
        let pick = rng.gen_range(0..n);
        values[pick] = 1.5;

        for max_init in [MaxInit::FirstElement, MaxInit::LegacyOne] {
            let mut probs = values.clone();
            softmax_vector_with(&mut probs, max_init).unwrap();
            let sum: f32 = probs.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5, "seed {seed}: sum {sum}");
            assert!(probs.iter().all(|&p| p >= 0.0));
        }
    }
}

#[test]
fn softmax_is_shift_invariant() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = rng.gen_range(1..32);
        let values = random_vec(&mut rng, n, -5.0, 5.0);
        let shift = rng.gen_range(-20.0f32..20.0);

        let mut base = values.clone();
        softmax_vector(&mut base).unwrap();
        let mut shifted: Vec<f32> = values.iter().map(|x| x + shift).collect();
        softmax_vector(&mut shifted).unwrap();

        assert_close(&base, &shifted, 2e-5);
    }
}

#[test]
fn legacy_softmax_loses_shift_invariance_far_below_one() {
    let values = [-200.0f32, -201.0];
    let mut legacy = values;
    softmax_vector_with(&mut legacy, MaxInit::LegacyOne).unwrap();

    let mut shifted = values.map(|x| x + 300.0);
    softmax_vector_with(&mut shifted, MaxInit::LegacyOne).unwrap();

    assert!(legacy.iter().all(|x| x.is_infinite()));
    assert!((shifted[0] - 0.7310586).abs() < 1e-6);
}

#[test]
fn softmax_rows_treats_rows_independently() {
    let mut rng = StdRng::seed_from_u64(3);
    let m = Matrix::random(5, 7, &mut rng).unwrap();

    let mut by_rows = m.clone();
    softmax_rows(&mut by_rows).unwrap();

    for (i, row) in m.rows_iter().enumerate() {
        let mut expected = row.to_vec();
        softmax_vector(&mut expected).unwrap();
        assert_eq!(by_rows.row(i).unwrap(), expected.as_slice());
    }
}

#[test]
fn matmul_by_identity_is_exact() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let (m, k) = (rng.gen_range(1..8), rng.gen_range(1..8));
        let x = Matrix::random(m, k, &mut rng).unwrap();
        let eye = Matrix::identity(k).unwrap();

        let mut output = Matrix::zeros(m, k).unwrap();
        matmul(&x, &eye, &mut output).unwrap();
        assert_eq!(output, x);
    }
}

#[test]
fn matmul_is_associative_within_tolerance() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let (m, k, n, p) = (
            rng.gen_range(1..7),
            rng.gen_range(1..7),
            rng.gen_range(1..7),
            rng.gen_range(1..7),
        );
        let a = Matrix::random(m, k, &mut rng).unwrap();
        let b = Matrix::random(k, n, &mut rng).unwrap();
        let c = Matrix::random(n, p, &mut rng).unwrap();

        let mut ab = Matrix::zeros(m, n).unwrap();
        matmul(&a, &b, &mut ab).unwrap();
        let mut ab_c = Matrix::zeros(m, p).unwrap();
        matmul(&ab, &c, &mut ab_c).unwrap();

        let mut bc = Matrix::zeros(k, p).unwrap();
        matmul(&b, &c, &mut bc).unwrap();
        let mut a_bc = Matrix::zeros(m, p).unwrap();
        matmul(&a, &bc, &mut a_bc).unwrap();

        assert_close(ab_c.data(), a_bc.data(), 1e-4);
    }
}

#[test]
fn single_position_attention_returns_value_row() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let d = rng.gen_range(1..16);
        let q = Matrix::random(1, d, &mut rng).unwrap();
        let k = Matrix::random(1, d, &mut rng).unwrap();
        let v = Matrix::random(1, d, &mut rng).unwrap();

        let scalings = [AttentionScaling::Unscaled, AttentionScaling::InverseSqrtHeadDim];
        for attention_scaling in scalings {
            let config = KernelConfig { attention_scaling, ..KernelConfig::default() };
            let mut output = Matrix::zeros(1, d).unwrap();
            self_attention(&q, &k, &v, &config, &mut output).unwrap();
            assert_eq!(output, v);
        }
    }
}

#[test]
fn identity_attention_matches_reference_bit_for_bit() {
    // Q = K = V = I (N = 2, d = 2): S = I, each row becomes softmax([1, 0]) or
    // softmax([0, 1]), and S·I = S. The running max is 1.0 under both inits.
    // Reference bits from the legacy kernel on the same inputs.
    let eye = Matrix::identity(2).unwrap();
    let hi = f32::from_bits(0x3f3b26a8);
    let lo = f32::from_bits(0x3e89b2b1);

    for softmax_max_init in [MaxInit::FirstElement, MaxInit::LegacyOne] {
        let config = KernelConfig { softmax_max_init, ..KernelConfig::default() };
        let mut output = Matrix::zeros(2, 2).unwrap();
        self_attention(&eye, &eye, &eye, &config, &mut output).unwrap();
        assert_eq!(output.data(), &[hi, lo, lo, hi], "{softmax_max_init:?}");
    }
    assert!((hi - 0.731).abs() < 1e-3);
    assert!((lo - 0.269).abs() < 1e-3);
}

#[test]
fn rms_norm_cancels_positive_scaling() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let (m, n) = (rng.gen_range(1..4), rng.gen_range(8..32));
        let input = Matrix::random(m, n, &mut rng).unwrap();
        let weight = Matrix::random(m, n, &mut rng).unwrap();

        let mut base = Matrix::zeros(m, n).unwrap();
        rms_norm(&input, &weight, 1e-5, &mut base).unwrap();

        for alpha in [2.0f32, 10.0, 1000.0] {
            let scaled_data: Vec<f32> = input.data().iter().map(|x| x * alpha).collect();
            let scaled = Matrix::new(m, n, scaled_data).unwrap();
            let mut output = Matrix::zeros(m, n).unwrap();
            rms_norm(&scaled, &weight, 1e-5, &mut output).unwrap();
            assert_close(output.data(), base.data(), 1e-3);
        }
    }
}

#[test]
fn rms_norm_is_odd() {
    // Negative scales flip the sign: the mean square is unchanged
    let mut rng = StdRng::seed_from_u64(11);
    let input = Matrix::random(3, 9, &mut rng).unwrap();
    let weight = Matrix::random(3, 9, &mut rng).unwrap();
    let negated = Matrix::new(3, 9, input.data().iter().map(|x| -x).collect()).unwrap();

    let mut a = Matrix::zeros(3, 9).unwrap();
    let mut b = Matrix::zeros(3, 9).unwrap();
    rms_norm(&input, &weight, 1e-5, &mut a).unwrap();
    rms_norm(&negated, &weight, 1e-5, &mut b).unwrap();

    let flipped: Vec<f32> = b.data().iter().map(|x| -x).collect();
    assert_eq!(a.data(), flipped.as_slice());
}

#[test]
fn swish_with_zero_beta_halves_input() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = rng.gen_range(1..64);
        let input = random_vec(&mut rng, n, -20.0, 20.0);
        let beta = vec![0.0; n];
        let mut output = vec![0.0; n];
        swish(&input, &beta, &mut output).unwrap();

        let expected: Vec<f32> = input.iter().map(|x| 0.5 * x).collect();
        assert_eq!(output, expected);
    }
}
