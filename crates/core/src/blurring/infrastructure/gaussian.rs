use crate::blurring::domain::blur_config::MaskProfile;

/// Normalised 1D mask for `profile`. Weights sum to 1.
///
/// `mask_size` must be odd and >= 1.
pub fn mask_1d(profile: MaskProfile, mask_size: usize, blur_level: f64) -> Vec<f32> {
    match profile {
        MaskProfile::Gaussian => gaussian_mask_1d(mask_size, blur_level),
        MaskProfile::Binomial => binomial_mask_1d(mask_size),
    }
}

/// Sampled Gaussian with `sigma = blur_level * mask_size / 6`.
///
/// At `blur_level == 1.0` this matches OpenCV's sigma=0 convention. The centre
/// tap is always 1 before normalising, so a sigma that underflows collapses
/// to the identity mask instead of NaN.
pub fn gaussian_mask_1d(mask_size: usize, blur_level: f64) -> Vec<f32> {
    debug_assert!(mask_size >= 1 && mask_size % 2 == 1);
    let sigma = blur_level * mask_size as f64 / 6.0;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let half = (mask_size / 2) as f64;
    let weights: Vec<f64> = (0..mask_size)
        .map(|i| {
            let x = i as f64 - half;
            if x == 0.0 {
                1.0
            } else {
                (-x * x / two_sigma_sq).exp()
            }
        })
        .collect();
    normalise(weights)
}

/// Row `mask_size - 1` of Pascal's triangle, normalised.
///
/// Coefficients are built as `ln C(n, k)` and shifted by the central maximum
/// before exponentiating, so wide masks do not overflow.
pub fn binomial_mask_1d(mask_size: usize) -> Vec<f32> {
    debug_assert!(mask_size >= 1 && mask_size % 2 == 1);
    let n = mask_size - 1;
    let mut ln_row = vec![0.0f64; mask_size];
    for k in 1..=n / 2 {
        ln_row[k] = ln_row[k - 1] + ((n - k + 1) as f64).ln() - (k as f64).ln();
        ln_row[n - k] = ln_row[k];
    }
    let peak = ln_row[n / 2];
    normalise(ln_row.iter().map(|&l| (l - peak).exp()).collect())
}

/// Scales weights to sum to 1. A degenerate sum yields the identity mask.
fn normalise(weights: Vec<f64>) -> Vec<f32> {
    let sum: f64 = weights.iter().sum();
    if !sum.is_finite() || sum <= 0.0 {
        return identity_mask(weights.len());
    }
    let mask: Vec<f32> = weights.iter().map(|&w| (w / sum) as f32).collect();
    debug_assert!(mask.iter().all(|w| w.is_finite()));
    mask
}

fn identity_mask(mask_size: usize) -> Vec<f32> {
    let mut mask = vec![0.0f32; mask_size];
    if let Some(centre) = mask.get_mut(mask_size / 2) {
        *centre = 1.0;
    }
    mask
}
