//! Ordinary least squares on paired samples.

/// A fitted line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Fitted slope.
    pub slope: f64,
    /// Fitted intercept.
    pub intercept: f64,
    /// Coefficient of determination, `1 - SS_res / SS_tot`, clamped to `[0, 1]`.
    pub r_squared: f64,
    /// `true` when `SS_tot` is zero (every `y` equal); `r_squared` is then 0.
    pub degenerate: bool,
}

/// Fits `ys` against `xs` by ordinary least squares, mean-centered form.
///
/// # Returns
/// - `None` if the slices differ in length, hold fewer than two points, or
///   every `x` is equal (slope undefined).
pub fn fit(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let (sxx, sxy, syy) = xs.iter().zip(ys).fold((0.0, 0.0, 0.0), |(sxx, sxy, syy), (x, y)| {
        let dx = x - mean_x;
        let dy = y - mean_y;
        (sxx + dx * dx, sxy + dx * dy, syy + dy * dy)
    });

    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let ss_res: f64 = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| {
            let residual = y - (slope * x + intercept);
            residual * residual
        })
        .sum();

    let degenerate = syy == 0.0;
    let r_squared = if degenerate {
        0.0
    } else {
        (1.0 - ss_res / syy).clamp(0.0, 1.0)
    };

    Some(LinearFit {
        slope,
        intercept,
        r_squared,
        degenerate,
    })
}
