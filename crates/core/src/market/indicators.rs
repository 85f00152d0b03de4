//! Technical indicators over a close series.
//!
//! Every output has the same length as the input; positions without
//! enough history are `None`.

/// Simple moving average over `window` closes
pub fn sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, value) in values.iter().enumerate() {
        sum += value;
        if i >= window {
            sum -= values[i - window];
        }
        out.push((i + 1 >= window).then(|| sum / window as f64));
    }
    out
}

/// Exponential moving average seeded with the SMA of the first `span` values
pub fn ema(values: &[f64], span: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if span == 0 || values.len() < span {
        return out;
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut current = values[..span].iter().sum::<f64>() / span as f64;
    out[span - 1] = Some(current);
    for i in span..values.len() {
        current = alpha * values[i] + (1.0 - alpha) * current;
        out[i] = Some(current);
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

/// MACD line, signal line and histogram
pub fn macd(values: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    let fast_ema = ema(values, fast);
    let slow_ema = ema(values, slow);
    let line: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    // Signal is an EMA over the defined part of the MACD line
    let start = line.iter().position(Option::is_some).unwrap_or(line.len());
    let defined: Vec<f64> = line[start..].iter().flatten().copied().collect();
    let mut signal_line = vec![None; start];
    signal_line.extend(ema(&defined, signal));

    let histogram = line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| Some((*m)? - (*s)?))
        .collect();

    Macd {
        macd: line,
        signal: signal_line,
        histogram,
    }
}

/// The standard 12/26/9 configuration
pub fn macd_default(values: &[f64]) -> Macd {
    macd(values, 12, 26, 9)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_sma() {
        let out = sma(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(out, vec![None, Some(1.5), Some(2.5), Some(3.5)]);
    }

    #[test]
    fn test_ema_seed_and_step() {
        let out = ema(&[2.0, 4.0, 6.0, 8.0], 3);
        assert_eq!(out[1], None);
        assert!(close(out[2].unwrap(), 4.0));
        // alpha = 0.5
        assert!(close(out[3].unwrap(), 6.0));
    }

    #[test]
    fn test_macd_lengths_and_warmup() {
        let values: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64).sin()).collect();
        let m = macd_default(&values);
        assert_eq!(m.macd.len(), 60);
        assert_eq!(m.signal.len(), 60);
        assert!(m.macd[24].is_none());
        assert!(m.macd[25].is_some());
        assert!(m.signal[32].is_none());
        assert!(m.signal[33].is_some());
        let h = m.histogram[40].unwrap();
        assert!(close(h, m.macd[40].unwrap() - m.signal[40].unwrap()));
    }

    #[test]
    fn test_short_series_has_no_values() {
        let m = macd_default(&[1.0; 10]);
        assert!(m.macd.iter().all(Option::is_none));
        assert!(m.histogram.iter().all(Option::is_none));
    }
}
