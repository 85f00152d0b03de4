//! # Technical-Analysis Chart
//!
//! Price with 50/200-day moving averages over a MACD panel, rendered as SVG.

use std::fmt::Write as _;

use thiserror::Error;

use super::indicators::{macd_default, sma, Macd};
use super::{MarketDataError, PricePoint};

const WIDTH: f64 = 1200.0;
const PRICE_HEIGHT: f64 = 480.0;
const MACD_HEIGHT: f64 = 240.0;
const MARGIN: f64 = 56.0;
const GAP: f64 = 40.0;
const TITLE_HEIGHT: f64 = 32.0;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("ticker must not be empty")]
    EmptyTicker,

    #[error("not enough price history for {ticker}: {points} points")]
    InsufficientData { ticker: String, points: usize },

    #[error(transparent)]
    Market(#[from] MarketDataError),
}

/// Series for one chart
#[derive(Debug, Clone)]
pub struct TaChart {
    pub ticker: String,
    pub points: Vec<PricePoint>,
    pub ma50: Vec<Option<f64>>,
    pub ma200: Vec<Option<f64>>,
    pub macd: Macd,
}

impl TaChart {
    pub fn build(ticker: &str, points: Vec<PricePoint>) -> Result<Self, ChartError> {
        if points.len() < 2 {
            return Err(ChartError::InsufficientData {
                ticker: ticker.to_string(),
                points: points.len(),
            });
        }
        let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
        Ok(Self {
            ticker: ticker.to_string(),
            ma50: sma(&closes, 50),
            ma200: sma(&closes, 200),
            macd: macd_default(&closes),
            points,
        })
    }

    pub fn to_svg(&self) -> String {
        let height = TITLE_HEIGHT + PRICE_HEIGHT + MACD_HEIGHT + GAP + 2.0 * MARGIN;
        let mut svg = String::new();
        let _ = writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="12">"#,
            w = WIDTH,
            h = height
        );
        let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" text-anchor="middle" font-size="18" font-weight="bold">{}</text>"#,
            WIDTH / 2.0,
            MARGIN / 2.0 + 6.0,
            escape(&format!("{} Technical Analysis Chart", self.ticker))
        );

        let closes: Vec<Option<f64>> = self.points.iter().map(|p| Some(p.close)).collect();
        let price_top = MARGIN + TITLE_HEIGHT;
        let price_panel = Panel::new(price_top, PRICE_HEIGHT, &[&closes, &self.ma50, &self.ma200]);
        price_panel.frame(&mut svg, "Price and Moving Averages");
        price_panel.line(&mut svg, &closes, "black", "Close");
        price_panel.line(&mut svg, &self.ma50, "blue", "50 MA");
        price_panel.line(&mut svg, &self.ma200, "red", "200 MA");

        let macd_top = price_top + PRICE_HEIGHT + GAP;
        let macd_panel = Panel::new(
            macd_top,
            MACD_HEIGHT,
            &[&self.macd.macd, &self.macd.signal, &self.macd.histogram],
        )
        .including_zero();
        macd_panel.frame(&mut svg, "MACD");
        macd_panel.bars(&mut svg, &self.macd.histogram);
        macd_panel.line(&mut svg, &self.macd.macd, "blue", "MACD");
        macd_panel.line(&mut svg, &self.macd.signal, "red", "Signal");

        if let (Some(first), Some(last)) = (self.points.first(), self.points.last()) {
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{}">{}</text><text x="{}" y="{}" text-anchor="end">{}</text>"#,
                MARGIN,
                height - MARGIN / 3.0,
                first.date,
                WIDTH - MARGIN,
                height - MARGIN / 3.0,
                last.date
            );
        }
        svg.push_str("</svg>\n");
        svg
    }
}

/// A vertical slice of the chart with its own y scale
struct Panel {
    top: f64,
    height: f64,
    min: f64,
    max: f64,
    len: usize,
}

impl Panel {
    fn new(top: f64, height: f64, series: &[&Vec<Option<f64>>]) -> Self {
        let values = series.iter().flat_map(|s| s.iter().flatten().copied());
        let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        let (min, max) = if min.is_finite() { (min, max) } else { (0.0, 1.0) };
        Self {
            top,
            height,
            min,
            max: if max > min { max } else { min + 1.0 },
            len: series.first().map(|s| s.len()).unwrap_or(0),
        }
    }

    fn including_zero(mut self) -> Self {
        self.min = self.min.min(0.0);
        self.max = self.max.max(0.0);
        if self.max <= self.min {
            self.max = self.min + 1.0;
        }
        self
    }

    fn x(&self, i: usize) -> f64 {
        let span = (self.len.max(2) - 1) as f64;
        MARGIN + (WIDTH - 2.0 * MARGIN) * i as f64 / span
    }

    fn y(&self, v: f64) -> f64 {
        self.top + self.height * (self.max - v) / (self.max - self.min)
    }

    fn frame(&self, svg: &mut String, title: &str) {
        let _ = writeln!(
            svg,
            r##"<rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="#ccc"/>"##,
            MARGIN,
            self.top,
            WIDTH - 2.0 * MARGIN,
            self.height
        );
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" font-size="14" font-weight="bold">{}</text>"#,
            MARGIN,
            self.top - 8.0,
            escape(title)
        );
        for v in [self.max, (self.max + self.min) / 2.0, self.min] {
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{}" text-anchor="end">{:.2}</text>"#,
                MARGIN - 4.0,
                self.y(v) + 4.0,
                v
            );
        }
    }

    /// Polyline over the defined runs of a series
    fn line(&self, svg: &mut String, series: &[Option<f64>], color: &str, label: &str) {
        let mut segments: Vec<Vec<String>> = vec![Vec::new()];
        for (i, value) in series.iter().enumerate() {
            match value {
                Some(v) => {
                    if let Some(segment) = segments.last_mut() {
                        segment.push(format!("{:.1},{:.1}", self.x(i), self.y(*v)));
                    }
                }
                None => {
                    if segments.last().map(|s| !s.is_empty()).unwrap_or(false) {
                        segments.push(Vec::new());
                    }
                }
            }
        }
        let _ = writeln!(svg, r#"<g data-series="{}">"#, escape(label));
        for segment in segments.iter().filter(|s| s.len() > 1) {
            let _ = writeln!(
                svg,
                r#"<polyline fill="none" stroke="{}" stroke-width="1.2" points="{}"/>"#,
                color,
                segment.join(" ")
            );
        }
        svg.push_str("</g>\n");
    }

    fn bars(&self, svg: &mut String, series: &[Option<f64>]) {
        let zero = self.y(0.0);
        let width = ((WIDTH - 2.0 * MARGIN) / self.len.max(1) as f64 * 0.8).max(0.5);
        svg.push_str("<g data-series=\"Histogram\">\n");
        for (i, value) in series.iter().enumerate() {
            let Some(v) = value else { continue };
            let y = self.y(*v);
            let color = if *v >= 0.0 { "green" } else { "red" };
            let _ = writeln!(
                svg,
                r#"<rect x="{:.1}" y="{:.1}" width="{:.2}" height="{:.1}" fill="{}" fill-opacity="0.5"/>"#,
                self.x(i) - width / 2.0,
                y.min(zero),
                width,
                (zero - y).abs(),
                color
            );
        }
        svg.push_str("</g>\n");
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(n: usize) -> Vec<PricePoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| PricePoint {
                date: start + chrono::Duration::days(i as i64),
                close: 100.0 + (i as f64 / 7.0).sin() * 5.0 + i as f64 * 0.1,
            })
            .collect()
    }

    #[test]
    fn test_build_computes_indicators() {
        let chart = TaChart::build("AAPL", series(250)).unwrap();
        assert!(chart.ma50[48].is_none());
        assert!(chart.ma50[49].is_some());
        assert!(chart.ma200[199].is_some());
        assert_eq!(chart.macd.macd.len(), 250);
    }

    #[test]
    fn test_svg_contains_both_panels() {
        let svg = TaChart::build("MSFT", series(250)).unwrap().to_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("MSFT Technical Analysis Chart"));
        assert!(svg.contains(">Price and Moving Averages<"));
        assert!(svg.contains(">MACD<"));
        assert!(svg.contains(r#"data-series="200 MA""#));
        assert!(svg.contains(r#"data-series="Histogram""#));
        assert!(svg.contains("2024-01-01"));
    }

    #[test]
    fn test_short_history_still_renders_price() {
        // fewer closes than the 200-day window
        let svg = TaChart::build("NEW", series(30)).unwrap().to_svg();
        assert!(svg.contains("<polyline"));
    }

    #[test]
    fn test_build_rejects_empty_history() {
        let err = TaChart::build("X", Vec::new()).unwrap_err();
        assert!(matches!(err, ChartError::InsufficientData { points: 0, .. }));
    }
}
