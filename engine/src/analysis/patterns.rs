// Candlestick pattern detection over the last two or three candles.
use shared::models::{Candle, PatternFlags};

/// Opening more than 0.5% away from the previous close counts as a gap.
pub const GAP_UP_FACTOR: f64 = 1.005;
pub const GAP_DOWN_FACTOR: f64 = 0.995;
/// Engulfing body must be this many times the previous body.
pub const ENGULFING_BODY_RATIO: f64 = 1.5;
/// Each soldier/crow body must exceed this share of the largest of the three.
pub const THREE_CANDLE_BODY_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngulfingFlags {
    pub bullish: bool,
    pub bearish: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GapFlags {
    pub gap_up: bool,
    pub gap_down: bool,
}

pub fn detect_candlestick_patterns(candles: &[Candle]) -> PatternFlags {
    let mut flags = PatternFlags::default();
    let n = candles.len();
    if n < 2 {
        return flags;
    }

    let (prev, last) = (&candles[n - 2], &candles[n - 1]);
    let engulfing = detect_engulfing(last, prev);
    let gaps = detect_gaps(last, prev);
    flags.bullish_engulfing = engulfing.bullish;
    flags.bearish_engulfing = engulfing.bearish;
    flags.gap_up = gaps.gap_up;
    flags.gap_down = gaps.gap_down;

    if n >= 3 {
        let three = &candles[n - 3..];
        flags.is_three_white_soldiers = is_three_white_soldiers(three);
        flags.is_three_black_crows = is_three_black_crows(three);
    }
    flags
}

pub fn detect_engulfing(last: &Candle, prev: &Candle) -> EngulfingFlags {
    let body_dominates = last.body() > prev.body() * ENGULFING_BODY_RATIO;

    EngulfingFlags {
        bullish: last.is_bullish()
            && prev.is_bearish()
            && body_dominates
            && last.close > prev.open
            && last.open < prev.close,
        bearish: last.is_bearish()
            && prev.is_bullish()
            && body_dominates
            && last.close < prev.open
            && last.open > prev.close,
    }
}

pub fn detect_gaps(last: &Candle, prev: &Candle) -> GapFlags {
    GapFlags {
        gap_up: last.open > prev.close * GAP_UP_FACTOR,
        gap_down: last.open < prev.close * GAP_DOWN_FACTOR,
    }
}

fn bodies_are_even(three: &[Candle]) -> bool {
    let largest = three.iter().map(Candle::body).fold(0.0, f64::max);
    three.iter().all(|c| c.body() > largest * THREE_CANDLE_BODY_RATIO)
}

fn is_three_white_soldiers(three: &[Candle]) -> bool {
    three.len() == 3
        && three.iter().all(Candle::is_bullish)
        && three[0].close < three[1].close
        && three[1].close < three[2].close
        && bodies_are_even(three)
}

fn is_three_black_crows(three: &[Candle]) -> bool {
    three.len() == 3
        && three.iter().all(Candle::is_bearish)
        && three[0].close > three[1].close
        && three[1].close > three[2].close
        && bodies_are_even(three)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::candle;

    fn ohlc(open: f64, close: f64) -> Candle {
        candle(open, open.max(close), open.min(close), close, 100.0)
    }

    #[test]
    fn test_gap_up_threshold_boundary() {
        let prev = ohlc(99.0, 100.0);
        assert!(!detect_gaps(&ohlc(100.4, 101.0), &prev).gap_up);
        assert!(!detect_gaps(&ohlc(100.0 * 1.004, 101.0), &prev).gap_up);
        assert!(detect_gaps(&ohlc(100.6, 101.0), &prev).gap_up);
    }

    #[test]
    fn test_gap_down_threshold_boundary() {
        let prev = ohlc(101.0, 100.0);
        assert!(!detect_gaps(&ohlc(99.6, 99.0), &prev).gap_down);
        assert!(detect_gaps(&ohlc(99.4, 99.0), &prev).gap_down);
    }

    #[test]
    fn test_bullish_engulfing() {
        let prev = ohlc(101.0, 100.0);
        let last = ohlc(99.5, 102.0);
        let flags = detect_engulfing(&last, &prev);
        assert!(flags.bullish);
        assert!(!flags.bearish);
    }

    #[test]
    fn test_engulfing_requires_larger_body() {
        let prev = ohlc(101.0, 99.0);
        // Body 2.5 against 2.0: covers the previous body but is below the 1.5x ratio.
        let last = ohlc(98.9, 101.4);
        assert!(!detect_engulfing(&last, &prev).bullish);
    }

    #[test]
    fn test_bearish_engulfing() {
        let prev = ohlc(100.0, 101.0);
        let last = ohlc(101.5, 99.0);
        let flags = detect_engulfing(&last, &prev);
        assert!(flags.bearish);
        assert!(!flags.bullish);
    }

    #[test]
    fn test_three_white_soldiers_conditions() {
        let base = vec![ohlc(100.0, 102.0), ohlc(101.5, 103.5), ohlc(103.0, 105.0)];
        assert!(detect_candlestick_patterns(&base).is_three_white_soldiers);

        // Closes not strictly increasing.
        let flat_close = vec![ohlc(100.0, 102.0), ohlc(100.5, 102.0), ohlc(103.0, 105.0)];
        assert!(!detect_candlestick_patterns(&flat_close).is_three_white_soldiers);

        // One body too small compared with the others.
        let thin_body = vec![ohlc(100.0, 102.0), ohlc(102.5, 103.0), ohlc(103.0, 105.0)];
        assert!(!detect_candlestick_patterns(&thin_body).is_three_white_soldiers);

        // One bearish candle.
        let bearish_middle = vec![ohlc(100.0, 102.0), ohlc(104.0, 103.0), ohlc(103.0, 105.0)];
        assert!(!detect_candlestick_patterns(&bearish_middle).is_three_white_soldiers);
    }

    #[test]
    fn test_three_black_crows() {
        let crows = vec![ohlc(105.0, 103.0), ohlc(103.5, 101.5), ohlc(102.0, 100.0)];
        let flags = detect_candlestick_patterns(&crows);
        assert!(flags.is_three_black_crows);
        assert!(!flags.is_three_white_soldiers);
    }

    #[test]
    fn test_short_series() {
        assert_eq!(detect_candlestick_patterns(&[]), PatternFlags::default());
        let two = vec![ohlc(101.0, 100.0), ohlc(99.5, 102.0)];
        let flags = detect_candlestick_patterns(&two);
        assert!(flags.bullish_engulfing);
        assert!(!flags.is_three_white_soldiers);
    }
}
