use crate::error::{Error, Result};
use crate::price_infra::SourceQuote;

/// Number of independent quotes every aggregated price is built from.
pub const REQUIRED_QUOTES: usize = 2;

/// Arithmetic mean of exactly two source quotes.
///
/// Any other count is rejected so a stored sample always means the same thing:
/// the mean of two independent feeds, never a single-source value.
pub fn aggregate(quotes: &[SourceQuote]) -> Result<f64> {
    if quotes.len() != REQUIRED_QUOTES {
        return Err(Error::InsufficientQuotes(quotes.len()));
    }

    // Halve before summing so two finite quotes near f64::MAX stay finite.
    let mean: f64 = quotes.iter().map(|q| q.price / REQUIRED_QUOTES as f64).sum();
    if !mean.is_finite() {
        return Err(Error::NonFiniteAggregate(mean));
    }
    Ok(mean)
}
