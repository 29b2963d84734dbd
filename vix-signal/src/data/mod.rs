pub mod source;
pub mod types;
pub mod yahoo;

pub use source::{
    align_ratios, aligned_ratios, fetch_quote_set, fetch_ratio_history, AlignedRatio, DataError,
    MarketData,
};
pub use types::{IndexSymbol, MonthlyClose, QuoteError, QuoteSet, TermStructure};
pub use yahoo::YahooClient;
