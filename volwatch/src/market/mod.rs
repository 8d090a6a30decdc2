pub mod errors;
pub mod source;
pub mod twelvedata;
pub mod types;

pub use errors::QuoteError;
pub use source::QuoteSource;
pub use types::{Candle, CandleWindow, InstrumentId, WindowOrder, WindowSpec};
