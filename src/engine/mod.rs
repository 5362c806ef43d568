//! Pure computation engines: book materialization and trade reconstruction.
//!
//! Nothing here performs I/O or holds shared state; both entry points are safe
//! to call from any thread.

pub mod materializer;
pub mod reconstructor;

pub use materializer::materialize;
pub use reconstructor::{
    reconstruct, summarize, CompletedTrade, PositionAccumulator, TradeReconstructor,
    TradeSummary,
};
