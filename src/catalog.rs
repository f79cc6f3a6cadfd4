//! Batch transformer for the product catalog.
//!
//! Reads `ProductID,Name,Price,Category` rows, uppercases names, discounts
//! electronics, buckets prices into ranges and writes
//! `ProductID,Name,Price,Category,PriceRange` rows. Prices are exact decimals
//! throughout.

mod pipeline;
mod product;
mod transform;

pub use pipeline::{
    process, run, PipelineConfig, PipelineError, RowCounts, RunSummary, DEFAULT_INPUT_PATH,
    DEFAULT_OUTPUT_PATH, OUTPUT_HEADER,
};
pub use product::{parse_price, Product, RowError};
pub use transform::{
    round_price, transform, PriceRange, TransformedProduct, DISCOUNT_RATE, ELECTRONICS,
    PREMIUM_ELECTRONICS, PREMIUM_THRESHOLD,
};
