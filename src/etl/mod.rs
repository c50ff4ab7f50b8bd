//! Core ETL (Extract, Transform, Load) abstractions
//!
//! This module provides the trait seams a transfer is built from and the
//! [`Pipeline`] driver that sequences them row by row.

mod connect;
mod extract;
mod load;
mod observer;
mod pipeline;
mod report;
mod transform;

pub use connect::Connector;
pub use extract::{Extractor, RowStream};
pub use load::Loader;
pub use observer::{LogObserver, TransferObserver};
pub use pipeline::{Pipeline, PipelineState};
pub use report::TransferResult;
pub use transform::Transformer;
