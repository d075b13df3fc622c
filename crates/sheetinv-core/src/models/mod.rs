//! Data models: workbook input, invoice output, configuration.

pub mod config;
pub mod invoice;
pub mod sheet;
