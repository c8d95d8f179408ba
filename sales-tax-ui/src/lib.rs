//! Front ends for the sales-tax catalog: an interactive console and a JSON
//! HTTP API, both over any registered storage backend.

pub mod app;
pub mod console;
pub mod history;
pub mod logging;
pub mod reports;
pub mod utils;
pub mod web;
