//! SQLite storage for the sales tax catalog.
//!
//! Money and rates are stored as `REAL` and read back through
//! [`decimal::get_decimal`]; timestamps are RFC 3339 `TEXT`.

pub mod decimal;
pub mod factory;
pub mod repository;

pub use factory::SqliteRepositoryFactory;
pub use repository::SqliteRepository;
