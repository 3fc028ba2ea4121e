pub mod memory;
pub mod sqlite;

pub use memory::InMemoryPriceRepository;
pub use sqlite::SqlitePriceRepository;
