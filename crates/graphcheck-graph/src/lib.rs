pub mod builder;
pub mod ingest;
pub mod memory;
pub mod rocksdb_store;

pub use builder::GraphBuilder;
pub use ingest::RepositoryIngestor;
pub use memory::MemoryGraphStore;
pub use rocksdb_store::RocksDbGraphStore;
