mod connection;
mod libsql;
mod schema;
mod traits;

pub use connection::Database;
pub use libsql::LibSqlMemoryAdapter;
pub use traits::MemoryAdapter;
