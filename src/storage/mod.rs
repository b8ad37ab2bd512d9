// Storage layer: the CSV lease table, file locks and atomic replacement.

pub mod atomic;
pub mod lock;
pub mod table;

pub use atomic::write_atomic;
pub use lock::FileLock;
pub use table::{Column, DecodedTable, RejectedRow, RowWarning, TableLayout};
