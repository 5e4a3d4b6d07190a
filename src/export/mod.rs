pub mod csv_file;
pub mod parquet_file;

pub use csv_file::{write_panel_csv, write_panel_csv_to, PANEL_HEADER};
pub use parquet_file::write_panel_parquet;
