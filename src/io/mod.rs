pub mod csv;

pub use self::csv::{read_horizon, read_horizon_file, write_dispatch, write_dispatch_file};
