pub mod check;
pub mod list;
pub mod outline;
pub mod scan;
pub mod trend;
