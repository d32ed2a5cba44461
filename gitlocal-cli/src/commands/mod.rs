//! CLI command implementations

pub mod open;
pub mod scan;

pub use open::OpenArgs;
pub use scan::ScanArgs;
