pub mod detector;
mod firewall;
mod ids;
pub mod model;

pub use detector::ConflictDetector;
pub use model::{Conflict, ConflictType, Severity};
