pub use activity::*;
pub use descending::*;
pub use interval::*;
pub use key::*;

mod activity;
mod descending;
mod interval;
mod key;
