pub use cursor::*;
pub use http::*;
pub use source::*;
pub use store::*;

mod cursor;
mod http;
mod source;
mod store;
