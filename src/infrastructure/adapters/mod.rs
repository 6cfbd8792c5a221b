//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod http;
pub mod parser;
pub mod storage;

pub use self::http::*;
pub use parser::*;
pub use storage::*;
