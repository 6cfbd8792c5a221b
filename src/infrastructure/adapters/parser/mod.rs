//! Parser Adapter - 上游页面解析实现

mod gequbao_parser;

pub use gequbao_parser::GequbaoPageParser;
