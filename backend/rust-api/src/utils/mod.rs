pub mod quiz_parser;
pub mod retry;
