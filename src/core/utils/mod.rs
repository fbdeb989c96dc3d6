/// Logging sink and check macros
pub mod log;
