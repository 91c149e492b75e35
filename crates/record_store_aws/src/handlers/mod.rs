pub mod http;
pub mod invocation;
pub mod outcome;
