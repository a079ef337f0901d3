pub mod call;
pub mod client;
pub mod serve;
pub mod session;
