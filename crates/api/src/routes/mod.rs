pub mod jsonrpc;
pub mod status;
