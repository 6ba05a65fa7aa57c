pub mod config;
pub mod error;
pub mod irreversible;
pub mod jsonrpc;
pub mod merge;
pub mod models;
pub mod policy;
pub mod ttl;
pub mod upstream;
pub mod urn;
