//! CLI command implementations

mod init;
mod ingest;
mod rank;
mod serve;
mod status;

pub use init::*;
pub use ingest::*;
pub use rank::*;
pub use serve::*;
pub use status::*;
