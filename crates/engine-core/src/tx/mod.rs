//! Transaction processing (§4.F, §4.F.1, §4.F.2, §7).

pub mod auth;
pub mod equip;
pub mod error;
pub mod processor;

pub use error::TxError;
pub use processor::{TxResponse, process};
