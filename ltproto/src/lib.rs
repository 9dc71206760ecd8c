//! A stop-and-wait, link-layer file-transfer protocol: frame codec,
//! sequence arithmetic, payload shapers, and the sender/receiver engines
//! that drive a BACKUP, RESTORE or VERIFY session to completion over any
//! [`Transport`](transport::Transport).

pub mod config;
pub mod error;
pub mod frame;
pub mod operation;
pub mod payload;
pub mod phase;
pub mod receiver;
pub mod sender;
pub mod sequence;
pub mod transport;

#[cfg(feature = "raw-socket")]
pub mod raw_socket;

pub use config::Config;
pub use error::{Error, Result};
pub use frame::Frame;
pub use operation::Operation;
pub use transport::Transport;
