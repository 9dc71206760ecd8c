//! Operation-specific payload shapers: encoders/decoders that turn a
//! logical payload unit (a file chunk, a filename, a size, a checksum)
//! into frame-sized `Data` regions and back.

mod checksum;
mod data;
mod filename;
mod size;

pub use checksum::{encode_checksum, verify_checksum};
pub use data::{decode_chunk, encode_chunk};
pub use filename::{strip_path, FilenameEncoder, FilenameReceiver};
pub use size::{decode_size, encode_size};
