// GUID Partition Table decoding
pub mod array;
pub mod entry;
pub mod header;

pub use array::GptPartitionArrayDecoder;
pub use entry::{GptAttributes, GptPartitionEntry, GPT_ENTRY_MIN_SIZE};
pub use header::{GptHeader, GptHeaderDecoder, GPT_HEADER_SIZE, GPT_SIGNATURE};
