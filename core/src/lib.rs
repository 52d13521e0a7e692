pub mod device;
pub mod error;
pub mod options;
pub mod registry;

pub use device::{Device, DeviceType, DEFAULT_SECTOR_SIZE};
pub use error::{DecodeError, RawDiskError};
pub use options::DecodeOptions;
pub use registry::PartitionTypeRegistry;
