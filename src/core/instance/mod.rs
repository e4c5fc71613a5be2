pub mod manager;
pub mod model;

pub use manager::InstanceRepository;
pub use model::{Instance, InstanceInfo, InstanceType, CURRENT_CONFIG_VERSION};
