pub mod blur_config;
pub mod blur_error;
pub mod partition_worker;
pub mod partitioner;
pub mod work_unit;
