pub mod gaussian;
pub mod gaussian_partition_worker;
