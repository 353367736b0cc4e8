pub mod labels;
pub mod sensor_store;
pub mod uploads;
