pub mod errors;
pub mod labels;
pub mod prediction;
pub mod sensor;
pub mod tensor;
pub mod treatment;
pub mod upload;
