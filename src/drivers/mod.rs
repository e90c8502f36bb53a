pub mod height;
pub mod yaw;
