pub mod access_log;
pub mod building;
pub mod plate;
pub mod vehicle;

pub use access_log::AccessLogEntry;
pub use building::Building;
pub use vehicle::{NewVehicle, Vehicle, VehiclePatch};
