//! Application services — use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.
//! Every service also implements [`Subsystem`](crate::registry::Subsystem) so it
//! can be registered in the [`SubsystemRegistry`](crate::registry::SubsystemRegistry).

pub mod ato_service;
pub mod doser_service;
pub mod equipment_service;
pub mod macro_service;
pub mod record_service;
pub mod temperature_service;
pub mod timer_service;

pub use ato_service::AtoService;
pub use doser_service::DoserService;
pub use equipment_service::EquipmentService;
pub use macro_service::MacroService;
pub use record_service::RecordService;
pub use temperature_service::TemperatureService;
pub use timer_service::TimerService;
