pub mod clock;
pub mod duration;
pub mod engine;
pub mod schedule;

pub use clock::ClockTime;
pub use duration::Hms;
pub use engine::{CalculationInput, CalculationResult, DrivingConstraint, calculate, calculate_with};
pub use schedule::{ScheduleConfig, ScheduleMode};
