pub mod clock;
pub mod engine;
pub mod telemetry;


pub use clock::{Clock, ManualClock, TokioClock};
pub use engine::{
    position_at, SimulationEngine, SimulationStatus, SimulationUpdate, FALLBACK_POSITION,
    TICK_INTERVAL,
};
pub use telemetry::{drift, speed_at, Telemetry};
