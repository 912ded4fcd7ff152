// Domain layer - Pure data types and time-window arithmetic
pub mod chart;
pub mod dashboard;
pub mod room;
pub mod sensor;
pub mod telemetry;
pub mod theme;
pub mod view;
