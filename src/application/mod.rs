// Application layer - Ports and the room chart controller
pub mod chart_library;
pub mod clock;
pub mod room_chart_controller;
pub mod sensor_api;
pub mod theme_store;

#[cfg(test)]
pub mod testing;
