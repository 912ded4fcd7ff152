// Infrastructure layer - External dependencies and adapters
pub mod chunked_json;
pub mod config;
pub mod http_response;
pub mod http_sensor_api;
pub mod retained_charts;
pub mod theme_file;
