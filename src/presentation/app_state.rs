// Application state for HTTP handlers
use crate::application::room_chart_controller::RoomChartController;
use crate::infrastructure::retained_charts::RetainedCharts;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<RoomChartController>,
    pub charts: RetainedCharts,
}
