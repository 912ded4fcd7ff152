// Charting library port
use crate::domain::chart::ChartSpec;

/// A chart drawn into some target surface
pub trait DrawnChart: Send {
    /// Repaint with a modified spec, without animation
    fn update(&mut self, spec: &ChartSpec);

    /// Release the drawing surface. The chart is unusable afterwards.
    fn destroy(self: Box<Self>);
}

pub trait ChartLibrary: Send + Sync {
    fn draw(&self, target: &str, spec: &ChartSpec) -> Box<dyn DrawnChart>;
}
