// In-memory charting library retaining one surface per draw target
use crate::application::chart_library::{ChartLibrary, DrawnChart};
use crate::domain::chart::ChartSpec;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// What a renderer paints into one draw target
#[derive(Debug, Clone, Serialize)]
pub struct Surface {
    pub chart_id: u64,
    pub target: String,
    pub spec: ChartSpec,
    /// Incremented on every update after the initial draw
    pub revision: u64,
}

#[derive(Debug, Default)]
struct Surfaces {
    by_target: Mutex<BTreeMap<String, Surface>>,
    next_id: AtomicU64,
    drawn_total: AtomicU64,
}

impl Surfaces {
    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Surface>> {
        self.by_target.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RetainedCharts {
    surfaces: Arc<Surfaces>,
}

impl RetainedCharts {
    pub fn new() -> Self {
        Self::default()
    }

    /// All live surfaces ordered by draw target
    pub fn snapshot(&self) -> Vec<Surface> {
        self.surfaces.lock().values().cloned().collect()
    }

    pub fn surface(&self, target: &str) -> Option<Surface> {
        self.surfaces.lock().get(target).cloned()
    }

    pub fn live_count(&self) -> usize {
        self.surfaces.lock().len()
    }

    /// Number of charts ever drawn, destroyed ones included
    pub fn drawn_total(&self) -> u64 {
        self.surfaces.drawn_total.load(Ordering::Relaxed)
    }
}

impl ChartLibrary for RetainedCharts {
    fn draw(&self, target: &str, spec: &ChartSpec) -> Box<dyn DrawnChart> {
        let chart_id = self.surfaces.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.surfaces.drawn_total.fetch_add(1, Ordering::Relaxed);

        let surface = Surface {
            chart_id,
            target: target.to_string(),
            spec: spec.clone(),
            revision: 0,
        };
        if self
            .surfaces
            .lock()
            .insert(target.to_string(), surface)
            .is_some()
        {
            tracing::warn!(draw_target = target, "Draw target already held a chart; replacing it");
        }

        Box::new(RetainedChart {
            chart_id,
            target: target.to_string(),
            surfaces: Arc::clone(&self.surfaces),
        })
    }
}

struct RetainedChart {
    chart_id: u64,
    target: String,
    surfaces: Arc<Surfaces>,
}

impl DrawnChart for RetainedChart {
    fn update(&mut self, spec: &ChartSpec) {
        let mut surfaces = self.surfaces.lock();
        match surfaces.get_mut(&self.target) {
            Some(surface) if surface.chart_id == self.chart_id => {
                surface.spec = spec.clone();
                surface.revision += 1;
            }
            _ => tracing::debug!(draw_target = %self.target, "Update on a replaced chart ignored"),
        }
    }

    fn destroy(self: Box<Self>) {
        let mut surfaces = self.surfaces.lock();
        // A newer chart may own the target by now
        if surfaces
            .get(&self.target)
            .is_some_and(|surface| surface.chart_id == self.chart_id)
        {
            surfaces.remove(&self.target);
        }
    }
}
