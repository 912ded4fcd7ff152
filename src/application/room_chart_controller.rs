// Room chart controller - Keeps one room's charts in sync with the remote data API
use crate::application::chart_library::{ChartLibrary, DrawnChart};
use crate::application::clock::Clock;
use crate::application::sensor_api::{ApiError, SensorApi};
use crate::application::theme_store::ThemeStore;
use crate::domain::chart::ChartSpec;
use crate::domain::dashboard::{
    ChartCard, DashboardView, INIT_ERROR_TITLE, KpiDisplay, KpiReadouts, RefreshSettings,
    ViewStatus, draw_target,
};
use crate::domain::room::{Room, RoomIndex};
use crate::domain::sensor::{SensorDescriptor, SensorType};
use crate::domain::telemetry::SeriesBuffer;
use crate::domain::theme::Theme;
use crate::domain::view::{MonthSelection, TimeWindow, ViewMode, day_bounds, month_bounds};
use chrono::{Local, NaiveDate};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("failed to load rooms and sensors: {0}")]
    Initialization(#[source] ApiError),

    #[error("dashboard is not ready ({0:?})")]
    NotReady(ViewStatus),
}

/// A drawn chart together with the series it was drawn from
struct ChartHandle {
    sensor_type: SensorType,
    chart: Box<dyn DrawnChart>,
    spec: ChartSpec,
    buffer: SeriesBuffer,
}

struct ControllerState {
    status: ViewStatus,
    title: String,
    rooms: Vec<Room>,
    index: RoomIndex,
    active_room: Option<String>,
    mode: ViewMode,
    day: Option<NaiveDate>,
    month: Option<MonthSelection>,
    cards: Vec<ChartCard>,
    kpis: KpiReadouts,
    theme: Theme,
    refresh: RefreshSettings,
    handles: HashMap<String, ChartHandle>,
    /// Bumped on every render and on dispose; results carrying an older value are dropped
    generation: u64,
}

impl ControllerState {
    fn snapshot(&self) -> DashboardView {
        DashboardView {
            status: self.status,
            title: self.title.clone(),
            rooms: self.rooms.clone(),
            active_room: self.active_room.clone(),
            mode: self.mode,
            day: self.day,
            month: self.month,
            cards: self.cards.clone(),
            kpis: KpiDisplay::from(&self.kpis),
            theme: self.theme,
            refresh: self.refresh,
            generation: self.generation,
        }
    }

    fn destroy_charts(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.chart.destroy();
        }
        self.cards.clear();
    }

    fn card_mut(&mut self, sensor_id: &str) -> Option<&mut ChartCard> {
        self.cards.iter_mut().find(|card| card.sensor_id == sensor_id)
    }
}

/// Inputs of one render, captured when its generation starts
struct RenderPlan {
    generation: u64,
    room_id: String,
    mode: ViewMode,
    sensors: Vec<SensorDescriptor>,
    theme: Theme,
    day: Option<NaiveDate>,
    month: Option<MonthSelection>,
}

pub struct RoomChartController {
    api: Arc<dyn SensorApi>,
    charts: Arc<dyn ChartLibrary>,
    themes: Arc<dyn ThemeStore>,
    clock: Arc<dyn Clock>,
    state: Mutex<ControllerState>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
    updates: watch::Sender<DashboardView>,
}

impl RoomChartController {
    pub fn new(
        api: Arc<dyn SensorApi>,
        charts: Arc<dyn ChartLibrary>,
        themes: Arc<dyn ThemeStore>,
        clock: Arc<dyn Clock>,
        refresh: RefreshSettings,
    ) -> Arc<Self> {
        let state = ControllerState {
            status: ViewStatus::Uninitialized,
            title: String::new(),
            rooms: Vec::new(),
            index: RoomIndex::default(),
            active_room: None,
            mode: ViewMode::Realtime,
            day: None,
            month: None,
            cards: Vec::new(),
            kpis: KpiReadouts::default(),
            theme: themes.load(),
            refresh,
            handles: HashMap::new(),
            generation: 0,
        };
        let (updates, _) = watch::channel(state.snapshot());

        Arc::new(Self {
            api,
            charts,
            themes,
            clock,
            state: Mutex::new(state),
            refresh_task: Mutex::new(None),
            updates,
        })
    }

    /// Load the sensor map and room list, then select the first room.
    ///
    /// Failure is terminal for the view: the title shows a static error and
    /// nothing is retried.
    pub async fn initialize(self: &Arc<Self>) -> Result<(), ControllerError> {
        let loaded = async {
            let placements = self.api.room_sensor_map().await?;
            let rooms = self.api.list_rooms().await?;
            Ok::<_, ApiError>((placements, rooms))
        }
        .await;

        let (placements, room_ids) = match loaded {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch rooms and sensor mapping");
                let mut state = self.lock_state();
                state.status = ViewStatus::Failed;
                state.title = INIT_ERROR_TITLE.to_string();
                self.publish(&state);
                return Err(ControllerError::Initialization(e));
            }
        };

        let first_room = {
            let mut state = self.lock_state();
            state.index = RoomIndex::build(
                placements
                    .into_iter()
                    .map(|p| (p.sensor_id, p.room_id, p.sensor_type)),
            );
            state.rooms = room_ids.into_iter().map(Room::new).collect();
            state.status = ViewStatus::Ready;
            tracing::info!(
                rooms = state.rooms.len(),
                sensors = state.index.sensor_count(),
                "Dashboard initialized"
            );
            self.publish(&state);
            state.rooms.first().map(|room| room.id.clone())
        };

        if let Some(room_id) = first_room {
            self.select_room(&room_id).await?;
        }
        Ok(())
    }

    /// Make `room_id` active and redraw it in the current mode.
    ///
    /// Rooms without sensors (or unknown to the index) render an empty chart set.
    pub async fn select_room(self: &Arc<Self>, room_id: &str) -> Result<(), ControllerError> {
        {
            let mut state = self.lock_state();
            if state.status != ViewStatus::Ready {
                return Err(ControllerError::NotReady(state.status));
            }
            if !state.index.contains(room_id) {
                tracing::debug!(room_id, "Selected room has no sensors");
            }
            state.active_room = Some(room_id.to_string());
        }
        tracing::info!(room_id, "Room selected");
        self.render().await;
        Ok(())
    }

    pub async fn set_mode(self: &Arc<Self>, mode: ViewMode) {
        self.cancel_refresh();
        self.lock_state().mode = mode;
        tracing::info!(%mode, "View mode changed");
        self.render().await;
    }

    /// Pick the day shown in daily mode; `None` means today
    pub async fn set_day(self: &Arc<Self>, day: Option<NaiveDate>) {
        let mode = {
            let mut state = self.lock_state();
            state.day = day;
            state.mode
        };
        if mode == ViewMode::Daily {
            self.render().await;
        }
    }

    /// Pick the month shown in monthly mode; `None` means the current month
    pub async fn set_month(self: &Arc<Self>, month: Option<MonthSelection>) {
        let mode = {
            let mut state = self.lock_state();
            state.month = month;
            state.mode
        };
        if mode == ViewMode::Monthly {
            self.render().await;
        }
    }

    /// Enable or disable realtime auto-refresh and change its interval
    pub fn set_auto_refresh(self: &Arc<Self>, enabled: bool, interval_secs: Option<u64>) {
        self.cancel_refresh();
        let generation = {
            let mut state = self.lock_state();
            state.refresh = RefreshSettings::new(enabled, interval_secs);
            self.publish(&state);
            state.generation
        };
        self.arm_refresh(generation);
    }

    /// Flip dark/light, persist the flag and redraw so chart colours follow
    pub async fn toggle_theme(self: &Arc<Self>) -> Theme {
        let (theme, has_room) = {
            let mut state = self.lock_state();
            state.theme = state.theme.toggled();
            self.publish(&state);
            (state.theme, state.active_room.is_some())
        };
        if let Err(e) = self.themes.save(theme) {
            tracing::warn!(error = %e, "Failed to persist theme");
        }
        if has_room {
            self.render().await;
        }
        theme
    }

    /// Destroy every chart and redraw the active room in the active mode
    pub async fn render(self: &Arc<Self>) {
        let Some(plan) = self.begin_render() else {
            return;
        };
        tracing::debug!(
            room_id = %plan.room_id,
            mode = %plan.mode,
            generation = plan.generation,
            sensors = plan.sensors.len(),
            "Rendering room"
        );
        match plan.mode {
            ViewMode::Realtime => self.draw_realtime(plan).await,
            ViewMode::Daily => self.draw_daily(plan).await,
            ViewMode::Monthly => self.draw_monthly(plan).await,
        }
    }

    fn begin_render(&self) -> Option<RenderPlan> {
        self.cancel_refresh();
        let mut state = self.lock_state();
        if state.status != ViewStatus::Ready {
            return None;
        }
        let room_id = state.active_room.clone()?;

        state.generation += 1;
        state.destroy_charts();
        self.publish(&state);

        Some(RenderPlan {
            generation: state.generation,
            sensors: state.index.sensors(&room_id).to_vec(),
            room_id,
            mode: state.mode,
            theme: state.theme,
            day: state.day,
            month: state.month,
        })
    }

    async fn draw_realtime(self: &Arc<Self>, plan: RenderPlan) {
        let window = TimeWindow::trailing_hour(self.clock.now().timestamp_millis());
        let generation = plan.generation;

        let started = self.with_current(generation, |state| {
            state.title = format!("Real-time (Last 1 Hour) - Room {}", plan.room_id);
            state.kpis = KpiReadouts::default();
        });
        if started.is_none() {
            return;
        }

        for sensor in &plan.sensors {
            let title = format!("{} ({})", sensor.sensor_type.title(), sensor.sensor_id);
            if !self.add_card(generation, sensor, title) {
                return;
            }

            tracing::debug!(sensor_id = %sensor.sensor_id, "Fetching realtime history");
            let result = self.api.history(&sensor.sensor_id, window).await;

            let applied = self.with_current(generation, |state| match result {
                Ok(points) => {
                    let buffer = SeriesBuffer::from_points(points);
                    if let Some(last) = buffer.last() {
                        state.kpis.set(sensor.sensor_type, last.value);
                    }
                    let spec = ChartSpec::realtime(
                        sensor.sensor_type,
                        buffer.points(),
                        window,
                        plan.theme,
                    );
                    self.attach_chart(state, sensor, spec, buffer);
                }
                Err(e) => {
                    tracing::warn!(sensor_id = %sensor.sensor_id, error = %e, "Fetch failed");
                    mark_error(state, &sensor.sensor_id);
                }
            });
            if applied.is_none() {
                return;
            }
        }

        self.arm_refresh(generation);
    }

    async fn draw_daily(self: &Arc<Self>, plan: RenderPlan) {
        let today = self.clock.now().with_timezone(&Local).date_naive();
        let day = plan.day.unwrap_or(today);
        let generation = plan.generation;
        let Some(bounds) = day_bounds(day, &Local) else {
            tracing::warn!(%day, "Day selection out of range");
            self.with_current(generation, |state| {
                state.title = format!("Error: Invalid date {} - Room {}", day, plan.room_id);
            });
            return;
        };

        let started = self.with_current(generation, |state| {
            state.day = Some(day);
            state.title = format!(
                "Daily Trend for {} - Room {}",
                day.format("%Y-%m-%d"),
                plan.room_id
            );
        });
        if started.is_none() {
            return;
        }

        for sensor in &plan.sensors {
            let title = format!("Daily {} Trend", sensor.sensor_type.title());
            if !self.add_card(generation, sensor, title) {
                return;
            }

            tracing::debug!(sensor_id = %sensor.sensor_id, %day, "Fetching daily history");
            let result = self.api.history(&sensor.sensor_id, bounds).await;

            let applied = self.with_current(generation, |state| match result {
                Ok(points) if points.is_empty() => {
                    if let Some(card) = state.card_mut(&sensor.sensor_id) {
                        card.mark_no_data(" - No data");
                    }
                }
                Ok(points) => {
                    let buffer = SeriesBuffer::from_points(points);
                    let spec =
                        ChartSpec::daily(sensor.sensor_type, buffer.points(), bounds, plan.theme);
                    self.attach_chart(state, sensor, spec, buffer);
                }
                Err(e) => {
                    tracing::warn!(sensor_id = %sensor.sensor_id, error = %e, "Daily fetch failed");
                    mark_error(state, &sensor.sensor_id);
                }
            });
            if applied.is_none() {
                return;
            }
        }
    }

    async fn draw_monthly(self: &Arc<Self>, plan: RenderPlan) {
        let today = self.clock.now().with_timezone(&Local).date_naive();
        let month = plan.month.unwrap_or_else(|| MonthSelection::of(today));
        let generation = plan.generation;
        let Some(bounds) = month_bounds(month, &Local) else {
            tracing::warn!(%month, "Month selection out of range");
            self.with_current(generation, |state| {
                state.title = format!("Error: Invalid month {} - Room {}", month, plan.room_id);
            });
            return;
        };

        let started = self.with_current(generation, |state| {
            state.month = Some(month);
            state.title = format!(
                "Monthly Min/Max for {} - Room {}",
                month.display_name(),
                plan.room_id
            );
        });
        if started.is_none() {
            return;
        }

        for sensor in &plan.sensors {
            let title = format!("{} Min/Max", sensor.sensor_type.title());
            if !self.add_card(generation, sensor, title) {
                return;
            }

            tracing::debug!(sensor_id = %sensor.sensor_id, %month, "Fetching daily aggregate");
            let result = self.api.daily_aggregate(&sensor.sensor_id, bounds).await;

            let applied = self.with_current(generation, |state| match result {
                Ok(aggregate) if aggregate.is_empty() => {
                    if let Some(card) = state.card_mut(&sensor.sensor_id) {
                        card.mark_no_data(" - No data for this month.");
                    }
                }
                Ok(aggregate) => {
                    let spec = ChartSpec::monthly(sensor.sensor_type, &aggregate, plan.theme);
                    self.attach_chart(state, sensor, spec, SeriesBuffer::default());
                }
                Err(e) => {
                    tracing::warn!(sensor_id = %sensor.sensor_id, error = %e, "Aggregate fetch failed");
                    mark_error(state, &sensor.sensor_id);
                }
            });
            if applied.is_none() {
                return;
            }
        }
    }

    /// Poll the latest reading of every realtime chart and slide its window.
    ///
    /// Returns the number of charts that received a new point.
    pub async fn incremental_update(&self) -> usize {
        let (generation, sensors) = {
            let state = self.lock_state();
            if state.mode != ViewMode::Realtime || state.status != ViewStatus::Ready {
                return 0;
            }
            let Some(room_id) = state.active_room.as_deref() else {
                return 0;
            };
            let sensors: Vec<SensorDescriptor> = state
                .index
                .sensors(room_id)
                .iter()
                .filter(|sensor| state.handles.contains_key(&sensor.sensor_id))
                .cloned()
                .collect();
            (state.generation, sensors)
        };

        let mut advanced = 0;
        for sensor in &sensors {
            let point = match self.api.latest(&sensor.sensor_id).await {
                Ok(Some(point)) => point,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(sensor_id = %sensor.sensor_id, error = %e, "Update failed");
                    continue;
                }
            };

            let window = TimeWindow::trailing_hour(self.clock.now().timestamp_millis());
            let appended = self.with_current(generation, |state| {
                let Some(handle) = state.handles.get_mut(&sensor.sensor_id) else {
                    return false;
                };
                if !handle.buffer.append_if_newer(point) {
                    return false;
                }
                handle.buffer.evict_before(window.from_ms);
                handle.spec.slide(handle.buffer.points(), window);
                handle.chart.update(&handle.spec);
                let sensor_type = handle.sensor_type;
                state.kpis.set(sensor_type, point.value);
                true
            });
            match appended {
                Some(true) => advanced += 1,
                Some(false) => {}
                None => break,
            }
        }
        advanced
    }

    /// Cancel the refresh timer and destroy every chart.
    ///
    /// Results of in-flight fetches are discarded once they arrive.
    pub fn dispose(&self) {
        self.cancel_refresh();
        let mut state = self.lock_state();
        state.generation += 1;
        state.destroy_charts();
        state.status = ViewStatus::Disposed;
        self.publish(&state);
        tracing::info!("Dashboard disposed");
    }

    pub fn view(&self) -> DashboardView {
        self.lock_state().snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardView> {
        self.updates.subscribe()
    }

    pub fn rooms(&self) -> Vec<Room> {
        self.lock_state().rooms.clone()
    }

    pub fn is_refresh_armed(&self) -> bool {
        self.lock_refresh()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Start the repeating realtime update, replacing any previous timer
    fn arm_refresh(self: &Arc<Self>, generation: u64) {
        let settings = {
            let state = self.lock_state();
            if state.generation != generation
                || state.status != ViewStatus::Ready
                || state.mode != ViewMode::Realtime
                || state.handles.is_empty()
                || !state.refresh.enabled
            {
                return;
            }
            state.refresh
        };

        let period = Duration::from_secs(settings.interval_secs);
        let controller = Arc::downgrade(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(controller) = controller.upgrade() else {
                    break;
                };
                let advanced = controller.incremental_update().await;
                tracing::debug!(advanced, "Realtime charts refreshed");
            }
        });

        tracing::debug!(interval_secs = settings.interval_secs, "Auto-refresh armed");
        self.replace_refresh(Some(task));
    }

    fn cancel_refresh(&self) {
        self.replace_refresh(None);
    }

    fn replace_refresh(&self, task: Option<JoinHandle<()>>) {
        let previous = std::mem::replace(&mut *self.lock_refresh(), task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn add_card(&self, generation: u64, sensor: &SensorDescriptor, title: String) -> bool {
        let card = ChartCard::new(sensor.sensor_id.clone(), sensor.sensor_type, title);
        self.with_current(generation, |state| state.cards.push(card))
            .is_some()
    }

    fn attach_chart(
        &self,
        state: &mut ControllerState,
        sensor: &SensorDescriptor,
        spec: ChartSpec,
        buffer: SeriesBuffer,
    ) {
        let chart = self.charts.draw(&draw_target(&sensor.sensor_id), &spec);
        let previous = state.handles.insert(
            sensor.sensor_id.clone(),
            ChartHandle {
                sensor_type: sensor.sensor_type,
                chart,
                spec,
                buffer,
            },
        );
        if let Some(previous) = previous {
            previous.chart.destroy();
        }
        if let Some(card) = state.card_mut(&sensor.sensor_id) {
            card.mark_ready();
        }
    }

    /// Run `apply` only if no newer render has started since `generation`
    fn with_current<R>(
        &self,
        generation: u64,
        apply: impl FnOnce(&mut ControllerState) -> R,
    ) -> Option<R> {
        let mut state = self.lock_state();
        if state.generation != generation {
            tracing::debug!(
                stale = generation,
                current = state.generation,
                "Discarding result of superseded render"
            );
            return None;
        }
        let result = apply(&mut state);
        self.publish(&state);
        Some(result)
    }

    fn publish(&self, state: &ControllerState) {
        self.updates.send_replace(state.snapshot());
    }

    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_refresh(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.refresh_task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for RoomChartController {
    fn drop(&mut self) {
        let task = self
            .refresh_task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
        self.state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .destroy_charts();
    }
}

fn mark_error(state: &mut ControllerState, sensor_id: &str) {
    if let Some(card) = state.card_mut(sensor_id) {
        card.mark_error();
    }
}
