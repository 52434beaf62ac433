//! Keeps the map, ranking and correlation views consistent with one shared
//! selection state.
//!
//! Every operation validates first, then mutates [`ViewState`], renders every
//! affected frame and only then hands them to the presenter. A failing
//! operation leaves both state and views untouched.

use catalog::{DatasetCatalog, ScaleKind};
use compute::{RangeAnalyzer, TemporalAnalysis};
use foundation::{EntityId, Rgb, Year};
use formats::{EntityDirectory, RecordError, RecordTable};
use layers::{
    CorrelationFrame, CorrelationInput, CorrelationView, DOT_SIZE_RANGE, Legend, MapData,
    MapFrame, MapInput, MapView, Presenter, RankingFrame, RankingInput, RankingView, ScaleError,
    ScaleResolver, Series, ViewKind, Viewport,
};
use streaming::{Completion, LoadTicket, RequestTracker, ResourceLoadError, ResourceSource};
use tracing::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::dataset::Dataset;
use crate::event_bus::{Event, EventBus, Revision};
use crate::state::{Slot, ViewState};

const ALL_VIEWS: [ViewKind; 3] = [ViewKind::Map, ViewKind::Ranking, ViewKind::Correlation];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadFailure {
    Fetch(ResourceLoadError),
    Decode(RecordError),
}

impl std::fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadFailure::Fetch(e) => write!(f, "{e}"),
            LoadFailure::Decode(e) => write!(f, "{e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorError {
    ResourceLoad { resource: String, cause: LoadFailure },
    UnknownDataset(String),
    UnknownYear(Year),
    UnknownEntity(String),
    UnknownRegion(String),
    NotReady,
    InvalidThresholds(String),
    InvalidDotSize(u8),
    Scale(ScaleError),
}

impl std::fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordinatorError::ResourceLoad { resource, cause } => {
                write!(f, "failed to load {resource}: {cause}")
            }
            CoordinatorError::UnknownDataset(name) => write!(f, "unknown dataset: {name}"),
            CoordinatorError::UnknownYear(year) => write!(f, "year {year} is not in the dataset"),
            CoordinatorError::UnknownEntity(input) => write!(f, "no entity matches {input:?}"),
            CoordinatorError::UnknownRegion(region) => write!(f, "unknown region: {region}"),
            CoordinatorError::NotReady => write!(f, "no dataset loaded yet"),
            CoordinatorError::InvalidThresholds(msg) => write!(f, "invalid thresholds: {msg}"),
            CoordinatorError::InvalidDotSize(size) => {
                write!(f, "dot size {size} outside {DOT_SIZE_RANGE:?}")
            }
            CoordinatorError::Scale(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CoordinatorError {}

impl From<ScaleError> for CoordinatorError {
    fn from(e: ScaleError) -> Self {
        match e {
            ScaleError::InvalidThresholds(msg) => CoordinatorError::InvalidThresholds(msg),
            other => CoordinatorError::Scale(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The dataset was committed and these views were presented.
    Applied {
        slot: Slot,
        dataset: String,
        views: Vec<ViewKind>,
    },
    /// A newer selection for the same slot made this payload obsolete.
    Superseded,
}

/// Frames of one logical change.
#[derive(Default)]
struct Frames {
    map: Option<MapFrame>,
    ranking: Option<RankingFrame>,
    correlation: Option<CorrelationFrame>,
}

impl Frames {
    fn present<P: Presenter>(self, presenter: &mut P) -> Vec<ViewKind> {
        let mut shown = Vec::new();
        if let Some(frame) = self.map {
            presenter.present_map(&frame);
            shown.push(ViewKind::Map);
        }
        if let Some(frame) = self.ranking {
            presenter.present_ranking(&frame);
            shown.push(ViewKind::Ranking);
        }
        if let Some(frame) = self.correlation {
            presenter.present_correlation(&frame);
            shown.push(ViewKind::Correlation);
        }
        shown
    }
}

/// Fetches and decodes the entity directory.
pub async fn load_directory<S: ResourceSource>(
    source: &S,
    resource: &str,
) -> Result<EntityDirectory, CoordinatorError> {
    let raw = source.fetch(resource).await.map_err(|e| CoordinatorError::ResourceLoad {
        resource: resource.to_string(),
        cause: LoadFailure::Fetch(e),
    })?;
    let directory =
        EntityDirectory::parse_json(&raw).map_err(|e| CoordinatorError::ResourceLoad {
            resource: resource.to_string(),
            cause: LoadFailure::Decode(e),
        })?;
    info!(entities = directory.len(), "entity directory loaded");
    Ok(directory)
}

pub struct Coordinator<P: Presenter> {
    config: ViewerConfig,
    catalog: DatasetCatalog,
    directory: EntityDirectory,
    analyzer: RangeAnalyzer,
    state: ViewState,
    requests: RequestTracker<Slot>,
    presenter: P,
    events: EventBus,
    revision: Revision,
}

impl<P: Presenter> Coordinator<P> {
    pub fn new(
        config: ViewerConfig,
        catalog: DatasetCatalog,
        directory: EntityDirectory,
        presenter: P,
    ) -> Self {
        Self {
            analyzer: RangeAnalyzer::new(config.range_strategy),
            state: ViewState::new(&config),
            config,
            catalog,
            directory,
            requests: RequestTracker::new(),
            presenter,
            events: EventBus::new(),
            revision: Revision::default(),
        }
    }

    /// Loads the entity directory and the configured initial datasets.
    pub async fn start<S: ResourceSource>(
        config: ViewerConfig,
        catalog: DatasetCatalog,
        source: &S,
        presenter: P,
    ) -> Result<Self, CoordinatorError> {
        let directory = load_directory(source, &config.directory_resource).await?;

        let a = config.initial_dataset_a.clone();
        let b = config.initial_dataset_b.clone();
        let mut coordinator = Self::new(config, catalog, directory, presenter);
        coordinator.select_dataset(source, Slot::Primary, &a).await?;
        coordinator.select_dataset(source, Slot::Secondary, &b).await?;
        Ok(coordinator)
    }

    pub fn phase(&self) -> Phase {
        if self.requests.any_pending() {
            Phase::Loading
        } else if self.state.primary.is_some() {
            Phase::Ready
        } else {
            Phase::Idle
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &DatasetCatalog {
        &self.catalog
    }

    pub fn directory(&self) -> &EntityDirectory {
        &self.directory
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Selects a dataset for `slot`: fetch, decode, commit, present.
    pub async fn select_dataset<S: ResourceSource>(
        &mut self,
        source: &S,
        slot: Slot,
        name: &str,
    ) -> Result<LoadOutcome, CoordinatorError> {
        let ticket = self.begin_load(slot, name)?;
        let path = self.resource_path(&ticket)?;
        let payload = source.fetch(&path).await;
        self.complete_load(ticket, payload)
    }

    /// Registers a load, superseding any in-flight one for the same slot.
    pub fn begin_load(
        &mut self,
        slot: Slot,
        name: &str,
    ) -> Result<LoadTicket<Slot>, CoordinatorError> {
        let entry = self
            .catalog
            .get(name)
            .ok_or_else(|| CoordinatorError::UnknownDataset(name.to_string()))?;
        let ticket = self.requests.begin(slot, entry.name.clone());
        debug!(%slot, dataset = %entry.name, request = ticket.request.0, "load started");
        Ok(ticket)
    }

    pub fn resource_path(&self, ticket: &LoadTicket<Slot>) -> Result<String, CoordinatorError> {
        self.catalog
            .get(&ticket.resource)
            .map(|e| e.resource_path())
            .ok_or_else(|| CoordinatorError::UnknownDataset(ticket.resource.clone()))
    }

    /// Applies the payload of a load if its ticket is still the latest.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket<Slot>,
        payload: Result<String, ResourceLoadError>,
    ) -> Result<LoadOutcome, CoordinatorError> {
        if self.requests.complete(&ticket) == Completion::Superseded {
            debug!(slot = %ticket.slot, dataset = %ticket.resource, "stale load discarded");
            self.events.emit(
                Event::new(self.revision, "load_superseded", ticket.resource).for_slot(ticket.slot),
            );
            return Ok(LoadOutcome::Superseded);
        }

        let entry = self
            .catalog
            .get(&ticket.resource)
            .cloned()
            .ok_or_else(|| CoordinatorError::UnknownDataset(ticket.resource.clone()))?;
        let resource = entry.resource_path();
        let raw = payload.map_err(|e| {
            warn!(%resource, error = %e, "dataset fetch failed");
            CoordinatorError::ResourceLoad {
                resource: resource.clone(),
                cause: LoadFailure::Fetch(e),
            }
        })?;
        let table = RecordTable::parse_json(&raw).map_err(|e| {
            warn!(%resource, error = %e, "dataset decode failed");
            CoordinatorError::ResourceLoad {
                resource: resource.clone(),
                cause: LoadFailure::Decode(e),
            }
        })?;
        let dataset = Dataset::build(&entry, table, &self.analyzer)?;

        if ticket.slot == Slot::Primary {
            if let Some(h) = &self.state.highlighted
                && !dataset.table().contains(h)
            {
                debug!(entity = %h, "highlight not in new dataset, cleared");
                self.state.highlighted = None;
            }
            self.state.threshold_override = None;
        }
        match self.state.dataset_mut(ticket.slot) {
            Some(current) => current.replace_with(dataset),
            empty => *empty = Some(dataset),
        }
        self.realign_years();

        let affected: &[ViewKind] = match ticket.slot {
            Slot::Primary => &ALL_VIEWS,
            Slot::Secondary => &[ViewKind::Correlation],
        };
        let message = format!("{} <- {}", ticket.slot, entry.name);
        let views = self.commit("dataset_loaded", Some(ticket.slot), message, affected);
        info!(slot = %ticket.slot, dataset = %entry.name, "dataset loaded");
        Ok(LoadOutcome::Applied {
            slot: ticket.slot,
            dataset: entry.name,
            views,
        })
    }

    pub fn select_year(&mut self, year: Year) -> Result<(), CoordinatorError> {
        let primary = self.state.primary.as_mut().ok_or(CoordinatorError::NotReady)?;
        if !primary.set_year(year) {
            return Err(CoordinatorError::UnknownYear(year));
        }
        self.commit(
            "year_selected",
            Some(Slot::Primary),
            year.to_string(),
            &[ViewKind::Map, ViewKind::Ranking],
        );
        Ok(())
    }

    /// Returns the mode in effect, which is linear when a logarithmic
    /// request meets a non-positive range.
    pub fn select_scale_mode(&mut self, mode: ScaleKind) -> Result<ScaleKind, CoordinatorError> {
        let primary = self.state.primary.as_mut().ok_or(CoordinatorError::NotReady)?;
        let effective = primary.set_mode(mode)?;
        if effective != mode {
            warn!(requested = %mode, %effective, "scale mode fell back");
        }
        self.state.threshold_override = None;
        self.commit(
            "scale_mode_selected",
            Some(Slot::Primary),
            effective.to_string(),
            &[ViewKind::Map, ViewKind::Ranking],
        );
        Ok(effective)
    }

    /// `0` shows every entity; other values clamp to `[1, entity count]`.
    pub fn set_ranking_limit(&mut self, limit: usize) -> Result<usize, CoordinatorError> {
        let primary = self.state.primary.as_ref().ok_or(CoordinatorError::NotReady)?;
        let count = primary.table().entity_count();
        let stored = if limit == 0 { 0 } else { limit.clamp(1, count.max(1)) };
        self.state.ranking_limit = stored;
        self.commit("ranking_limit_changed", None, stored.to_string(), &[ViewKind::Ranking]);
        Ok(stored)
    }

    /// Highlights an entity by display name or id across all views; `""` clears.
    pub fn highlight(&mut self, name_or_id: &str) -> Result<Option<EntityId>, CoordinatorError> {
        let input = name_or_id.trim();
        let target = if input.is_empty() {
            None
        } else {
            Some(self.resolve_entity(input)?)
        };
        self.state.highlighted = target.clone();
        let message = target.as_ref().map_or_else(String::new, |id| id.to_string());
        self.commit("highlight", None, message, &ALL_VIEWS);
        Ok(target)
    }

    fn resolve_entity(&self, input: &str) -> Result<EntityId, CoordinatorError> {
        if let Some(id) = self.directory.resolve(input) {
            return Ok(id.clone());
        }
        let raw = EntityId::new(input);
        let known = [Slot::Primary, Slot::Secondary]
            .into_iter()
            .filter_map(|s| self.state.dataset(s))
            .any(|d| d.table().contains(&raw));
        if known {
            Ok(raw)
        } else {
            Err(CoordinatorError::UnknownEntity(input.to_string()))
        }
    }

    /// Bucket legend; only in threshold mode.
    pub fn legend(&self) -> Option<Legend> {
        if self.state.scale_mode() != Some(ScaleKind::Threshold) {
            return None;
        }
        self.state.primary_mapper()?.legend()
    }

    /// Pairs the correlation axes at a year both datasets share.
    pub fn select_correlation_year(&mut self, year: Year) -> Result<(), CoordinatorError> {
        let (Some(a), Some(b)) = (&self.state.primary, &self.state.secondary) else {
            return Err(CoordinatorError::NotReady);
        };
        let pairing = TemporalAnalysis::pair_at(a.years(), b.years(), year)
            .ok_or(CoordinatorError::UnknownYear(year))?;
        self.state.correlation_year = Some(pairing);
        self.commit(
            "correlation_year_selected",
            None,
            year.to_string(),
            &[ViewKind::Correlation],
        );
        Ok(())
    }

    /// Replaces the primary threshold scale with hand-edited breakpoints.
    pub fn edit_thresholds(&mut self, legend: &Legend) -> Result<(), CoordinatorError> {
        let current = self.legend().ok_or_else(|| {
            CoordinatorError::InvalidThresholds("not in threshold mode".to_string())
        })?;
        if legend.entries.len() != current.entries.len() {
            return Err(CoordinatorError::InvalidThresholds(format!(
                "expected {} buckets, got {}",
                current.entries.len(),
                legend.entries.len()
            )));
        }
        let mapper = ScaleResolver::resolve_with_legend(legend)?;
        self.state.threshold_override = Some(mapper);
        self.commit(
            "thresholds_edited",
            Some(Slot::Primary),
            format!("{:?}", legend.breakpoints()),
            &[ViewKind::Map, ViewKind::Ranking],
        );
        Ok(())
    }

    pub fn reset_thresholds(&mut self) -> Result<(), CoordinatorError> {
        if self.state.primary.is_none() {
            return Err(CoordinatorError::NotReady);
        }
        self.state.threshold_override = None;
        self.commit(
            "thresholds_reset",
            Some(Slot::Primary),
            "",
            &[ViewKind::Map, ViewKind::Ranking],
        );
        Ok(())
    }

    pub fn set_dot_size(&mut self, size: u8) -> Result<(), CoordinatorError> {
        if !DOT_SIZE_RANGE.contains(&size) {
            return Err(CoordinatorError::InvalidDotSize(size));
        }
        self.state.style.dot_size = size;
        self.commit("dot_size_changed", None, size.to_string(), &[ViewKind::Correlation]);
        Ok(())
    }

    pub fn set_region_colouring(&mut self, enabled: bool) {
        self.state.style.colour_by_region = enabled;
        self.commit("region_colouring", None, enabled.to_string(), &[ViewKind::Correlation]);
    }

    pub fn set_region_color(&mut self, region: &str, color: Rgb) -> Result<(), CoordinatorError> {
        let style = self
            .state
            .style
            .regions
            .get_mut(region)
            .ok_or_else(|| CoordinatorError::UnknownRegion(region.to_string()))?;
        style.color = color;
        self.commit(
            "region_color",
            None,
            format!("{region} {color}"),
            &[ViewKind::Correlation],
        );
        Ok(())
    }

    pub fn set_region_active(&mut self, region: &str, active: bool) -> Result<(), CoordinatorError> {
        let style = self
            .state
            .style
            .regions
            .get_mut(region)
            .ok_or_else(|| CoordinatorError::UnknownRegion(region.to_string()))?;
        style.active = active;
        self.commit(
            "region_active",
            None,
            format!("{region} {active}"),
            &[ViewKind::Correlation],
        );
        Ok(())
    }

    /// Restores the configured region colors; visibility is kept.
    pub fn reset_region_colors(&mut self) {
        for configured in &self.config.correlation.regions.0 {
            if let Some(style) = self.state.style.regions.get_mut(&configured.name) {
                style.color = configured.color;
            }
        }
        self.commit("region_colors_reset", None, "", &[ViewKind::Correlation]);
    }

    /// New map surface size. Works with or without loaded data.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.state.viewport = Viewport { width, height };
        self.commit("resize", None, format!("{width}x{height}"), &[ViewKind::Map]);
    }

    fn realign_years(&mut self) {
        self.state.correlation_year = match (&self.state.primary, &self.state.secondary) {
            (Some(a), Some(b)) => TemporalAnalysis::align(a.years(), b.years()),
            _ => None,
        };
    }

    /// Renders every affected view, then presents them in one go.
    fn commit(
        &mut self,
        kind: &'static str,
        slot: Option<Slot>,
        message: impl Into<String>,
        views: &[ViewKind],
    ) -> Vec<ViewKind> {
        self.revision = self.revision.next();
        let frames = Frames {
            map: views.contains(&ViewKind::Map).then(|| self.render_map()),
            ranking: views
                .contains(&ViewKind::Ranking)
                .then(|| self.render_ranking())
                .flatten(),
            correlation: views
                .contains(&ViewKind::Correlation)
                .then(|| self.render_correlation())
                .flatten(),
        };
        let presented = frames.present(&mut self.presenter);
        let mut event = Event::new(self.revision, kind, message).refreshing(&presented);
        if let Some(slot) = slot {
            event = event.for_slot(slot);
        }
        self.events.emit(event);
        presented
    }

    pub fn render_map(&self) -> MapFrame {
        let data = self.state.primary.as_ref().and_then(|d| {
            Some(MapData {
                name: d.name(),
                unit: d.unit(),
                table: d.table(),
                year: d.year_current()?,
                mapper: self.state.primary_mapper()?,
            })
        });
        MapView::render(&MapInput {
            directory: &self.directory,
            data,
            highlighted: self.state.highlighted.as_ref(),
            viewport: self.state.viewport,
        })
    }

    pub fn render_ranking(&self) -> Option<RankingFrame> {
        let d = self.state.primary.as_ref()?;
        Some(RankingView::render(&RankingInput {
            directory: &self.directory,
            name: d.name(),
            unit: d.unit(),
            table: d.table(),
            year: d.year_current()?,
            mode: d.scaling_type_current(),
            mapper: self.state.primary_mapper()?,
            limit: self.state.ranking_limit,
            highlighted: self.state.highlighted.as_ref(),
        }))
    }

    pub fn render_correlation(&self) -> Option<CorrelationFrame> {
        let a = self.state.primary.as_ref()?;
        let b = self.state.secondary.as_ref()?;
        Some(CorrelationView::render(&CorrelationInput {
            directory: &self.directory,
            x: series(a),
            y: series(b),
            pairing: self.state.correlation_year?,
            highlighted: self.state.highlighted.as_ref(),
            style: &self.state.style,
        }))
    }
}

fn series(d: &Dataset) -> Series<'_> {
    Series {
        name: d.name(),
        unit: d.unit(),
        table: d.table(),
        mode: d.scaling_type_current(),
    }
}
