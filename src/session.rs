//! Dashboard session: selection state, fetch orchestration, and the
//! pagination window over the derived alert list.
//!
//! The session is the single owner of everything the dashboard displays.
//! Selection setters mutate the filter/sort choices; [`DashboardSession::begin_fetches`]
//! and the `apply_*` methods move keyed fetch results through the query
//! caches; the derived list is recomputed (never refetched) whenever any of
//! its inputs change; and [`DashboardSession::page_view`] slices the result
//! for display.

use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{FetchTicket, QueryCache, QueryKey, QueryKind};
use crate::data_sources::AlertFeed;
use crate::derive::{SortDirection, derive};
use crate::model::{Alert, Zone};

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Default sort field at session start.
const DEFAULT_SORT_BY: &str = "sent";

/// The user's current filter and sort choices.
///
/// Empty strings mean "no filter" for area, zone, severity, and urgency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// Administrative area code; empty = use the global active-alerts feed.
    pub area: String,
    /// Zone id; empty = no zone scoping.
    pub zone: String,
    /// Exact-match severity filter; empty = no filter.
    pub severity: String,
    /// Exact-match urgency filter; empty = no filter.
    pub urgency: String,
    /// Sort field; any property name is accepted.
    pub sort_by: String,
    /// Sort direction.
    pub sort_direction: SortDirection,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            area: String::new(),
            zone: String::new(),
            severity: String::new(),
            urgency: String::new(),
            sort_by: DEFAULT_SORT_BY.to_string(),
            sort_direction: SortDirection::Desc,
        }
    }
}

/// Zero-based pagination window over the derived list.
#[derive(Debug, Clone)]
pub struct PageWindow {
    page: usize,
    page_size: usize,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageWindow {
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Jump to a page. Out-of-range pages are tolerated; they slice to
    /// an empty window.
    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    /// Change the page size and reset to the first page.
    ///
    /// # Panics
    ///
    /// Panics when `size` is zero; a zero page size is a programming error.
    pub fn set_page_size(&mut self, size: usize) {
        assert!(size > 0, "page size must be a positive integer");
        self.page_size = size;
        self.page = 0;
    }

    fn reset(&mut self) {
        self.page = 0;
    }

    /// The visible slice of `items`, clamped at both ends.
    pub fn slice<'a>(&self, items: &'a [Alert]) -> &'a [Alert] {
        let start = self.page.saturating_mul(self.page_size).min(items.len());
        let end = start.saturating_add(self.page_size).min(items.len());
        &items[start..end]
    }
}

/// One row of the displayed table: the alert plus its extracted
/// description sections.
#[derive(Debug, Clone, Serialize)]
pub struct AlertRow {
    pub id: String,
    pub event: String,
    pub area_desc: String,
    pub headline: String,
    pub status: String,
    pub severity: String,
    pub urgency: String,
    pub certainty: String,
    pub sent: String,
    pub effective: String,
    pub expires: String,
    pub ends: Option<String>,
    pub sender_name: String,
    /// The `WHAT...` section of the description, empty when absent.
    pub what: String,
    /// The `IMPACTS...` section of the description, empty when absent.
    pub impacts: String,
    pub instruction: String,
}

impl AlertRow {
    fn from_alert(alert: &Alert) -> Self {
        let props = &alert.properties;
        Self {
            id: props.id.clone(),
            event: props.event.clone(),
            area_desc: props.area_desc.clone(),
            headline: props.headline.clone(),
            status: props.status.clone(),
            severity: props.severity.clone(),
            urgency: props.urgency.clone(),
            certainty: props.certainty.clone(),
            sent: props.sent.clone(),
            effective: props.effective.clone(),
            expires: props.expires.clone(),
            ends: props.ends.clone(),
            sender_name: props.sender_name.clone(),
            what: props.what_section(),
            impacts: props.impacts_section(),
            instruction: props.instruction.clone(),
        }
    }
}

/// Everything the presentation layer consumes for the alerts table.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    /// The visible page of the ordered alert list.
    pub alerts: Vec<AlertRow>,
    /// Length of the full derived list.
    pub total: usize,
    /// Length of the visible slice.
    pub visible: usize,
    pub page: usize,
    pub page_size: usize,
    /// Loading state of whichever alert source is active.
    pub loading: bool,
    pub error: bool,
    pub error_message: Option<String>,
    pub selection: Selection,
}

/// Zone list for the selected area, gated on area selection.
#[derive(Debug, Clone, Serialize)]
pub struct ZonesView {
    pub zones: Vec<Zone>,
    pub loading: bool,
}

/// The dashboard session. See the module docs.
#[derive(Debug, Default)]
pub struct DashboardSession {
    selection: Selection,
    alerts: QueryCache<Vec<Alert>>,
    zones: QueryCache<Vec<Zone>>,
    derived: Vec<Alert>,
    window: PageWindow,
}

impl DashboardSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Key of whichever alert source the current selection makes active:
    /// the zone feed when a zone is selected, otherwise the area feed,
    /// otherwise the global active feed.
    pub fn active_key(&self) -> QueryKey {
        if !self.selection.zone.is_empty() {
            QueryKey::zone(&self.selection.zone)
        } else if !self.selection.area.is_empty() {
            QueryKey::area(&self.selection.area)
        } else {
            QueryKey::active()
        }
    }

    /// Key of the zone-list query; `None` (skip entirely) when no area is
    /// selected.
    pub fn zones_key(&self) -> Option<QueryKey> {
        if self.selection.area.is_empty() {
            None
        } else {
            Some(QueryKey::zones(&self.selection.area))
        }
    }

    /// Select an administrative area. Selecting a new area empties the zone
    /// selection, since a zone belongs to exactly one area's zone list.
    pub fn set_area(&mut self, area: &str) {
        if self.selection.area == area {
            return;
        }
        info!(area, "area selection changed");
        self.selection.area = area.to_string();
        self.selection.zone.clear();
        self.window.reset();
        self.rederive();
    }

    /// Select a zone within the current area.
    pub fn set_zone(&mut self, zone: &str) {
        if self.selection.zone == zone {
            return;
        }
        info!(zone, "zone selection changed");
        self.selection.zone = zone.to_string();
        self.window.reset();
        self.rederive();
    }

    pub fn set_severity(&mut self, severity: &str) {
        if self.selection.severity == severity {
            return;
        }
        self.selection.severity = severity.to_string();
        self.window.reset();
        self.rederive();
    }

    pub fn set_urgency(&mut self, urgency: &str) {
        if self.selection.urgency == urgency {
            return;
        }
        self.selection.urgency = urgency.to_string();
        self.window.reset();
        self.rederive();
    }

    /// Any property name is accepted; unknown names fall back to the
    /// lowercase-text comparator.
    pub fn set_sort_by(&mut self, field: &str) {
        if self.selection.sort_by == field {
            return;
        }
        self.selection.sort_by = field.to_string();
        self.window.reset();
        self.rederive();
    }

    pub fn set_sort_direction(&mut self, direction: SortDirection) {
        if self.selection.sort_direction == direction {
            return;
        }
        self.selection.sort_direction = direction;
        self.window.reset();
        self.rederive();
    }

    /// Reset area, zone, severity, and urgency in one step. Sort settings
    /// are left alone.
    pub fn clear_filters(&mut self) {
        info!("filters cleared");
        self.selection.area.clear();
        self.selection.zone.clear();
        self.selection.severity.clear();
        self.selection.urgency.clear();
        self.window.reset();
        self.rederive();
    }

    pub fn set_page(&mut self, page: usize) {
        self.window.set_page(page);
    }

    pub fn set_page_size(&mut self, size: usize) {
        self.window.set_page_size(size);
    }

    /// Begin every fetch the current selection wants but does not have:
    /// the active alert source, plus the zone list when an area is
    /// selected. Keys that are already loading or cached yield no ticket.
    ///
    /// Every returned ticket must be driven to completion with
    /// [`Self::apply_alerts`] or [`Self::apply_zones`].
    pub fn begin_fetches(&mut self) -> Vec<FetchTicket> {
        let mut tickets = Vec::new();
        if let Some(ticket) = self.alerts.begin(&self.active_key()) {
            debug!(key = ?ticket.key, "alert fetch begun");
            tickets.push(ticket);
        }
        if let Some(key) = self.zones_key() {
            if let Some(ticket) = self.zones.begin(&key) {
                debug!(key = ?ticket.key, "zone list fetch begun");
                tickets.push(ticket);
            }
        }
        tickets
    }

    /// Apply a keyed alert fetch outcome. Results for superseded requests
    /// are discarded; results for keys other than the active one are cached
    /// without affecting the displayed list.
    pub fn apply_alerts(&mut self, ticket: &FetchTicket, result: Result<Vec<Alert>, String>) {
        if self.alerts.apply(ticket, result) {
            self.rederive();
        } else {
            debug!(key = ?ticket.key, "stale alert result discarded");
        }
    }

    /// Apply a keyed zone-list fetch outcome.
    pub fn apply_zones(&mut self, ticket: &FetchTicket, result: Result<Vec<Zone>, String>) {
        if !self.zones.apply(ticket, result) {
            debug!(key = ?ticket.key, "stale zone list discarded");
        }
    }

    /// Convenience driver: begin and run every wanted fetch against `feed`,
    /// applying each outcome as it completes.
    pub async fn refresh<F: AlertFeed + ?Sized>(&mut self, feed: &F) {
        for ticket in self.begin_fetches() {
            match ticket.key.kind {
                QueryKind::ActiveAlerts => {
                    let result = feed.active_alerts().await.map_err(|e| e.to_string());
                    self.apply_alerts(&ticket, result);
                }
                QueryKind::AreaAlerts => {
                    let result = feed
                        .area_alerts(&ticket.key.scope)
                        .await
                        .map_err(|e| e.to_string());
                    self.apply_alerts(&ticket, result);
                }
                QueryKind::ZoneAlerts => {
                    let result = feed
                        .zone_alerts(&ticket.key.scope)
                        .await
                        .map_err(|e| e.to_string());
                    self.apply_alerts(&ticket, result);
                }
                QueryKind::Zones => {
                    let result = feed
                        .zones(&ticket.key.scope)
                        .await
                        .map_err(|e| e.to_string());
                    self.apply_zones(&ticket, result);
                }
            }
        }
    }

    /// Recompute the derived list from the active raw collection and the
    /// current filters. Local projection only; never refetches.
    fn rederive(&mut self) {
        self.derived = match self.alerts.value(&self.active_key()) {
            Some(raw) => derive(
                raw,
                &self.selection.severity,
                &self.selection.urgency,
                &self.selection.sort_by,
                self.selection.sort_direction,
            ),
            None => Vec::new(),
        };
    }

    /// The full derived (filtered, ordered) list.
    pub fn derived(&self) -> &[Alert] {
        &self.derived
    }

    /// Loading state of the active alert source only; the inactive source
    /// never contributes.
    pub fn alerts_loading(&self) -> bool {
        self.alerts.is_loading(&self.active_key())
    }

    /// Surfaced error of the active alert source, if any.
    pub fn alerts_error(&self) -> Option<&str> {
        self.alerts.error(&self.active_key())
    }

    /// The current page of the dashboard.
    pub fn page_view(&self) -> DashboardView {
        let visible = self.window.slice(&self.derived);
        let error_message = self.alerts_error().map(str::to_string);
        DashboardView {
            alerts: visible.iter().map(AlertRow::from_alert).collect(),
            total: self.derived.len(),
            visible: visible.len(),
            page: self.window.page(),
            page_size: self.window.page_size(),
            loading: self.alerts_loading(),
            error: error_message.is_some(),
            error_message,
            selection: self.selection.clone(),
        }
    }

    /// The zone list for the selected area; empty with no loading flag when
    /// no area is selected.
    pub fn zones_view(&self) -> ZonesView {
        match self.zones_key() {
            Some(key) => ZonesView {
                zones: self.zones.value(&key).cloned().unwrap_or_default(),
                loading: self.zones.is_loading(&key),
            },
            None => ZonesView {
                zones: Vec::new(),
                loading: false,
            },
        }
    }
}
