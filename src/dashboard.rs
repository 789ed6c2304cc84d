//! Dashboard state: report store, tab controller, and selection.
//!
//! The [`Dashboard`] owns all UI state and is only changed through its
//! methods. It never performs I/O itself: entering a tab hands back a
//! [`FetchTicket`], the caller runs the fetch, and the result comes back
//! through [`Dashboard::commit`].
//!
//! Tickets are numbered from one shared counter. Only the most recently
//! issued ticket for a kind may commit, so a slow response can never
//! overwrite the result of a request issued after it.

use tracing::debug;

use crate::client::ReportKind;
use crate::models::{EarthquakeReport, Payload};

/// Everything the views render from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardState {
    pub active_tab: ReportKind,
    pub latest_reports: Vec<EarthquakeReport>,
    pub felt_reports: Vec<EarthquakeReport>,
    pub auto_report: Option<EarthquakeReport>,
    pub selected_report: Option<EarthquakeReport>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            active_tab: ReportKind::Latest,
            latest_reports: Vec::new(),
            felt_reports: Vec::new(),
            auto_report: None,
            selected_report: None,
        }
    }
}

impl DashboardState {
    /// Reports currently stored for `kind`, in source order.
    #[must_use]
    pub fn reports(&self, kind: ReportKind) -> &[EarthquakeReport] {
        match kind {
            ReportKind::Latest => &self.latest_reports,
            ReportKind::Felt => &self.felt_reports,
            ReportKind::Auto => self.auto_report.as_slice(),
        }
    }
}

/// Permission to commit one fetch result for one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    kind: ReportKind,
    seq: u64,
}

impl FetchTicket {
    /// Kind this ticket fetches.
    #[must_use]
    pub fn kind(self) -> ReportKind {
        self.kind
    }

    /// Position in the issue order; later tickets have larger values.
    #[must_use]
    pub fn seq(self) -> u64 {
        self.seq
    }
}

/// What happened to a fetch result handed to [`Dashboard::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The slot now holds the new reports
    Committed,
    /// A newer request for the same kind was issued; result dropped
    Superseded,
    /// Payload shape does not match the ticket's kind; result dropped
    Rejected,
}

/// Why a card click could not be turned into a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectError {
    /// No card at that position
    OutOfRange { index: usize, len: usize },
    /// The list was replaced after the card was rendered
    Stale { expected: u64, current: u64 },
}

impl std::fmt::Display for SelectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { index, len } => {
                write!(f, "no report at position {index} (list has {len})")
            }
            Self::Stale { expected, current } => write!(
                f,
                "report list changed since it was shown (revision {expected}, now {current})"
            ),
        }
    }
}

impl std::error::Error for SelectError {}

/// Single owner of dashboard state.
#[derive(Debug, Default)]
pub struct Dashboard {
    state: DashboardState,
    /// Last issued ticket per kind (indexed by [`ReportKind::index`])
    issued: [u64; 3],
    /// Ticket that produced each slot's current contents
    revisions: [u64; 3],
    next_seq: u64,
}

impl Dashboard {
    /// Mount (or re-mount on page reload): reset to the Latest tab with empty
    /// slots and return the ticket for the mount-time Latest fetch.
    ///
    /// Tickets issued before the reset can no longer commit.
    pub fn mount(&mut self) -> FetchTicket {
        self.state = DashboardState::default();
        self.revisions = [0; 3];
        self.issued = [0; 3];
        self.issue(ReportKind::Latest)
    }

    #[must_use]
    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    #[must_use]
    pub fn active_tab(&self) -> ReportKind {
        self.state.active_tab
    }

    /// Ticket sequence that produced the current contents of `kind`'s slot.
    ///
    /// Zero means nothing has been committed yet.
    #[must_use]
    pub fn revision(&self, kind: ReportKind) -> u64 {
        self.revisions[kind.index()]
    }

    /// Switch to `tab`.
    ///
    /// Returns the ticket for the one fetch entering the tab requires, or
    /// `None` when `tab` is already active.
    pub fn activate(&mut self, tab: ReportKind) -> Option<FetchTicket> {
        if self.state.active_tab == tab {
            return None;
        }
        debug!(from = %self.state.active_tab, to = %tab, "tab changed");
        self.state.active_tab = tab;
        Some(self.issue(tab))
    }

    fn issue(&mut self, kind: ReportKind) -> FetchTicket {
        self.next_seq += 1;
        self.issued[kind.index()] = self.next_seq;
        FetchTicket {
            kind,
            seq: self.next_seq,
        }
    }

    /// Store a fetch result if its ticket is still the newest for its kind.
    pub fn commit(&mut self, ticket: FetchTicket, payload: Payload) -> CommitOutcome {
        let slot = ticket.kind.index();
        if ticket.seq != self.issued[slot] {
            debug!(
                kind = %ticket.kind,
                seq = ticket.seq,
                newest = self.issued[slot],
                "dropping superseded fetch result"
            );
            return CommitOutcome::Superseded;
        }

        match (ticket.kind, payload) {
            (ReportKind::Latest, Payload::List(reports)) => self.set_latest(reports),
            (ReportKind::Felt, Payload::List(reports)) => self.set_felt(reports),
            (ReportKind::Auto, Payload::Single(report)) => self.set_auto(report),
            (kind, _) => {
                debug!(%kind, "payload shape does not match kind");
                return CommitOutcome::Rejected;
            }
        }

        self.revisions[slot] = ticket.seq;
        CommitOutcome::Committed
    }

    /// Replace the Latest list.
    pub fn set_latest(&mut self, reports: Vec<EarthquakeReport>) {
        self.state.latest_reports = reports;
    }

    /// Replace the Felt list.
    pub fn set_felt(&mut self, reports: Vec<EarthquakeReport>) {
        self.state.felt_reports = reports;
    }

    /// Replace the Auto report.
    pub fn set_auto(&mut self, report: EarthquakeReport) {
        self.state.auto_report = Some(report);
    }

    /// Make `report` the current selection.
    pub fn set_selected(&mut self, report: EarthquakeReport) {
        self.state.selected_report = Some(report);
    }

    /// Select the report behind card `index` of `tab`'s list.
    ///
    /// `revision` is the slot revision the card was rendered from.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::Stale`] if the slot has been replaced since,
    /// or [`SelectError::OutOfRange`] if there is no such card.
    pub fn select(
        &mut self,
        tab: ReportKind,
        index: usize,
        revision: u64,
    ) -> Result<(), SelectError> {
        let current = self.revision(tab);
        if revision != current {
            return Err(SelectError::Stale {
                expected: revision,
                current,
            });
        }

        let reports = self.state.reports(tab);
        let report = reports.get(index).cloned().ok_or(SelectError::OutOfRange {
            index,
            len: reports.len(),
        })?;

        self.set_selected(report);
        Ok(())
    }
}

#[cfg(test)]
impl Dashboard {
    /// A freshly mounted dashboard and its mount-time ticket.
    pub(crate) fn mounted() -> (Self, FetchTicket) {
        let mut dashboard = Self::default();
        let ticket = dashboard.mount();
        (dashboard, ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::report;

    fn list(regions: &[&str]) -> Payload {
        Payload::List(regions.iter().map(|r| report(r, "-6,110")).collect())
    }

    #[test]
    fn test_mount_starts_on_latest_with_fetch() {
        let (dashboard, ticket) = Dashboard::mounted();
        assert_eq!(dashboard.active_tab(), ReportKind::Latest);
        assert_eq!(ticket.kind(), ReportKind::Latest);
        assert_eq!(dashboard.state(), &DashboardState::default());
        assert_eq!(dashboard.revision(ReportKind::Latest), 0);
    }

    #[test]
    fn test_reactivating_active_tab_is_noop() {
        let (mut dashboard, _) = Dashboard::mounted();
        assert_eq!(dashboard.activate(ReportKind::Latest), None);

        let ticket = dashboard.activate(ReportKind::Felt).expect("tab changed");
        assert_eq!(ticket.kind(), ReportKind::Felt);
        assert_eq!(dashboard.activate(ReportKind::Felt), None);
    }

    #[test]
    fn test_each_tab_change_issues_one_ticket() {
        let (mut dashboard, first) = Dashboard::mounted();
        let mut seqs = vec![first.seq()];
        for tab in [
            ReportKind::Auto,
            ReportKind::Felt,
            ReportKind::Latest,
            ReportKind::Auto,
        ] {
            let ticket = dashboard.activate(tab).expect("tab changed");
            assert_eq!(ticket.kind(), tab);
            seqs.push(ticket.seq());
        }
        assert!(seqs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_commit_replaces_slot() {
        let (mut dashboard, ticket) = Dashboard::mounted();
        assert_eq!(dashboard.commit(ticket, list(&["a", "b"])), CommitOutcome::Committed);

        dashboard.activate(ReportKind::Felt);
        let again = dashboard.activate(ReportKind::Latest).expect("tab changed");
        assert_eq!(dashboard.commit(again, list(&["c"])), CommitOutcome::Committed);

        let regions: Vec<&str> = dashboard
            .state()
            .latest_reports
            .iter()
            .map(|r| r.region.as_str())
            .collect();
        assert_eq!(regions, ["c"]);
        assert_eq!(dashboard.revision(ReportKind::Latest), again.seq());
    }

    #[test]
    fn test_superseded_result_is_dropped() {
        let (mut dashboard, old) = Dashboard::mounted();
        dashboard.activate(ReportKind::Felt);
        let new = dashboard.activate(ReportKind::Latest).expect("tab changed");

        // The newer request resolves first, the older one after it.
        assert_eq!(dashboard.commit(new, list(&["new"])), CommitOutcome::Committed);
        assert_eq!(dashboard.commit(old, list(&["old"])), CommitOutcome::Superseded);

        assert_eq!(dashboard.state().latest_reports[0].region, "new");
    }

    #[test]
    fn test_superseded_even_if_newest_never_resolves() {
        let (mut dashboard, old) = Dashboard::mounted();
        dashboard.activate(ReportKind::Auto);
        let _pending = dashboard.activate(ReportKind::Latest).expect("tab changed");

        assert_eq!(dashboard.commit(old, list(&["old"])), CommitOutcome::Superseded);
        assert!(dashboard.state().latest_reports.is_empty());
    }

    #[test]
    fn test_kinds_commit_independently() {
        let (mut dashboard, latest) = Dashboard::mounted();
        let felt = dashboard.activate(ReportKind::Felt).expect("tab changed");
        let auto = dashboard.activate(ReportKind::Auto).expect("tab changed");

        assert_eq!(
            dashboard.commit(auto, Payload::Single(report("auto", "-6,110"))),
            CommitOutcome::Committed
        );
        assert_eq!(dashboard.commit(latest, list(&["l1", "l2"])), CommitOutcome::Committed);
        assert_eq!(dashboard.commit(felt, list(&["f1"])), CommitOutcome::Committed);

        let state = dashboard.state();
        assert_eq!(state.latest_reports.len(), 2);
        assert_eq!(state.felt_reports.len(), 1);
        assert_eq!(state.auto_report.as_ref().map(|r| r.region.as_str()), Some("auto"));
    }

    #[test]
    fn test_mismatched_shape_is_rejected() {
        let (mut dashboard, _) = Dashboard::mounted();
        let auto = dashboard.activate(ReportKind::Auto).expect("tab changed");
        assert_eq!(dashboard.commit(auto, list(&["x"])), CommitOutcome::Rejected);
        assert!(dashboard.state().auto_report.is_none());
        assert_eq!(dashboard.revision(ReportKind::Auto), 0);
    }

    #[test]
    fn test_select_sets_exact_record() {
        let (mut dashboard, ticket) = Dashboard::mounted();
        dashboard.commit(ticket, list(&["a", "b", "c"]));
        let rev = dashboard.revision(ReportKind::Latest);

        dashboard.select(ReportKind::Latest, 1, rev).expect("selected");
        let state = dashboard.state();
        assert_eq!(state.selected_report.as_ref(), Some(&state.latest_reports[1]));
    }

    #[test]
    fn test_select_from_inactive_tab_list() {
        let (mut dashboard, latest) = Dashboard::mounted();
        dashboard.commit(latest, list(&["a", "b"]));
        let rev = dashboard.revision(ReportKind::Latest);
        dashboard.activate(ReportKind::Felt);

        dashboard.select(ReportKind::Latest, 0, rev).expect("selected");
        assert_eq!(
            dashboard.state().selected_report.as_ref().map(|r| r.region.as_str()),
            Some("a")
        );
    }

    #[test]
    fn test_selection_survives_tab_switches() {
        let (mut dashboard, ticket) = Dashboard::mounted();
        dashboard.commit(ticket, list(&["a", "b"]));
        let rev = dashboard.revision(ReportKind::Latest);
        dashboard.select(ReportKind::Latest, 0, rev).expect("selected");

        let felt = dashboard.activate(ReportKind::Felt).expect("tab changed");
        dashboard.commit(felt, list(&["f"]));
        dashboard.activate(ReportKind::Auto);

        assert_eq!(
            dashboard.state().selected_report.as_ref().map(|r| r.region.as_str()),
            Some("a")
        );
    }

    #[test]
    fn test_select_out_of_range() {
        let (mut dashboard, ticket) = Dashboard::mounted();
        dashboard.commit(ticket, list(&["a"]));
        let rev = dashboard.revision(ReportKind::Latest);

        assert_eq!(
            dashboard.select(ReportKind::Latest, 3, rev).unwrap_err(),
            SelectError::OutOfRange { index: 3, len: 1 }
        );
        assert!(dashboard.state().selected_report.is_none());
    }

    #[test]
    fn test_select_with_stale_revision() {
        let (mut dashboard, ticket) = Dashboard::mounted();
        dashboard.commit(ticket, list(&["a", "b"]));
        let shown = dashboard.revision(ReportKind::Latest);

        dashboard.activate(ReportKind::Felt);
        let refetch = dashboard.activate(ReportKind::Latest).expect("tab changed");
        dashboard.commit(refetch, list(&["z", "y"]));

        let err = dashboard.select(ReportKind::Latest, 0, shown).unwrap_err();
        assert!(matches!(err, SelectError::Stale { .. }));
        assert!(dashboard.state().selected_report.is_none());
    }

    #[test]
    fn test_mount_again_resets_state_and_invalidates_tickets() {
        let (mut dashboard, first) = Dashboard::mounted();
        dashboard.commit(first, list(&["a"]));
        let rev = dashboard.revision(ReportKind::Latest);
        dashboard.select(ReportKind::Latest, 0, rev).expect("selected");
        let felt = dashboard.activate(ReportKind::Felt).expect("tab changed");

        let fresh = dashboard.mount();
        assert_eq!(fresh.kind(), ReportKind::Latest);
        assert!(fresh.seq() > felt.seq());
        assert_eq!(dashboard.state(), &DashboardState::default());

        assert_eq!(dashboard.commit(felt, list(&["late"])), CommitOutcome::Superseded);
        assert_eq!(dashboard.commit(first, list(&["late"])), CommitOutcome::Superseded);
        assert_eq!(dashboard.commit(fresh, list(&["b"])), CommitOutcome::Committed);
    }

    #[test]
    fn test_auto_slot_as_list() {
        let (mut dashboard, _) = Dashboard::mounted();
        assert!(dashboard.state().reports(ReportKind::Auto).is_empty());

        let auto = dashboard.activate(ReportKind::Auto).expect("tab changed");
        dashboard.commit(auto, Payload::Single(report("auto", "-6,110")));
        let rev = dashboard.revision(ReportKind::Auto);
        assert_eq!(dashboard.state().reports(ReportKind::Auto).len(), 1);
        dashboard.select(ReportKind::Auto, 0, rev).expect("selected");
        assert_eq!(
            dashboard.state().selected_report,
            dashboard.state().auto_report
        );
    }
}
