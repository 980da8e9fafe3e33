use std::{
    sync::{
        Arc,
        mpsc::{self, Receiver, TryRecvError},
    },
    thread,
};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use crate::{
    domain::{EventCard, PageResponse},
    feed::{EventSource, FetchError, FetchOutcome},
};

pub const EMPTY_PAGE_MESSAGE: &str = "No activity detected on this page.";
pub const FETCH_FAILED_MESSAGE: &str = "Failed to connect to the server.";

const FIRST_PAGE: u32 = 1;
const DISABLED_OPACITY: f32 = 0.4;

/// Owns the page cursor and the single in-flight request.
pub struct FeedController {
    source: Arc<dyn EventSource>,
    page: u32,
    pending: Option<PendingPage>,
    view: FeedView,
    scroll_to_top: bool,
}

impl FeedController {
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self {
            source,
            page: FIRST_PAGE,
            pending: None,
            view: FeedView::default(),
            scroll_to_top: false,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn is_fetching(&self) -> bool {
        self.pending.is_some()
    }

    pub fn view(&self) -> &FeedView {
        &self.view
    }

    /// Requests `page` unless another request is still outstanding.
    pub fn load(&mut self, page: u32) {
        if self.pending.is_some() {
            debug!(page, "fetch already in flight; dropping request");
            return;
        }
        info!(page, "requesting activity page");
        self.pending = Some(PendingPage::spawn(Arc::clone(&self.source), page));
    }

    pub fn advance(&mut self) {
        self.page = self.page.saturating_add(1);
        self.load(self.page);
        self.scroll_to_top = true;
    }

    pub fn retreat(&mut self) {
        if self.page > FIRST_PAGE {
            self.page -= 1;
            self.load(self.page);
            self.scroll_to_top = true;
        }
    }

    /// Picks up a finished request, if any. Called once per frame.
    pub fn poll(&mut self) {
        let Some(job) = &self.pending else {
            return;
        };
        let Some(outcome) = job.try_take() else {
            return;
        };
        let page = job.page;
        self.pending = None;
        self.apply_outcome(page, outcome);
    }

    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_to_top)
    }

    fn apply_outcome(&mut self, page: u32, outcome: FetchOutcome) {
        match outcome {
            Ok(response) => {
                if let Some(reported) = response.current_page.filter(|&reported| reported != page) {
                    debug!(page, reported, "server reported a different page number");
                }
                self.view.apply_page(page, response)
            }
            Err(err) => {
                error!(page, error = %err, "Could not sync with activity stream");
                self.view.body = FeedBody::Error(FETCH_FAILED_MESSAGE.to_owned());
            }
        }
    }

    #[cfg(test)]
    fn settle(&mut self) {
        if let Some(job) = self.pending.take() {
            let page = job.page;
            let outcome = job.wait();
            self.apply_outcome(page, outcome);
        }
    }
}

// -----------------------------------------------------------------------------
// View model
// -----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub enum FeedBody {
    Loading,
    Empty(String),
    Cards(Vec<EventCard>),
    Error(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavButton {
    pub enabled: bool,
}

impl NavButton {
    pub fn opacity(&self) -> f32 {
        if self.enabled { 1.0 } else { DISABLED_OPACITY }
    }
}

#[derive(Clone, Debug)]
pub struct FeedView {
    pub page_label: String,
    pub previous: NavButton,
    pub next: NavButton,
    pub body: FeedBody,
    pub total_count: Option<u64>,
    pub synced_at: Option<DateTime<Utc>>,
}

impl Default for FeedView {
    fn default() -> Self {
        Self {
            page_label: page_label(FIRST_PAGE),
            previous: NavButton { enabled: false },
            next: NavButton { enabled: false },
            body: FeedBody::Loading,
            total_count: None,
            synced_at: None,
        }
    }
}

impl FeedView {
    fn apply_page(&mut self, page: u32, response: PageResponse) {
        self.page_label = page_label(page);
        self.previous.enabled = page != FIRST_PAGE;
        self.next.enabled = response.has_next;
        self.total_count = response.total_count;
        self.synced_at = Some(Utc::now());

        let events = response.events.unwrap_or_default();
        self.body = if events.is_empty() {
            FeedBody::Empty(EMPTY_PAGE_MESSAGE.to_owned())
        } else {
            FeedBody::Cards(events.iter().map(EventCard::from_record).collect())
        };
    }
}

pub fn page_label(page: u32) -> String {
    format!("Page {page:02}")
}

// -----------------------------------------------------------------------------
// Background job
// -----------------------------------------------------------------------------

struct PendingPage {
    page: u32,
    receiver: Receiver<FetchOutcome>,
}

impl PendingPage {
    fn spawn(source: Arc<dyn EventSource>, page: u32) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(source.fetch_page(page));
        });
        Self { page, receiver: rx }
    }

    fn try_take(&self) -> Option<FetchOutcome> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(FetchError::BackgroundWorkerGone)),
        }
    }

    #[cfg(test)]
    fn wait(self) -> FetchOutcome {
        self.receiver
            .recv()
            .unwrap_or(Err(FetchError::BackgroundWorkerGone))
    }
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::{BadgeStyle, EventAction, EventRecord};

    type Responder = Box<dyn Fn(u32) -> FetchOutcome + Send + Sync>;

    struct FakeSource {
        calls: Mutex<Vec<u32>>,
        respond: Responder,
        gate: Option<Mutex<Receiver<()>>>,
    }

    impl FakeSource {
        fn new(respond: impl Fn(u32) -> FetchOutcome + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                respond: Box::new(respond),
                gate: None,
            })
        }

        /// Holds every request until the returned sender fires.
        fn gated(
            respond: impl Fn(u32) -> FetchOutcome + Send + Sync + 'static,
        ) -> (Arc<Self>, mpsc::Sender<()>) {
            let (tx, rx) = mpsc::channel();
            let source = Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                respond: Box::new(respond),
                gate: Some(Mutex::new(rx)),
            });
            (source, tx)
        }

        fn calls(&self) -> Vec<u32> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl EventSource for FakeSource {
        fn fetch_page(&self, page: u32) -> FetchOutcome {
            self.calls.lock().unwrap().push(page);
            if let Some(gate) = &self.gate {
                let _ = gate.lock().unwrap().recv();
            }
            (self.respond)(page)
        }
    }

    fn event(author: &str, action: &str, from_branch: Option<&str>) -> EventRecord {
        EventRecord {
            author: Some(author.into()),
            action: EventAction::from(action.to_owned()),
            from_branch: from_branch.map(str::to_owned),
            to_branch: Some("main".into()),
            timestamp: "22 Feb 2026 • 12:45 AM".into(),
        }
    }

    fn page_of(events: Vec<EventRecord>, has_next: bool) -> FetchOutcome {
        Ok(PageResponse {
            events: Some(events),
            has_next,
            total_count: None,
            current_page: None,
        })
    }

    fn server_down(_page: u32) -> FetchOutcome {
        Err(FetchError::Server {
            status: 500,
            message: "boom".into(),
        })
    }

    fn controller_with(source: &Arc<FakeSource>) -> FeedController {
        FeedController::new(Arc::clone(source) as Arc<dyn EventSource>)
    }

    #[test]
    fn load_while_in_flight_is_a_no_op() {
        let (source, release) = FakeSource::gated(|_| page_of(vec![], true));
        let mut controller = controller_with(&source);

        controller.load(1);
        assert!(controller.is_fetching());
        controller.load(2);
        controller.load(3);

        release.send(()).unwrap();
        controller.settle();

        assert_eq!(source.calls(), vec![1]);
        assert_eq!(controller.view().page_label, "Page 01");
        assert!(!controller.is_fetching());
    }

    #[test]
    fn guard_clears_after_success_and_failure() {
        let ok = FakeSource::new(|_| page_of(vec![], false));
        let mut controller = controller_with(&ok);
        controller.load(1);
        controller.settle();
        assert!(!controller.is_fetching());

        let failing = FakeSource::new(server_down);
        let mut controller = controller_with(&failing);
        controller.load(1);
        controller.settle();
        assert!(!controller.is_fetching());
    }

    #[test]
    fn poll_eventually_releases_the_guard() {
        let source = FakeSource::new(|_| page_of(vec![event("a", "PUSH", None)], false));
        let mut controller = controller_with(&source);
        controller.load(1);

        for _ in 0..200 {
            controller.poll();
            if !controller.is_fetching() {
                break;
            }
            thread::sleep(std::time::Duration::from_millis(10));
        }
        assert!(!controller.is_fetching());
        assert!(matches!(controller.view().body, FeedBody::Cards(_)));
    }

    #[test]
    fn next_button_follows_has_next() {
        let source = FakeSource::new(|page| page_of(vec![], page < 2));
        let mut controller = controller_with(&source);

        controller.load(1);
        controller.settle();
        assert!(controller.view().next.enabled);
        assert_eq!(controller.view().next.opacity(), 1.0);

        controller.load(2);
        controller.settle();
        assert!(!controller.view().next.enabled);
        assert_eq!(controller.view().next.opacity(), 0.4);
    }

    #[test]
    fn previous_button_disabled_only_on_first_page() {
        let source = FakeSource::new(|_| page_of(vec![event("a", "PUSH", None)], true));
        let mut controller = controller_with(&source);

        controller.load(1);
        controller.settle();
        assert!(!controller.view().previous.enabled);

        controller.load(2);
        controller.settle();
        assert!(controller.view().previous.enabled);

        controller.load(7);
        controller.settle();
        assert!(controller.view().previous.enabled);
        assert_eq!(controller.view().page_label, "Page 07");
    }

    #[test]
    fn empty_or_missing_events_render_one_placeholder() {
        let empty = FakeSource::new(|_| page_of(vec![], false));
        let mut controller = controller_with(&empty);
        controller.load(1);
        controller.settle();
        assert_eq!(
            controller.view().body,
            FeedBody::Empty(EMPTY_PAGE_MESSAGE.to_owned())
        );

        let missing = FakeSource::new(|_| Ok(PageResponse::default()));
        let mut controller = controller_with(&missing);
        controller.load(1);
        controller.settle();
        assert_eq!(
            controller.view().body,
            FeedBody::Empty(EMPTY_PAGE_MESSAGE.to_owned())
        );
    }

    #[test]
    fn cards_keep_server_order_and_derived_styles() {
        let source = FakeSource::new(|_| {
            page_of(
                vec![
                    event("alice", "PULL_REQUEST", None),
                    event("bob", "MERGE", Some("feature/x")),
                ],
                false,
            )
        });
        let mut controller = controller_with(&source);
        controller.load(1);
        controller.settle();

        let FeedBody::Cards(cards) = &controller.view().body else {
            panic!("expected cards, got {:?}", controller.view().body);
        };
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].author, "alice");
        assert_eq!(cards[0].badge, BadgeStyle::Outline);
        assert_eq!(cards[0].style_category, "pullrequest");
        assert_eq!(cards[0].from_branch, "main");
        assert_eq!(cards[1].author, "bob");
        assert_eq!(cards[1].badge, BadgeStyle::Primary);
        assert_eq!(cards[1].from_branch, "feature/x");
    }

    #[test]
    fn advance_moves_cursor_and_loads_next_page() {
        let source = FakeSource::new(|_| page_of(vec![], true));
        let mut controller = controller_with(&source);
        controller.page = 3;

        controller.advance();
        assert_eq!(controller.page(), 4);
        assert!(controller.take_scroll_request());
        assert!(!controller.take_scroll_request());
        controller.settle();

        assert_eq!(source.calls(), vec![4]);
        assert_eq!(controller.view().page_label, "Page 04");
    }

    #[test]
    fn retreat_on_first_page_does_nothing() {
        let source = FakeSource::new(|_| page_of(vec![], true));
        let mut controller = controller_with(&source);

        controller.retreat();
        assert_eq!(controller.page(), 1);
        assert!(!controller.is_fetching());
        assert!(!controller.take_scroll_request());
        assert!(source.calls().is_empty());
    }

    #[test]
    fn retreat_loads_previous_page() {
        let source = FakeSource::new(|_| page_of(vec![], true));
        let mut controller = controller_with(&source);
        controller.page = 2;

        controller.retreat();
        controller.settle();
        assert_eq!(controller.page(), 1);
        assert_eq!(source.calls(), vec![1]);
        assert!(!controller.view().previous.enabled);
    }

    #[test]
    fn advance_during_flight_still_moves_cursor() {
        let (source, release) = FakeSource::gated(|_| page_of(vec![], true));
        let mut controller = controller_with(&source);

        controller.advance();
        controller.advance();
        assert_eq!(controller.page(), 3);

        release.send(()).unwrap();
        controller.settle();
        assert_eq!(source.calls(), vec![2]);
    }

    #[test]
    fn failure_shows_single_error_and_keeps_pagination() {
        let source = FakeSource::new(|page| {
            if page == 1 {
                page_of(vec![event("a", "PUSH", None)], true)
            } else {
                server_down(page)
            }
        });
        let mut controller = controller_with(&source);
        controller.load(1);
        controller.settle();
        let before = controller.view().clone();

        controller.advance();
        controller.settle();

        assert!(!controller.is_fetching());
        assert_eq!(controller.page(), 2);
        assert_eq!(
            controller.view().body,
            FeedBody::Error(FETCH_FAILED_MESSAGE.to_owned())
        );
        assert_eq!(controller.view().page_label, before.page_label);
        assert_eq!(controller.view().previous, before.previous);
        assert_eq!(controller.view().next, before.next);
    }

    #[test]
    fn vanished_worker_counts_as_failure() {
        let source = FakeSource::new(|_| page_of(vec![], false));
        let mut controller = controller_with(&source);
        let (tx, rx) = mpsc::channel();
        drop(tx);
        controller.pending = Some(PendingPage {
            page: 1,
            receiver: rx,
        });

        controller.poll();
        assert!(!controller.is_fetching());
        assert_eq!(
            controller.view().body,
            FeedBody::Error(FETCH_FAILED_MESSAGE.to_owned())
        );
    }
}
