//! Routing orchestration for saferoute
//!
//! One `RouteOrchestrator` owns the route variants for a single
//! origin/destination pair. On construction it fires the baseline route fetch
//! and the risk-annotation fetch concurrently; once the avoidance data
//! arrives it spawns the two constrained variants. Every variant that
//! resolves is registered as one overlay and announced through the event
//! channel, in whatever order the network completes.
//!
//! All state mutation funnels through one mutex-guarded critical section that
//! registers the overlay and emits its notification as a unit, so no two
//! resolutions can interleave their bookkeeping.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::debug;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::core::avoidance::fetch_avoidance;
use crate::core::config::RoutingConfig;
use crate::core::geo::Coordinate;
use crate::core::route::{Color, Route, RouteKind};

/// Process-wide overlay handle counter
///
/// Handles are unique across orchestrations, so a stale handle from a
/// superseded orchestrator can never alias a newer one's.
static NEXT_OVERLAY_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque handle identifying one registered overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(u64);

/// Notification that new overlays exist and are ready to render
#[derive(Debug, Clone)]
pub struct OverlayEvent {
    pub overlays: Vec<OverlayId>,
}

struct OrchestratorState {
    /// Append-only: grows from 1 (plain) to 3 once avoidance data arrives
    variants: Vec<Route>,

    /// Overlay handle to the index of the variant that produced it
    overlay_for: HashMap<OverlayId, usize>,

    /// Registration order, monotonically growing
    overlay_order: Vec<OverlayId>,
}

impl OrchestratorState {
    /// Store a resolution and register its overlay; called with the state
    /// lock held so registration and notification cannot interleave
    fn register(&mut self, index: usize, route: Route) -> OverlayId {
        self.variants[index] = route;
        let id = OverlayId(NEXT_OVERLAY_ID.fetch_add(1, Ordering::Relaxed));
        self.overlay_for.insert(id, index);
        self.overlay_order.push(id);
        id
    }
}

/// Orchestrates the three route fetches for one origin/destination pair
///
/// Failures are best-effort and independent: a variant (or the avoidance
/// fetch) that fails simply never produces its overlay, and the others are
/// unaffected. The only caller-visible sign of failure is the absence of a
/// notification. There is no explicit completion signal; the event channel
/// closes once no further resolution can arrive.
pub struct RouteOrchestrator {
    from: Coordinate,
    to: Coordinate,
    state: Arc<Mutex<OrchestratorState>>,
}

impl RouteOrchestrator {
    /// Start an orchestration and immediately issue its fetches
    ///
    /// Returns the orchestrator plus the receiver for overlay notifications.
    /// Dropping the receiver detaches the observer; late resolutions still
    /// register their overlays but their notifications go nowhere.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        config: RoutingConfig,
        from: Coordinate,
        to: Coordinate,
    ) -> (Self, UnboundedReceiver<OverlayEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = Arc::new(config);
        let state = Arc::new(Mutex::new(OrchestratorState {
            variants: vec![Route::new(RouteKind::Plain, from, to)],
            overlay_for: HashMap::new(),
            overlay_order: Vec::new(),
        }));

        spawn_resolution(Arc::clone(&state), Arc::clone(&config), 0, tx.clone());
        spawn_avoidance_stage(Arc::clone(&state), config, from, to, tx);

        (Self { from, to, state }, rx)
    }

    pub fn origin(&self) -> Coordinate {
        self.from
    }

    pub fn destination(&self) -> Coordinate {
        self.to
    }

    /// All overlay handles registered so far, in registration order
    pub fn overlays(&self) -> Vec<OverlayId> {
        self.lock().overlay_order.clone()
    }

    /// Stroke color of the variant that produced an overlay
    pub fn color_for(&self, overlay: OverlayId) -> Option<Color> {
        let state = self.lock();
        let index = *state.overlay_for.get(&overlay)?;
        Some(state.variants[index].color())
    }

    /// Resolved geometry behind an overlay handle
    pub fn shape_for(&self, overlay: OverlayId) -> Option<Vec<Coordinate>> {
        let state = self.lock();
        let index = *state.overlay_for.get(&overlay)?;
        Some(state.variants[index].shape().to_vec())
    }

    /// Snapshot of the route that produced an overlay
    pub fn route_for(&self, overlay: OverlayId) -> Option<Route> {
        let state = self.lock();
        let index = *state.overlay_for.get(&overlay)?;
        Some(state.variants[index].clone())
    }

    /// Number of variants spawned so far (1 until avoidance data arrives)
    pub fn variant_count(&self) -> usize {
        self.lock().variants.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, OrchestratorState> {
        self.state.lock().expect("orchestrator state lock poisoned")
    }
}

/// Fetch the avoidance set, then spawn the two constrained variants
fn spawn_avoidance_stage(
    state: Arc<Mutex<OrchestratorState>>,
    config: Arc<RoutingConfig>,
    from: Coordinate,
    to: Coordinate,
    tx: UnboundedSender<OverlayEvent>,
) {
    tokio::spawn(async move {
        let avoidance = match fetch_avoidance(&config, from, to).await {
            Ok(avoidance) => Arc::new(avoidance),
            Err(e) => {
                debug!("avoid-link fetch dropped: {e}");
                return;
            }
        };

        let (partial_index, full_index) = {
            let mut state = state.lock().expect("orchestrator state lock poisoned");
            state.variants.push(Route::new(
                RouteKind::PartialAvoidance(Arc::clone(&avoidance)),
                from,
                to,
            ));
            state
                .variants
                .push(Route::new(RouteKind::FullAvoidance(avoidance), from, to));
            (state.variants.len() - 2, state.variants.len() - 1)
        };

        spawn_resolution(
            Arc::clone(&state),
            Arc::clone(&config),
            partial_index,
            tx.clone(),
        );
        spawn_resolution(state, config, full_index, tx);
    });
}

/// Resolve the variant at `index` and, on success, register-and-notify
fn spawn_resolution(
    state: Arc<Mutex<OrchestratorState>>,
    config: Arc<RoutingConfig>,
    index: usize,
    tx: UnboundedSender<OverlayEvent>,
) {
    tokio::spawn(async move {
        let mut route = {
            let state = state.lock().expect("orchestrator state lock poisoned");
            state.variants[index].clone()
        };

        match route.resolve(&config).await {
            Ok(resolution) => {
                route.apply_resolution(resolution);
                let mut state = state.lock().expect("orchestrator state lock poisoned");
                let id = state.register(index, route);
                // A detached observer makes this a no-op
                let _ = tx.send(OverlayEvent { overlays: vec![id] });
            }
            Err(e) => {
                debug!("{} route dropped: {e}", route.kind().label());
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

    /// Matches requests whose query string lacks the given parameter
    struct LacksParam(&'static str);

    impl Match for LacksParam {
        fn matches(&self, request: &Request) -> bool {
            request.url.query_pairs().all(|(key, _)| key != self.0)
        }
    }

    fn server_config(server: &MockServer) -> RoutingConfig {
        RoutingConfig {
            api_key: "test-key".to_string(),
            directions_base_url: server.uri(),
            risk_base_url: server.uri(),
        }
    }

    fn origin() -> Coordinate {
        Coordinate::new(39.3299, -76.6205)
    }

    fn destination() -> Coordinate {
        Coordinate::new(39.28, -76.59)
    }

    async fn mount_avoidance(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/v1/avoidLinkIds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn mount_shape(server: &MockServer, session_id: &str, points: Vec<f64>) {
        Mock::given(method("GET"))
            .and(path("/directions/v2/routeshape"))
            .and(query_param("sessionId", session_id))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "route": { "shape": { "shapePoints": points } }
            })))
            .mount(server)
            .await;
    }

    fn directions_body(session_id: &str) -> serde_json::Value {
        serde_json::json!({ "route": { "sessionId": session_id, "distance": 1.0 } })
    }

    /// Mounts the full happy-path scenario: avoidance `{red: [10], yellow:
    /// [30]}` and per-variant directions/shape responses, with optional
    /// latency on the partial and full directions calls
    async fn mount_three_variant_scenario(
        server: &MockServer,
        partial_delay: Duration,
        full_delay: Duration,
    ) {
        mount_avoidance(server, serde_json::json!({"red": [10], "yellow": [30]})).await;

        Mock::given(method("GET"))
            .and(path("/directions/v2/route"))
            .and(LacksParam("tryAvoidLinkIds"))
            .and(LacksParam("mustAvoidLinkIds"))
            .respond_with(ResponseTemplate::new(200).set_body_json(directions_body("s-plain")))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/directions/v2/route"))
            .and(query_param("tryAvoidLinkIds", "10"))
            .and(LacksParam("mustAvoidLinkIds"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(directions_body("s-partial"))
                    .set_delay(partial_delay),
            )
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/directions/v2/route"))
            .and(query_param("mustAvoidLinkIds", "10"))
            .and(query_param("tryAvoidLinkIds", "30"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(directions_body("s-full"))
                    .set_delay(full_delay),
            )
            .mount(server)
            .await;

        mount_shape(server, "s-plain", vec![1.0, 2.0, 3.0, 4.0]).await;
        mount_shape(server, "s-partial", vec![5.0, 6.0, 7.0, 8.0]).await;
        mount_shape(server, "s-full", vec![9.0, 10.0, 11.0, 12.0]).await;
    }

    async fn next_event(rx: &mut UnboundedReceiver<OverlayEvent>) -> Option<OverlayEvent> {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for overlay event")
    }

    /// Drains the channel to closure and returns every announced overlay
    async fn drain_events(mut rx: UnboundedReceiver<OverlayEvent>) -> Vec<OverlayId> {
        let mut announced = Vec::new();
        while let Some(event) = next_event(&mut rx).await {
            assert_eq!(
                event.overlays.len(),
                1,
                "each notification carries exactly one new overlay"
            );
            announced.extend(event.overlays);
        }
        announced
    }

    fn color_set(orchestrator: &RouteOrchestrator) -> HashSet<String> {
        orchestrator
            .overlays()
            .into_iter()
            .map(|id| orchestrator.color_for(id).unwrap().hex())
            .collect()
    }

    #[tokio::test]
    async fn test_three_variants_resolve_and_notify() {
        let server = MockServer::start().await;
        mount_three_variant_scenario(&server, Duration::ZERO, Duration::ZERO).await;

        let (orchestrator, rx) =
            RouteOrchestrator::start(server_config(&server), origin(), destination());
        let announced = drain_events(rx).await;

        assert_eq!(announced.len(), 3);
        assert_eq!(orchestrator.variant_count(), 3);
        assert_eq!(orchestrator.overlays(), announced);
        assert_eq!(
            color_set(&orchestrator),
            HashSet::from(["#ff2600".to_string(), "#fffb00".to_string(), "#00f900".to_string()])
        );
    }

    #[tokio::test]
    async fn test_each_overlay_registered_exactly_once() {
        let server = MockServer::start().await;
        mount_three_variant_scenario(&server, Duration::ZERO, Duration::ZERO).await;

        let (orchestrator, rx) =
            RouteOrchestrator::start(server_config(&server), origin(), destination());
        let announced = drain_events(rx).await;

        let distinct: HashSet<_> = announced.iter().copied().collect();
        assert_eq!(distinct.len(), announced.len(), "no overlay announced twice");

        let registered: HashSet<_> = orchestrator.overlays().into_iter().collect();
        assert_eq!(registered, distinct, "announced and registered sets agree");
    }

    #[tokio::test]
    async fn test_plain_route_survives_risk_service_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/avoidLinkIds"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/directions/v2/route"))
            .respond_with(ResponseTemplate::new(200).set_body_json(directions_body("s-plain")))
            .mount(&server)
            .await;
        mount_shape(&server, "s-plain", vec![1.0, 2.0, 3.0, 4.0]).await;

        let (orchestrator, rx) =
            RouteOrchestrator::start(server_config(&server), origin(), destination());
        let announced = drain_events(rx).await;

        assert_eq!(announced.len(), 1, "exactly one notification, for plain only");
        assert_eq!(orchestrator.variant_count(), 1);
        assert_eq!(
            orchestrator.color_for(announced[0]),
            Some(RouteKind::Plain.color())
        );
    }

    #[tokio::test]
    async fn test_malformed_avoidance_spawns_no_constrained_variants() {
        let server = MockServer::start().await;

        // Missing the "yellow" tier: no AvoidanceSet may be delivered
        mount_avoidance(&server, serde_json::json!({"red": [1, 2]})).await;
        Mock::given(method("GET"))
            .and(path("/directions/v2/route"))
            .respond_with(ResponseTemplate::new(200).set_body_json(directions_body("s-plain")))
            .mount(&server)
            .await;
        mount_shape(&server, "s-plain", vec![1.0, 2.0]).await;

        let (orchestrator, rx) =
            RouteOrchestrator::start(server_config(&server), origin(), destination());
        let announced = drain_events(rx).await;

        assert_eq!(announced.len(), 1);
        assert_eq!(orchestrator.variant_count(), 1);
    }

    #[tokio::test]
    async fn test_resolution_order_does_not_affect_final_state() {
        let slow = Duration::from_millis(250);

        let server_a = MockServer::start().await;
        mount_three_variant_scenario(&server_a, slow, Duration::ZERO).await;
        let (orchestrator_a, rx_a) =
            RouteOrchestrator::start(server_config(&server_a), origin(), destination());
        let announced_a = drain_events(rx_a).await;

        let server_b = MockServer::start().await;
        mount_three_variant_scenario(&server_b, Duration::ZERO, slow).await;
        let (orchestrator_b, rx_b) =
            RouteOrchestrator::start(server_config(&server_b), origin(), destination());
        let announced_b = drain_events(rx_b).await;

        assert_eq!(announced_a.len(), 3);
        assert_eq!(announced_b.len(), 3);
        assert_eq!(color_set(&orchestrator_a), color_set(&orchestrator_b));

        // Shapes end up attached to the same variants regardless of timing
        for orchestrator in [&orchestrator_a, &orchestrator_b] {
            for id in orchestrator.overlays() {
                let route = orchestrator.route_for(id).unwrap();
                assert!(route.is_resolved());
                if route.color() == RouteKind::Plain.color() {
                    assert_eq!(route.shape()[0], Coordinate::new(1.0, 2.0));
                }
            }
        }
    }

    #[tokio::test]
    async fn test_detached_observer_is_a_noop() {
        let server = MockServer::start().await;
        mount_three_variant_scenario(&server, Duration::ZERO, Duration::ZERO).await;

        let (orchestrator, rx) =
            RouteOrchestrator::start(server_config(&server), origin(), destination());
        drop(rx);

        // Overlays still register; the lost notifications are not faults
        for _ in 0..50 {
            if orchestrator.overlays().len() == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(orchestrator.overlays().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_overlay_handle() {
        let server = MockServer::start().await;
        mount_three_variant_scenario(&server, Duration::ZERO, Duration::ZERO).await;

        let (orchestrator_a, rx_a) =
            RouteOrchestrator::start(server_config(&server), origin(), destination());
        let announced = drain_events(rx_a).await;

        let (orchestrator_b, _rx_b) =
            RouteOrchestrator::start(server_config(&server), origin(), destination());

        // A handle from a different orchestration is unknown here
        assert_eq!(orchestrator_b.color_for(announced[0]), None);
        assert_eq!(orchestrator_b.shape_for(announced[0]), None);
    }
}
