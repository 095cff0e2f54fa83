//! Single-flight and cancellation behaviour.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;

use path_router::{Context, HookOptions, Hooks, Outcome, RawRoute, Router, RouterError};

/// Holds an action or hook in flight until released.
#[derive(Default)]
struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[derive(Default)]
struct Probe {
    cancels: AtomicUsize,
    hold_match: Gate,
}

#[async_trait]
impl Hooks for Probe {
    async fn on_match(&self, options: &HookOptions) -> Result<(), RouterError> {
        if options.ctx.contains("hold") {
            self.hold_match.pass().await;
        }
        Ok(())
    }

    fn on_cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

struct Fixture {
    router: Router,
    probe: Arc<Probe>,
    slow: Arc<Gate>,
    slower: Arc<Gate>,
    calls: Arc<AtomicUsize>,
}

fn gated(path: &str, gate: &Arc<Gate>, result: &'static str) -> RawRoute {
    let gate = gate.clone();
    RawRoute::new(path).action(move |_| {
        let gate = gate.clone();
        async move {
            gate.pass().await;
            Outcome::done(result)
        }
    })
}

fn fixture() -> Fixture {
    let probe = Arc::new(Probe::default());
    let slow = Arc::new(Gate::default());
    let slower = Arc::new(Gate::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let routes = vec![
        RawRoute::new("/home").action(move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Outcome::done("Home sweet home!")
            }
        }),
        gated("/slow", &slow, "slow"),
        gated("/slower", &slower, "slower"),
    ];
    let hooks: Vec<Arc<dyn Hooks>> = vec![probe.clone()];
    let router = Router::new(routes, hooks).unwrap();

    Fixture {
        router,
        probe,
        slow,
        slower,
        calls,
    }
}

#[tokio::test]
async fn test_completes_after_release() {
    let f = fixture();
    let router = f.router.clone();
    let pending = tokio::spawn(async move { router.run("/slow").await });

    f.slow.entered.notified().await;
    assert!(f.router.is_running());
    assert_eq!(f.router.current_transition().map(|t| t.path().to_string()), Some("/slow".into()));

    f.slow.release.notify_one();
    let result = pending.await.unwrap();
    assert_eq!(result.result, Some(json!("slow")));
    assert!(!f.router.is_running());
}

#[tokio::test]
async fn test_already_running() {
    let f = fixture();
    let router = f.router.clone();
    let pending = tokio::spawn(async move { router.run("/slow").await });
    f.slow.entered.notified().await;

    let rejected = f.router.run("/home").await;
    assert_eq!(rejected.error, Some(RouterError::new("Already running", 500)));
    assert_eq!(rejected.status, 500);
    assert!(rejected.result.is_none());

    let rejected = f.router.resolve("/home").await;
    assert_eq!(rejected.error, Some(RouterError::already_running()));
    assert_eq!(f.calls.load(Ordering::SeqCst), 0);

    f.slow.release.notify_one();
    assert!(pending.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_cancel_settles_caller_and_runs_cancel_hooks() {
    let f = fixture();
    let router = f.router.clone();
    let pending = tokio::spawn(async move { router.run("/slow").await });
    f.slow.entered.notified().await;

    assert!(f.router.cancel(true));
    let result = pending.await.unwrap();
    assert_eq!(result.error, Some(RouterError::new("Cancelled", 500)));
    assert_eq!(result.path, "/slow");
    assert_eq!(f.probe.cancels.load(Ordering::SeqCst), 1);

    // Free immediately, even though the cancelled action is still parked.
    assert!(!f.router.is_running());
    assert!(f.router.run("/home").await.is_ok());

    f.slow.release.notify_one();
}

#[tokio::test]
async fn test_cancel_without_hooks() {
    let f = fixture();
    let router = f.router.clone();
    let pending = tokio::spawn(async move { router.resolve("/slow").await });
    f.slow.entered.notified().await;

    assert!(f.router.cancel(false));
    assert_eq!(pending.await.unwrap().error, Some(RouterError::cancelled()));
    assert_eq!(f.probe.cancels.load(Ordering::SeqCst), 0);
    assert!(!f.router.cancel(true));

    f.slow.release.notify_one();
}

#[tokio::test]
async fn test_orphaned_transition_keeps_newer_slot() {
    let f = fixture();

    let router = f.router.clone();
    let orphan = tokio::spawn(async move { router.resolve("/slow").await });
    f.slow.entered.notified().await;
    assert!(f.router.cancel(false));
    assert_eq!(orphan.await.unwrap().error, Some(RouterError::cancelled()));

    let router = f.router.clone();
    let current = tokio::spawn(async move { router.resolve("/slower").await });
    f.slower.entered.notified().await;

    // Let the orphan finish while the newer transition is still in flight.
    f.slow.release.notify_one();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(f.router.is_running());
    assert_eq!(f.router.resolve("/home").await.error, Some(RouterError::already_running()));

    f.slower.release.notify_one();
    let result = current.await.unwrap();
    assert_eq!(result.result, Some(json!("slower")));
    assert!(!f.router.is_running());
}

#[tokio::test]
async fn test_cancel_before_action_skips_it() {
    let f = fixture();
    let ctx = Context::new();
    ctx.set("hold", true);

    let router = f.router.clone();
    let transition_ctx = ctx.clone();
    let pending = tokio::spawn(async move { router.run_with_context("/home", transition_ctx).await });
    f.probe.hold_match.entered.notified().await;

    let transition = f.router.current_transition().unwrap();
    assert!(f.router.cancel(true));
    assert!(transition.is_cancelled());
    assert_eq!(pending.await.unwrap().error, Some(RouterError::cancelled()));

    f.probe.hold_match.release.notify_one();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(f.calls.load(Ordering::SeqCst), 0);
    assert!(!f.router.is_running());
}
