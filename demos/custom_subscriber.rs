//! # Example: custom_subscriber
//!
//! Demonstrates how to build and attach a custom event subscriber.
//!
//! Shows how to:
//! - Implement the [`Subscribe`] trait.
//! - Inspect [`Event`] / [`EventKind`] for agent lifecycle reporting.
//! - Wire the subscriber into [`AgentGroup::new`].
//!
//! ## Run
//! ```bash
//! cargo run --example custom_subscriber
//! ```

use std::{sync::Arc, time::Duration};

use agentvisor::{
    AgentError, AgentGroup, BehaviorFn, CancellationToken, Config, Event, EventKind, Subscribe,
};

/// A console subscriber that prints selected events.
struct ConsoleSubscriber;

#[async_trait::async_trait]
impl Subscribe for ConsoleSubscriber {
    async fn on_event(&self, ev: &Event) {
        let agent = ev.agent.as_deref().unwrap_or("<group>");
        match ev.kind {
            EventKind::AgentStarted => println!("[sub] started:   agent={agent}"),
            EventKind::StopRequested => println!("[sub] stopping:  agent={agent}"),
            EventKind::AgentFailed | EventKind::AgentPanicked => println!(
                "[sub] failed:    agent={agent} reason={}",
                ev.reason.as_deref().unwrap_or("<none>")
            ),
            EventKind::AgentCompleted => println!("[sub] completed: agent={agent}"),
            EventKind::GraceExceeded => println!(
                "[sub] grace exceeded after {}ms: stuck={}",
                ev.timeout_ms.unwrap_or(0),
                ev.reason.as_deref().unwrap_or("")
            ),
            other => println!("[sub] {other:?}"),
        }
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(ConsoleSubscriber)];
    let group = AgentGroup::new(Config::default(), subs);

    group.spawn(BehaviorFn::arc("ticker", |token: CancellationToken| async move {
        while !token
            .wait_for_cancellation(Some(Duration::from_millis(200)))
            .await
        {
            println!("tick");
        }
        Ok::<(), AgentError>(())
    }))?;

    group.spawn(BehaviorFn::arc("flaky", |_token: CancellationToken| async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        Err::<(), _>(AgentError::Failed {
            error: "lost connection".into(),
        })
    }))?;

    tokio::time::sleep(Duration::from_secs(1)).await;
    group.shutdown().await?;

    // Let the subscriber worker print the last events.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
