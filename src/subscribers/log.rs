//! # LogWriter - events rendered through `tracing`
//!
//! A minimal subscriber that turns incoming [`Event`]s into `tracing` records.
//! Install any `tracing` subscriber (e.g. `tracing-subscriber`) to see them.
//!
//! ## Example output
//! ```text
//! INFO  [started] agent="printer"
//! INFO  [stop-requested] agent="printer"
//! WARN  [consumer-failed] agent="printer" err="consumer rejected value: bad input"
//! WARN  [relinked] agent="printer" moved=2
//! INFO  [drained] agent="printer" count=3
//! INFO  [completed] agent="printer"
//! WARN  [grace-exceeded] grace_ms=5000 stuck="[\"slow\"]"
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let agent = e.agent.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::AgentStarted => info!("[started] agent={agent:?}"),
            EventKind::StopRequested => info!("[stop-requested] agent={agent:?}"),
            EventKind::AgentCompleted => info!("[completed] agent={agent:?}"),
            EventKind::AgentWaited => debug!("[waited] agent={agent:?}"),
            EventKind::AgentFailed => warn!("[failed] agent={agent:?} err={reason:?}"),
            EventKind::AgentPanicked => error!("[panicked] agent={agent:?} info={reason:?}"),
            EventKind::ConsumerFailed => {
                warn!("[consumer-failed] agent={agent:?} err={reason:?}")
            }
            EventKind::ChannelRelinked => {
                warn!("[relinked] agent={agent:?} moved={:?}", e.count)
            }
            EventKind::DrainFinished => info!("[drained] agent={agent:?} count={:?}", e.count),
            EventKind::ShutdownRequested => info!("[shutdown-requested]"),
            EventKind::AllStoppedWithin => info!("[all-stopped-within-grace]"),
            EventKind::GraceExceeded => {
                warn!("[grace-exceeded] grace_ms={:?} stuck={reason:?}", e.timeout_ms)
            }
            EventKind::SubscriberOverflow => {
                warn!("[subscriber-overflow] subscriber={agent} reason={reason}")
            }
            EventKind::SubscriberPanicked => {
                error!("[subscriber-panicked] subscriber={agent} info={reason}")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
