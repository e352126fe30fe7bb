//! # Example: pipeline
//!
//! A producer agent feeds a bounded buffer read by a draining consumer. The consumer
//! rejects one value, which relinks its input to a discard sink so the producer never
//! blocks on it.
//!
//! ## Flow
//! ```text
//! producer ──send──► Buffer::bounded(4) ──select_receive──► DrainingConsumer("printer")
//!                                                              ├─ consume(v)
//!                                                              └─ rejects 13 ─► relink ─► OverwriteBuffer
//! AgentGroup::shutdown() ──► cancel all ──► wait (grace 5s)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example pipeline
//! ```

use std::time::Duration;

use agentvisor::{
    AgentError, AgentGroup, BehaviorFn, Buffer, CancellationToken, Config, ConsumeError,
    ConsumerFn,
};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let cfg = Config {
        grace: Duration::from_secs(5),
        ..Config::default()
    };
    let group = AgentGroup::new(cfg, Vec::new());
    let numbers = Buffer::bounded(4);

    let printer = group.spawn_consumer(
        "printer",
        numbers.clone(),
        ConsumerFn::new(|n: u64| async move {
            if n == 13 {
                return Err(ConsumeError::rejected("unlucky number"));
            }
            println!("printer: {n}");
            Ok(())
        }),
    )?;

    let producer = numbers.clone();
    group.spawn(BehaviorFn::arc(
        "producer",
        move |token: CancellationToken| {
            let producer = producer.clone();
            async move {
                let mut n = 0u64;
                while !token.is_cancellation_requested() {
                    producer.send(n).await;
                    n += 1;
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                println!("producer: sent {n} values");
                Ok::<(), AgentError>(())
            }
        },
    ))?;

    tokio::time::sleep(Duration::from_secs(1)).await;
    println!("printer status: {:?}", printer.status());

    match group.shutdown().await {
        Ok(()) => println!("group stopped gracefully"),
        Err(e) => println!("group stopped with error: {e}"),
    }
    for (name, status) in group.statuses() {
        println!("{name}: {status:?}");
    }
    Ok(())
}
