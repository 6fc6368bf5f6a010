//! # Example: shared_ticker
//!
//! One timer shared by several consumers through hubs.
//!
//! Shows how to:
//! - Connect a cold [`Stream`] to a [`ReplayHub`] so late consumers catch up.
//! - Keep a [`CurrentHub`] as the "latest reading" for synchronous queries.
//! - Collect a final summary with a [`FinalHub`].
//! - Cancel a single consumer without affecting the others.
//!
//! ## Flow
//! ```text
//! ticker (LocalSet task) ──► ReplayHub(2) ──┬──► early consumer
//!                                           ├──► late consumer (replays last 2)
//!                                           ├──► CurrentHub (latest tick)
//!                                           └──► FinalHub (last tick, at completion)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example shared_ticker
//! ```

use std::time::Duration;

use pushflow::{CurrentHub, FinalHub, Multicast, ReplayHub, Sink, Stream, UsageError};
use tokio::task::LocalSet;

fn ticker(count: u32, every: Duration) -> Stream<u32> {
    Stream::new(move |sink: &Sink<u32>| {
        let sink = sink.clone();
        tokio::task::spawn_local(async move {
            for n in 0..count {
                tokio::time::sleep(every).await;
                if sink.is_cancelled() {
                    return;
                }
                sink.value(n);
            }
            sink.complete();
        });
        Ok(())
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), UsageError> {
    LocalSet::new()
        .run_until(async {
            let ticks = ReplayHub::new(2)?;
            let latest = CurrentHub::new(0_u32);
            let summary = FinalHub::new();

            ticks.stream().activate(latest.sink());
            ticks.stream().activate(summary.sink());
            summary
                .stream()
                .subscribe(|last: u32| println!("[summary] last tick was {last}"));

            let early = ticks
                .stream()
                .subscribe(|n| println!("[early] tick {n}"));

            ticker(6, Duration::from_millis(25)).activate(ticks.sink());

            tokio::time::sleep(Duration::from_millis(90)).await;
            println!("[main] latest reading: {:?}", latest.current());

            early.cancel();
            println!("[main] early consumer left, members={}", ticks.member_count());

            ticks.stream().subscribe(|n| println!("[late] tick {n}"));

            tokio::time::sleep(Duration::from_millis(120)).await;
            println!("[main] hub state: {}", ticks.state().as_label());
            Ok::<(), UsageError>(())
        })
        .await
}
