//! Retry demo
//!
//! Walks through the common ways of driving a `RetryExecutor`: failing
//! actions, boolean checks, exponential backoff, tight budgets, the extension
//! trait and the async runner.
//!
//! Run with: RUST_LOG=turtle_retry=debug cargo run --example retry_demo

use std::time::Duration;
use tracing_subscriber::EnvFilter;
use turtle_retry::{
    AbortAfter, CancellationToken, ConstantDelay, ExponentialBackoff, Retryable, retry,
    retry_check,
};

#[derive(Debug)]
enum ApiError {
    Timeout,
}

fn flaky_call(label: &str) -> Result<(), ApiError> {
    println!("   {label}");
    Err(ApiError::Timeout)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== turtle-retry demo ===\n");

    println!("1. Failing action, blocking run:");
    let result = retry(|| flaky_call("Hello"))
        .with_max_tries(5)
        .with_strategy(ConstantDelay::new().delay_ms(20))
        .run();
    println!("   Result: {result:?}\n");

    println!("2. Failing action, async run:");
    let result = retry(|| flaky_call("Hello2"))
        .with_max_tries(5)
        .with_strategy(ConstantDelay::new().delay_ms(20))
        .run_async()
        .await;
    println!("   Result: {result:?}\n");

    println!("3. Boolean check that never succeeds:");
    let result = retry_check(|| {
        println!("   Hello3");
        Ok::<_, ApiError>(false)
    })
    .with_max_tries(5)
    .with_strategy(ConstantDelay::new().delay_ms(20))
    .run();
    println!("   Result: {result:?}\n");

    println!("4. Exponential backoff:");
    let result = retry_check(|| {
        println!("   Hello4");
        Ok::<_, ApiError>(false)
    })
    .with_strategy(ExponentialBackoff::new().base_delay_ms(10).max_delay_ms(100))
    .with_max_tries(5)
    .run();
    println!("   Result: {result:?}\n");

    println!("5. Just twice, aborting on the second error:");
    let result = retry(|| flaky_call("just twice"))
        .with_max_tries(2)
        .with_exception_behavior(AbortAfter::new(2))
        .run();
    println!("   Result: {result:?}\n");

    println!("6. Extension trait:");
    let action = || flaky_call("extension");
    let result = action
        .retry()
        .with_max_tries(10)
        .with_strategy(ConstantDelay::new().delay_ms(5))
        .run();
    println!("   Result: {result:?}\n");

    println!("7. Cancelled while waiting:");
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });
    let result = retry(|| flaky_call("cancel me"))
        .with_strategy(ConstantDelay::new().delay_ms(10_000))
        .run_async_with_cancel(&token)
        .await;
    println!("   Result: {result:?}");

    println!("\n=== All scenarios completed ===");
}
