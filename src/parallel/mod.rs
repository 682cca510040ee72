//! Generic parallel execution framework
//!
//! This module owns thread and channel management only. It knows nothing about
//! files or tools: callers hand it work items, a processing function and a
//! fallback for items whose processing panics.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐  bounded   ┌────────────┐  bounded   ┌─────────────┐
//! │ Producer │──channel──▶│  Workers   │──channel──▶│  Collector  │
//! │ (items)  │            │ (N fixed)  │            │ (caller's   │
//! └──────────┘            └────────────┘            │  callback)  │
//!                                                   └─────────────┘
//! ```
//!
//! - Each item is received by exactly one worker
//! - Results are delivered in completion order
//! - A panic is caught per item and converted into a result
//!
//! # Example Usage
//!
//! ```rust
//! use codex::parallel::ParallelExecutor;
//!
//! let executor = ParallelExecutor::new(4);
//! let results = executor
//!     .execute(
//!         vec![1, 2, 3],
//!         |x, _worker_id| x * 2,
//!         |_x, _panic| 0,
//!         |result| println!("done: {result}"),
//!     )
//!     .unwrap();
//! assert_eq!(results.len(), 3);
//! ```

pub mod core;

// Re-export main types for easier access
pub use self::core::ParallelExecutor;
