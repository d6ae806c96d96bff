//! # Feedback Dispatch
//!
//! Decouples feedback arrival from observer execution. The transport side
//! enqueues decoded feedback; a single dispatch thread drains the queue in
//! arrival order and invokes at most one observer per item.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use radiora_core::dispatch::{FeedbackQueue, ObserverKey};
//! use radiora_core::feedback::{decode_lossy, FeedbackTag};
//!
//! let queue = FeedbackQueue::start()?;
//! queue.set_observer(FeedbackTag::LocalZoneChange, |feedback| {
//!     println!("zone changed: {}", feedback);
//! })?;
//! queue.set_observer(ObserverKey::Any, |feedback| {
//!     println!("other feedback: {}", feedback);
//! })?;
//!
//! queue.enqueue(decode_lossy("LZC,7,ON,S2"))?;
//! queue.stop()?;
//! ```

mod queue;

pub use queue::*;
