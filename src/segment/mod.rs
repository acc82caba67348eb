//! Speech segmentation
//!
//! Turns a stream of per-speaker audio frames into discrete utterances.
//! Each source moves Idle → Accumulating → Flushed: the first frame opens a
//! session, a terminator frame or the silence deadline closes it, and the
//! accumulated PCM is handed on exactly once.

mod store;
mod worker;

pub use store::{Flush, FlushTrigger, SegmenterConfig, SessionStore};
pub use worker::{Segmenter, Utterance};
