//! Decoding of streamed responses into semantic events.

pub mod assembler;
pub mod classifier;
pub mod event;

pub use assembler::{AssembledTurn, TurnAssembler};
pub use classifier::{
    BraceDepth, IncompleteToolCall, StreamClassifier, THINK_CLOSE_TAG, THINK_OPEN_TAG,
    ToolCallAccumulator, ToolCallBoundary,
};
pub use event::{EventKind, REASONING_CLOSE_MARKER, StreamEvent};
