/// Coordinator loop: query switching, load-more gating and outcome application.
pub mod coordinator;
/// Page fetch tasks with panic capture.
pub mod fetch;
