//! Chatbot creation: mapping stream objects to stages and tracking progress.

pub mod classifier;
pub mod progress;

pub use classifier::classify;
pub use progress::CreationProgress;
