pub mod card;
pub mod strategy;
pub mod thread;

pub use card::{AttachedCard, Card};
pub use strategy::{Attachment, Strategy};
pub use thread::Thread;
