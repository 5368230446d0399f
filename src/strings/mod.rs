pub mod logs;
pub mod messages;
