pub mod accounts;
pub mod betting;
pub mod catalog;
pub mod notifier;
pub mod settlement;
