pub mod aggregator;
pub mod formatter;
pub mod notifier;
pub mod observer;
pub mod snapshot;
pub mod watch_observer;
