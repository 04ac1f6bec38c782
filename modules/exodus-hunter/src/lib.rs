pub mod app;
pub mod ledger;
pub mod liveness;
pub mod notify;
pub mod qualify;
pub mod scheduler;
pub mod sources;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod worker;
