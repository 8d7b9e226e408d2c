//! The Paygate HTTP gateway: request classification, challenge responses,
//! payment webhook handling, and pass-through proxying to the origin.

pub mod challenge;
pub mod classify;
pub mod explain;
pub mod proxy;
pub mod routes;
pub mod server;
pub mod stripe;

pub use classify::{Classifier, RequestSignals, Verdict};
pub use server::{GatewayServer, GatewayState};
