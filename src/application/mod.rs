pub mod analysis;
pub mod bootstrap;
pub mod commands;
pub mod history;
pub mod migration;
pub mod navigation;
pub mod period_calculus;
