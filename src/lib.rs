pub mod chart;
pub mod coin;
pub mod compare;
pub mod favorites;
pub mod fetch;
pub mod market;
pub mod portfolio;
pub mod search;
pub mod store;
pub mod tui;
