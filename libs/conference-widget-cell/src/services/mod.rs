// libs/conference-widget-cell/src/services/mod.rs

pub mod adapter;
pub mod normalize;
pub mod script;

pub use adapter::{WidgetAdapter, WidgetHandle};
pub use normalize::EventNormalizer;
pub use script::ScriptLoader;
