mod pattern;
mod pattern_store;

pub use pattern::Pattern;
pub(crate) use pattern::clamp_probability;
pub use pattern_store::PatternStore;
