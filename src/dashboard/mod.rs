//! Dashboard module - topics and their chart view models

mod topics;
mod views;

pub use topics::Topic;
pub use views::{
    build_topic, preload, AgeBand, BubbleChart, GrowthChart, LaterBuyersView, RaceChart, TopicView,
};
