pub mod crowd_classifier;
pub mod density_map;
pub mod distribution;
pub mod filters;
pub mod flow;
pub mod hotspot;
pub mod hotspot_detector;
pub mod risk;
