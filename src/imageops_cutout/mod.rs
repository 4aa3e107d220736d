pub mod alpha_compositor;
pub mod alpha_mask;
pub mod color_clusterer;
pub mod color_metrics;
pub mod confidence_mask;
pub mod config;
pub mod context;
pub mod edge_texture;
pub mod flood_fill;
pub mod image_source;
pub mod mask_fusion;
pub mod pipeline;
pub mod region_sampler;
pub mod strategy;
pub mod subject_detector;
