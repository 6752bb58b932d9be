pub mod feature_heatmap;
pub mod text_probability_overlay;
