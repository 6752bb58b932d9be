pub mod confidence_filter;
pub mod coordinate_unmapper;
pub mod non_maximum_suppression;
pub mod object_detection_model;
pub mod object_detection_utils;
pub mod ort_inference_session;
pub mod pipeline;
pub mod tensor_decoder;
