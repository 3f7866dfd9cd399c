pub mod model_resolver;
pub mod onnx_pyramid_detector;
