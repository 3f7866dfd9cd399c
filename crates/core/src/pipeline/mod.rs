pub mod crop_sink;
pub mod infrastructure;
pub mod pipeline_logger;
pub mod train_recognizer_use_case;
