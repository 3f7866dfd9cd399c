/// Accepted training video containers (matched case-insensitively).
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "webm"];

pub const DETECTOR_MODEL_NAME: &str = "face_detection_short_range.onnx";
pub const DETECTOR_MODEL_URL: &str =
    "https://huggingface.co/ykk648/face_lib/resolve/main/face_detect/blazeface/face_detection_short_range.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://huggingface.co/maze/faceX/resolve/e010b5098c3685fd00b22dd2aec6f37320e3d850/w600k_r50.onnx";

pub const DEFAULT_DATA_DIR: &str = "faces";
pub const DEFAULT_MODEL_PATH: &str = "face_recognizer.json";
pub const DEFAULT_LABELS_PATH: &str = "labels.json";
