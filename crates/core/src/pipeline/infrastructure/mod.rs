pub mod image_crop_sink;
