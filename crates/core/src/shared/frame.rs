use ndarray::ArrayView3;

/// A single decoded frame or face crop: contiguous pixel bytes in row-major
/// order, either 3-channel RGB (as produced by the video reader) or
/// 1-channel grayscale (as consumed by detection and training).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Position of this frame within its source video's decode order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_grayscale(&self) -> bool {
        self.channels == 1
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Converts to a single-channel luma frame (ITU-R BT.601 weights).
    ///
    /// Already-grayscale frames are returned unchanged.
    pub fn to_grayscale(&self) -> Frame {
        if self.is_grayscale() {
            return self.clone();
        }
        let mut gray = Vec::with_capacity((self.width * self.height) as usize);
        for px in self.data.chunks_exact(3) {
            let luma =
                (299 * px[0] as u32 + 587 * px[1] as u32 + 114 * px[2] as u32) / 1000;
            gray.push(luma as u8);
        }
        Frame::new(gray, self.width, self.height, 1, self.index)
    }

    /// Extracts the exact rectangular sub-region, verbatim.
    ///
    /// The rectangle must lie fully within the frame.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Frame {
        debug_assert!(x + width <= self.width && y + height <= self.height);
        let ch = self.channels as usize;
        let row_len = self.width as usize * ch;
        let mut data = Vec::with_capacity(width as usize * height as usize * ch);
        for row in y..y + height {
            let start = row as usize * row_len + x as usize * ch;
            data.extend_from_slice(&self.data[start..start + width as usize * ch]);
        }
        Frame::new(data, width, height, self.channels, 0)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb_frame(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for i in 0..(width * height) {
            data.push(i as u8);
            data.push(i as u8);
            data.push(i as u8);
        }
        Frame::new(data, width, height, 3, 0)
    }

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
        assert!(!frame.is_grayscale());
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        let data = vec![0u8; 10]; // wrong size for 2x2x3
        Frame::new(data, 2, 2, 3, 0);
    }

    #[test]
    fn test_as_ndarray_shape() {
        let frame = rgb_frame(4, 2);
        assert_eq!(frame.as_ndarray().shape(), &[2, 4, 3]); // (height, width, channels)
    }

    #[test]
    fn test_to_grayscale_dimensions() {
        let gray = rgb_frame(4, 2).to_grayscale();
        assert_eq!(gray.width(), 4);
        assert_eq!(gray.height(), 2);
        assert_eq!(gray.channels(), 1);
        assert_eq!(gray.data().len(), 8);
    }

    #[test]
    fn test_to_grayscale_bt601_weights() {
        // Pure red, green, blue pixels
        let data = vec![255, 0, 0, 0, 255, 0, 0, 0, 255];
        let frame = Frame::new(data, 3, 1, 3, 0);
        let gray = frame.to_grayscale();
        assert_eq!(gray.data(), &[76, 149, 29]); // 0.299, 0.587, 0.114 of 255
    }

    #[test]
    fn test_to_grayscale_of_grayscale_is_identity() {
        let frame = Frame::new(vec![7, 8, 9, 10], 2, 2, 1, 3);
        let gray = frame.to_grayscale();
        assert_eq!(gray, frame);
        assert_eq!(gray.index(), 3);
    }

    #[test]
    fn test_crop_extracts_exact_region() {
        // 4x4 grayscale with values 0..16 row-major
        let frame = Frame::new((0..16).collect(), 4, 4, 1, 0);
        let crop = frame.crop(1, 1, 2, 2);
        assert_eq!(crop.width(), 2);
        assert_eq!(crop.height(), 2);
        assert_eq!(crop.data(), &[5, 6, 9, 10]);
    }

    #[test]
    fn test_crop_full_frame_is_verbatim() {
        let frame = Frame::new((0..16).collect(), 4, 4, 1, 2);
        let crop = frame.crop(0, 0, 4, 4);
        assert_eq!(crop.data(), frame.data());
        assert_eq!(crop.index(), 0); // crops restart frame indexing
    }

    #[test]
    fn test_crop_rgb_keeps_channels() {
        let frame = rgb_frame(4, 4);
        let crop = frame.crop(2, 3, 2, 1);
        assert_eq!(crop.channels(), 3);
        assert_eq!(crop.data().len(), 6);
        // pixel (2,3) of rgb_frame has all channels equal to 3*4+2 = 14
        assert_eq!(crop.data()[0], 14);
    }
}
