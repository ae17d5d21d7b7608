mod jpeg;

pub use jpeg::JpegImageCodec;
