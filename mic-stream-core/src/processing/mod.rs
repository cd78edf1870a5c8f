pub mod pcm;
pub mod ring_buffer;
pub mod volume_estimator;
