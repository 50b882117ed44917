pub mod display;
pub mod video_url;
