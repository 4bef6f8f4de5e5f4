pub const FACE_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const FACE_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// Device indices `0..MAX_PROBED_DEVICES` are probed at startup.
pub const MAX_PROBED_DEVICES: u32 = 10;

/// Tick rate used when a device does not report a usable frame rate.
pub const FALLBACK_FPS: f64 = 30.0;

/// Recordings are always encoded at this rate, regardless of the tick rate.
pub const RECORDING_FPS: f64 = 30.0;

/// Poll rate of the secondary (thumbnail) feeds.
pub const SECONDARY_POLL_FPS: f64 = 5.0;

pub const RECORDING_EXTENSION: &str = "mp4";
pub const SNAPSHOT_EXTENSION: &str = "png";

pub const DEFAULT_STATS_FILE: &str = "stats.json";

pub const UNKNOWN_LOCATION: &str = "Unknown location";

pub const THUMBNAIL_SIZE: (u32, u32) = (160, 120);
