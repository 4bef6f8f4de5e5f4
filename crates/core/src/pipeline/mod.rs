pub mod display_sink;
pub mod frame_pipeline;
pub mod live_session;
pub mod secondary_feed_manager;
pub mod snapshot_use_case;
pub mod tick_logger;
pub mod user_command;

pub mod infrastructure;
