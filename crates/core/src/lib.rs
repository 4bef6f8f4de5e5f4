pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod region;
    pub mod timestamp;
}

pub mod device {
    pub mod domain {
        pub mod camera_device;
        pub mod capture_session;
        pub mod device_enumerator;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod face_detector;
    }
    pub mod infrastructure;
}

pub mod rendering {
    pub mod domain {
        pub mod fps_meter;
        pub mod render_state;
    }
    pub mod infrastructure;
}

pub mod video {
    pub mod domain {
        pub mod image_writer;
        pub mod video_writer;
    }
    pub mod infrastructure;
}

pub mod recording {
    pub mod domain {
        pub mod recording_controller;
    }
}

pub mod stats {
    pub mod domain {
        pub mod stats_record;
        pub mod stats_store;
    }
    pub mod infrastructure;
}

pub mod location {
    pub mod domain {
        pub mod geolocator;
    }
    pub mod infrastructure;
}

pub mod pipeline;

#[cfg(test)]
pub(crate) mod testing;
