use crate::device::domain::camera_device::{CameraBackend, CameraDevice};
use crate::shared::frame::Frame;

/// libavdevice demuxer used for local cameras on this platform.
#[cfg(target_os = "linux")]
const CAPTURE_FORMAT: &str = "v4l2";
#[cfg(target_os = "macos")]
const CAPTURE_FORMAT: &str = "avfoundation";
#[cfg(target_os = "windows")]
const CAPTURE_FORMAT: &str = "dshow";
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const CAPTURE_FORMAT: &str = "v4l2";

/// Packets read per `read_frame` call before giving up on this tick.
const MAX_PACKETS_PER_FRAME: usize = 32;

/// Opens numbered cameras through libavdevice.
#[derive(Default)]
pub struct FfmpegCameraBackend;

impl FfmpegCameraBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CameraBackend for FfmpegCameraBackend {
    fn open(&self, index: u32) -> Result<Box<dyn CameraDevice>, Box<dyn std::error::Error>> {
        Ok(Box::new(FfmpegCamera::open(index)?))
    }
}

fn capture_format() -> Result<ffmpeg_next::Format, Box<dyn std::error::Error>> {
    ffmpeg_next::device::input::video()
        .find(|f| f.name() == CAPTURE_FORMAT)
        .ok_or_else(|| format!("capture format {CAPTURE_FORMAT} is not available").into())
}

/// Input URL and demuxer options that select camera `index`.
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn device_input(
    index: u32,
) -> Result<(String, ffmpeg_next::Dictionary<'static>), Box<dyn std::error::Error>> {
    Ok((format!("/dev/video{index}"), ffmpeg_next::Dictionary::new()))
}

#[cfg(target_os = "macos")]
fn device_input(
    index: u32,
) -> Result<(String, ffmpeg_next::Dictionary<'static>), Box<dyn std::error::Error>> {
    let mut options = ffmpeg_next::Dictionary::new();
    // avfoundation refuses to open without an explicit rate.
    options.set("framerate", "30");
    // "<video>:<audio>"; no audio.
    Ok((format!("{index}:none"), options))
}

/// dshow addresses cameras by name, so the n-th video device is looked up
/// in the libavdevice source list.
#[cfg(target_os = "windows")]
fn device_input(
    index: u32,
) -> Result<(String, ffmpeg_next::Dictionary<'static>), Box<dyn std::error::Error>> {
    let names = dshow_video_devices(&capture_format()?)?;
    let (url, same_name_rank) = dshow_selection(&names, index)
        .ok_or_else(|| format!("no dshow video device at position {index}"))?;
    let mut options = ffmpeg_next::Dictionary::new();
    options.set("video_device_number", &same_name_rank.to_string());
    Ok((url, options))
}

/// `video=<name>` for the `index`-th device, plus how many earlier devices
/// share that name (dshow's `video_device_number`).
#[cfg(any(target_os = "windows", test))]
fn dshow_selection(names: &[String], index: u32) -> Option<(String, usize)> {
    let position = usize::try_from(index).ok()?;
    let name = names.get(position)?;
    let same_name_rank = names[..position].iter().filter(|n| *n == name).count();
    Some((format!("video={name}"), same_name_rank))
}

/// Names of the video-capable dshow devices, in the order dshow reports them.
#[cfg(target_os = "windows")]
fn dshow_video_devices(
    format: &ffmpeg_next::Format,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    use ffmpeg_next::ffi;
    use std::ffi::CStr;

    let ffmpeg_next::Format::Input(input) = format else {
        return Err("dshow is not an input format".into());
    };

    let mut list: *mut ffi::AVDeviceInfoList = std::ptr::null_mut();
    let ret = unsafe {
        ffi::avdevice_list_input_sources(
            input.as_ptr() as _,
            std::ptr::null(),
            std::ptr::null_mut(),
            &mut list,
        )
    };
    if ret < 0 {
        return Err(Box::new(ffmpeg_next::Error::from(ret)));
    }
    if list.is_null() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    unsafe {
        let count = usize::try_from((*list).nb_devices).unwrap_or(0);
        if count > 0 && !(*list).devices.is_null() {
            for &info in std::slice::from_raw_parts((*list).devices, count) {
                if info.is_null() || (*info).device_name.is_null() {
                    continue;
                }
                let media_count = usize::try_from((*info).nb_media_types).unwrap_or(0);
                let is_video = media_count > 0
                    && !(*info).media_types.is_null()
                    && std::slice::from_raw_parts((*info).media_types, media_count)
                        .contains(&ffi::AVMediaType::AVMEDIA_TYPE_VIDEO);
                if is_video {
                    names.push(CStr::from_ptr((*info).device_name).to_string_lossy().into_owned());
                }
            }
        }
        ffi::avdevice_free_list_devices(&mut list);
    }
    log::debug!("dshow video devices: {names:?}");
    Ok(names)
}

/// Frames per second from a stream rational, if it is a usable rate.
fn rate_to_fps(rate: ffmpeg_next::Rational) -> Option<f64> {
    if rate.denominator() == 0 || rate.numerator() <= 0 {
        return None;
    }
    Some(rate.numerator() as f64 / rate.denominator() as f64)
}

/// An open camera. Dropping it closes the device.
pub struct FfmpegCamera {
    index: u32,
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: Option<RgbScaler>,
    stream_index: usize,
    frame_rate: Option<f64>,
    frames_read: usize,
}

/// Conversion context plus the source geometry it was built for.
struct RgbScaler {
    context: ffmpeg_next::software::scaling::Context,
    format: ffmpeg_next::format::Pixel,
    width: u32,
    height: u32,
}

impl FfmpegCamera {
    pub fn open(index: u32) -> Result<Self, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let format = capture_format()?;
        let (url, options) = device_input(index)?;
        let ictx = match ffmpeg_next::format::open_with(&url, &format, options)? {
            ffmpeg_next::format::context::Context::Input(ictx) => ictx,
            ffmpeg_next::format::context::Context::Output(_) => {
                return Err(format!("{url} did not open as an input").into())
            }
        };

        let (stream_index, frame_rate, decoder) = {
            let stream = ictx
                .streams()
                .best(ffmpeg_next::media::Type::Video)
                .ok_or("camera has no video stream")?;
            let codec_ctx =
                ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
            let frame_rate = rate_to_fps(stream.avg_frame_rate()).or_else(|| rate_to_fps(stream.rate()));
            (stream.index(), frame_rate, codec_ctx.decoder().video()?)
        };

        log::debug!(
            "Camera {index} opened via {CAPTURE_FORMAT} ({}x{}, {:?} fps)",
            decoder.width(),
            decoder.height(),
            frame_rate
        );

        Ok(Self {
            index,
            ictx,
            decoder,
            scaler: None,
            stream_index,
            frame_rate,
            frames_read: 0,
        })
    }

    fn to_frame(
        &mut self,
        decoded: &ffmpeg_next::util::frame::video::Video,
    ) -> Result<Frame, Box<dyn std::error::Error>> {
        let (width, height) = (decoded.width(), decoded.height());
        let stale = self.scaler.as_ref().map_or(true, |s| {
            s.format != decoded.format() || s.width != width || s.height != height
        });
        if stale {
            self.scaler = Some(RgbScaler {
                context: ffmpeg_next::software::scaling::Context::get(
                    decoded.format(),
                    width,
                    height,
                    ffmpeg_next::format::Pixel::RGB24,
                    width,
                    height,
                    ffmpeg_next::software::scaling::Flags::BILINEAR,
                )?,
                format: decoded.format(),
                width,
                height,
            });
        }
        let scaler = self.scaler.as_mut().ok_or("scaler unavailable")?;

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.context.run(decoded, &mut rgb_frame)?;

        let pixels = extract_rgb_pixels(&rgb_frame, width, height);
        let frame = Frame::from_raw(pixels, width, height, self.frames_read)
            .ok_or("decoded frame has an unexpected size")?;
        self.frames_read += 1;
        Ok(frame)
    }
}

impl CameraDevice for FfmpegCamera {
    fn read_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_ok() {
            return self.to_frame(&decoded);
        }

        for _ in 0..MAX_PACKETS_PER_FRAME {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                return Err(format!("camera {} stopped delivering packets", self.index).into());
            };
            if stream.index() != self.stream_index {
                continue;
            }
            self.decoder.send_packet(&packet)?;
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                return self.to_frame(&decoded);
            }
        }
        Err(format!("camera {} produced no frame", self.index).into())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.decoder.width(), self.decoder.height())
    }

    fn frame_rate(&self) -> Option<f64> {
        self.frame_rate
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer,
/// dropping any per-row padding (stride > width * 3).
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    pixels
}
