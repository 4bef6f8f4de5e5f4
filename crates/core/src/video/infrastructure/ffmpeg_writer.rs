use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::video::domain::video_writer::{EncoderSettings, VideoWriter};

/// Encodes RGB frames to MPEG-4 Part 2 via ffmpeg-next.
///
/// The container is chosen from the output extension (`.mp4` for
/// recordings). Frames are converted RGB24 → YUV420P before encoding.
pub struct FfmpegWriter {
    state: Option<EncoderState>,
}

/// Everything that only exists between `open` and `close`.
struct EncoderState {
    path: PathBuf,
    octx: ffmpeg_next::format::context::Output,
    encoder: ffmpeg_next::codec::encoder::video::Encoder,
    scaler: ffmpeg_next::software::scaling::Context,
    encoder_time_base: ffmpeg_next::Rational,
    stream_time_base: ffmpeg_next::Rational,
    width: u32,
    height: u32,
    frame_count: i64,
}

const STREAM_INDEX: usize = 0;

impl FfmpegWriter {
    pub fn new() -> Self {
        Self { state: None }
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }
}

impl Default for FfmpegWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Encoder frame rate as an integer, with 30 standing in for unusable input.
fn integral_fps(fps: f64) -> i32 {
    let rounded = fps.round();
    if rounded.is_finite() && rounded >= 1.0 {
        rounded as i32
    } else {
        30
    }
}

impl VideoWriter for FfmpegWriter {
    fn open(
        &mut self,
        path: &Path,
        settings: &EncoderSettings,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if self.state.is_some() {
            return Err("FfmpegWriter: already open".into());
        }
        if settings.width == 0 || settings.height == 0 {
            return Err(format!(
                "FfmpegWriter: invalid frame size {}x{}",
                settings.width, settings.height
            )
            .into());
        }
        ffmpeg_next::init()?;

        let mut octx = ffmpeg_next::format::output(path)?;
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4)
            .ok_or("MPEG4 encoder not found")?;

        let mut ost = octx.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;

        let fps = integral_fps(settings.fps);
        let encoder_time_base = ffmpeg_next::Rational(1, fps);
        encoder_ctx.set_width(settings.width);
        encoder_ctx.set_height(settings.height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(encoder_time_base);
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        ost.set_parameters(&encoder);
        drop(ost);

        octx.write_header()?;
        let stream_time_base = octx
            .stream(STREAM_INDEX)
            .ok_or("FfmpegWriter: output stream missing")?
            .time_base();

        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            settings.width,
            settings.height,
            ffmpeg_next::format::Pixel::YUV420P,
            settings.width,
            settings.height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        log::debug!(
            "Encoder opened: {} ({}x{} @ {fps} fps)",
            path.display(),
            settings.width,
            settings.height
        );

        self.state = Some(EncoderState {
            path: path.to_path_buf(),
            octx,
            encoder,
            scaler,
            encoder_time_base,
            stream_time_base,
            width: settings.width,
            height: settings.height,
            frame_count: 0,
        });
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let state = self.state.as_mut().ok_or("FfmpegWriter: not opened")?;
        if frame.dimensions() != (state.width, state.height) {
            return Err(format!(
                "FfmpegWriter: frame is {}x{}, encoder expects {}x{}",
                frame.width(),
                frame.height(),
                state.width,
                state.height
            )
            .into());
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            state.width,
            state.height,
        );

        // Copy row by row, the ffmpeg plane may be padded.
        let stride = rgb_frame.stride(0);
        let row_bytes = state.width as usize * 3;
        let plane = rgb_frame.data_mut(0);
        for (row, src) in frame.data().chunks_exact(row_bytes).enumerate() {
            let dst_start = row * stride;
            plane[dst_start..dst_start + row_bytes].copy_from_slice(src);
        }

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        state.scaler.run(&rgb_frame, &mut yuv_frame)?;
        yuv_frame.set_pts(Some(state.frame_count));

        state.encoder.send_frame(&yuv_frame)?;
        state.drain_packets()?;

        state.frame_count += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let Some(mut state) = self.state.take() else {
            return Ok(());
        };
        state.encoder.send_eof()?;
        state.drain_packets()?;
        state.octx.write_trailer()?;
        log::debug!(
            "Encoder closed: {} ({} frames)",
            state.path.display(),
            state.frame_count
        );
        Ok(())
    }
}

impl EncoderState {
    fn drain_packets(&mut self) -> Result<(), ffmpeg_next::Error> {
        let mut encoded = ffmpeg_next::Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(STREAM_INDEX);
            encoded.rescale_ts(self.encoder_time_base, self.stream_time_base);
            encoded.write_interleaved(&mut self.octx)?;
        }
        Ok(())
    }
}

impl Drop for FfmpegWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Failed to finalize video: {e}");
        }
    }
}
