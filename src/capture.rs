//! PNG snapshots and animated GIF recordings of the particle field.

use crate::color::{Rgb, BACKGROUND};
use crate::error::Result;
use crate::simulation::ParticleField;
use crate::surface::{disc_cells, draw_field, line_cells, Surface};
use image::{ImageFormat, Rgba, RgbaImage};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Longest recording, in encoded frames
pub const MAX_GIF_FRAMES: usize = 300;

/// Encode one GIF frame for every this many field frames
const GIF_FRAME_STRIDE: u32 = 2;

/// NeuQuant speed (1 = best quality, 30 = fastest)
const GIF_QUANT_SPEED: i32 = 30;

/// Pixel surface, one field unit per pixel
pub struct RasterSurface {
    image: RgbaImage,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        let bg = Rgba([BACKGROUND.r, BACKGROUND.g, BACKGROUND.b, 255]);
        Self {
            image: RgbaImage::from_pixel(width.max(1), height.max(1), bg),
        }
    }

    /// Surface sized to cover the whole field
    pub fn for_field(field: &ParticleField) -> Self {
        Self::new(field.width.ceil() as u32, field.height.ceil() as u32)
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    fn blend_pixel(&mut self, x: usize, y: usize, color: Rgb, alpha: f32) {
        let pixel = self.image.get_pixel_mut(x as u32, y as u32);
        let [r, g, b, _] = pixel.0;
        let out = Rgb::new(r, g, b).blend(color, alpha);
        *pixel = Rgba([out.r, out.g, out.b, 255]);
    }
}

impl Surface for RasterSurface {
    fn fade(&mut self, color: Rgb, alpha: f32) {
        for pixel in self.image.pixels_mut() {
            let [r, g, b, _] = pixel.0;
            let out = Rgb::new(r, g, b).blend(color, alpha);
            *pixel = Rgba([out.r, out.g, out.b, 255]);
        }
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb, alpha: f32) {
        let (w, h) = (self.image.width() as usize, self.image.height() as usize);
        let mut hits = Vec::new();
        disc_cells(cx, cy, radius, 1.0, w, h, |x, y| hits.push((x, y)));
        for (x, y) in hits {
            self.blend_pixel(x, y, color, alpha);
        }
    }

    fn stroke_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgb, alpha: f32) {
        let (w, h) = (self.image.width() as usize, self.image.height() as usize);
        let mut hits = Vec::new();
        line_cells(x0, y0, x1, y1, 1.0, w, h, |x, y| hits.push((x, y)));
        for (x, y) in hits {
            self.blend_pixel(x, y, color, alpha);
        }
    }
}

fn timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Create `<stem>.<ext>` in `dir`, or `<stem>-1.<ext>`, `<stem>-2.<ext>`, ... if taken
fn create_unique(dir: &Path, stem: &str, ext: &str) -> Result<(PathBuf, File)> {
    fs::create_dir_all(dir)?;
    let mut n = 0u32;
    loop {
        let name = match n {
            0 => format!("{}.{}", stem, ext),
            _ => format!("{}-{}.{}", stem, n, ext),
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Render the current field into a fresh image and write it as PNG into `dir`
pub fn save_snapshot(field: &ParticleField, dir: &Path) -> Result<PathBuf> {
    let mut surface = RasterSurface::for_field(field);
    draw_field(&mut surface, field);

    let (path, file) = create_unique(dir, &format!("constellation-{}-{}", timestamp(), field.frames), "png")?;
    let mut writer = BufWriter::new(file);
    surface.image().write_to(&mut writer, ImageFormat::Png)?;
    writer.flush()?;

    log::info!("Saved snapshot to {}", path.display());
    Ok(path)
}

/// Streams field frames into an animated GIF
pub struct GifRecorder {
    encoder: gif::Encoder<BufWriter<File>>,
    surface: RasterSurface,
    path: PathBuf,
    width: u16,
    height: u16,
    delay_cs: u16,
    frames_seen: u32,
    frames_written: usize,
}

impl GifRecorder {
    /// Open a new `constellation-<ts>.gif` in `dir` for a field of the current size
    pub fn start(field: &ParticleField, dir: &Path, fps: u32) -> Result<Self> {
        let (path, file) = create_unique(dir, &format!("constellation-{}", timestamp()), "gif")?;

        let width = field.width.ceil().clamp(1.0, u16::MAX as f32) as u16;
        let height = field.height.ceil().clamp(1.0, u16::MAX as f32) as u16;

        let mut encoder = gif::Encoder::new(BufWriter::new(file), width, height, &[])?;
        encoder.set_repeat(gif::Repeat::Infinite)?;

        // GIF delays are in centiseconds
        let delay_cs = ((100 * GIF_FRAME_STRIDE) as f32 / fps.max(1) as f32).round().max(2.0) as u16;

        log::info!("Recording GIF to {} ({}x{})", path.display(), width, height);
        Ok(Self {
            encoder,
            surface: RasterSurface::new(width as u32, height as u32),
            path,
            width,
            height,
            delay_cs,
            frames_seen: 0,
            frames_written: 0,
        })
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    pub fn is_full(&self) -> bool {
        self.frames_written >= MAX_GIF_FRAMES
    }

    /// Draw the field into the recording surface, encoding every stride-th frame
    pub fn capture(&mut self, field: &ParticleField) -> Result<()> {
        if self.is_full() {
            return Ok(());
        }

        draw_field(&mut self.surface, field);
        self.frames_seen += 1;
        if (self.frames_seen - 1) % GIF_FRAME_STRIDE != 0 {
            return Ok(());
        }

        let mut pixels = self.surface.image().clone().into_raw();
        let mut frame = gif::Frame::from_rgba_speed(self.width, self.height, &mut pixels, GIF_QUANT_SPEED);
        frame.delay = self.delay_cs;
        self.encoder.write_frame(&frame)?;
        self.frames_written += 1;
        Ok(())
    }

    /// Write the trailer and close the file
    pub fn finish(self) -> Result<PathBuf> {
        let frames = self.frames_written;
        let mut writer = self.encoder.into_inner()?;
        writer.flush()?;
        log::info!("Finished GIF {} ({} frames)", self.path.display(), frames);
        Ok(self.path)
    }
}
