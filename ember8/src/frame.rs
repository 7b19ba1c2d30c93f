use bitvec::prelude::*;
#[cfg(feature = "embedded-graphics")]
use embedded_graphics::{image::ImageRaw, pixelcolor::BinaryColor};

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;
pub(crate) const MEM_LENGTH: usize = WIDTH * HEIGHT / 8;

/// An opaque struct holding frame of Ember8 display
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Frame([u8; MEM_LENGTH]);

/// A shared view over a `Frame`
///
/// Has different accessors for the content of frames, which can be used independently
/// to fulfill the needs.
///
/// Each pixel is represented either by a corresponding bit being set, or by `true` value.
/// Internally, the data is stored in a form of concatenating rows from top to bottom of the frame.
/// Rows are represented as an individual bits of continuous memory, matching the state of pixels
/// from left to the right.
///
/// #Note:
/// Can return ImageRaw instance with `embedded-graphics` feature on.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct FrameView<'a>(&'a [u8; MEM_LENGTH]);

impl<'a> FrameView<'a> {
    /// View the raw memory of a frame
    pub fn as_raw(&self) -> &[u8] {
        self.0
    }

    /// Create an immutable copy of a frame
    pub fn copy_frame(self) -> Frame {
        Frame(*self.0)
    }

    /// Access frame's bits by indexes
    pub fn get_bit(&self, x: usize, y: usize) -> Option<&bool> {
        self.iter_rows_as_bitslices()
            .nth(y)
            .map(|row| row.get(x))
            .flatten()
    }

    /// Number of lit pixels
    pub fn count_lit(&self) -> usize {
        self.iter_rows_as_bitslices().map(|row| row.count_ones()).sum()
    }

    /// Get iterator over rows in a form of a `BitSlice`s
    pub fn iter_rows_as_bitslices(&self) -> impl Iterator<Item = &'a BitSlice<Msb0, u8>> {
        self.0.chunks(WIDTH / 8).map(|row| row.view_bits::<_>())
    }

    /// Iter all pixels row-major, from the top-left corner
    pub fn iter_pixels(&self) -> impl Iterator<Item = bool> + 'a {
        self.iter_rows_as_bitslices()
            .flat_map(|row| row.iter().map(|bit| *bit))
    }

    /// Iter frame pixelwise (each pixel in row for each row in frame) after scaling it
    /// by a given factor.
    pub fn iter_pixelwise_scaled(
        &self,
        scale: usize,
    ) -> impl Iterator<Item = impl Iterator<Item = &bool>> {
        self.iter_rows_as_bitslices()
            .zip(core::iter::repeat(scale))
            .map(move |(row, scale)| {
                row.iter()
                    .flat_map(move |bit| core::iter::repeat(bit).take(scale))
            })
            .flat_map(move |row| core::iter::repeat(row).take(scale))
    }

    /// Get `ImageRaw` structure from frame's data
    #[cfg(feature = "embedded-graphics")]
    pub fn as_raw_image(&self) -> ImageRaw<'a, BinaryColor> {
        ImageRaw::new(self.0, WIDTH as u32, HEIGHT as u32)
    }
}

impl Frame {
    pub(crate) fn new() -> Self {
        Self([0; MEM_LENGTH])
    }

    /// Get view over frame
    pub fn view(&self) -> FrameView<'_> {
        FrameView(&self.0)
    }

    pub(crate) fn clear(&mut self) {
        self.0 = [0; MEM_LENGTH];
    }

    /// XOR a single pixel with `val`
    ///
    /// Returns `Some(true)` when a lit pixel got switched off, `None` when the pixel is
    /// outside of the frame.
    pub(crate) fn xor_bit(&mut self, x: usize, y: usize, val: bool) -> Option<bool> {
        self.iter_rows_as_bitslices_mut()
            .nth(y)
            .map(|row| {
                row.get_mut(x).map(|mut bit| {
                    let erased = *bit && val;
                    *bit ^= val;
                    erased
                })
            })
            .flatten()
    }

    /// XOR an 8 pixels wide sprite row onto the frame with its left edge at `(x, y)`
    ///
    /// Pixels falling past the right or bottom edge are clipped. Returns whether any lit
    /// pixel got switched off.
    pub(crate) fn xor_sprite_row(&mut self, x: usize, y: usize, sprite: u8) -> bool {
        let mut collision = false;
        for (col, bit) in sprite.view_bits::<Msb0>().iter().enumerate() {
            if x + col >= WIDTH || y >= HEIGHT {
                break;
            }
            if *bit {
                collision |= self.xor_bit(x + col, y, true).unwrap_or(false);
            }
        }
        collision
    }

    pub(crate) fn iter_rows_as_bitslices_mut(
        &mut self,
    ) -> impl Iterator<Item = &mut BitSlice<Msb0, u8>> {
        self.0
            .chunks_mut(WIDTH / 8)
            .map(|row| row.view_bits_mut::<_>())
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl<'a> FrameView<'a> {
    pub(crate) fn new(frame: &'a [u8; MEM_LENGTH]) -> Self {
        Self(frame)
    }
}

#[cfg(test)]
impl Frame {
    pub(crate) fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}
