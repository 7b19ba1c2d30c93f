use ember8::{Context, Frame, FrameView};
use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// `Context` without any real peripherals
///
/// Keys are whatever was set last, sound is only a flag and frames are kept
/// so they can be printed once the run is over.
pub struct HeadlessContext {
    keys: [bool; 16],
    rng: StdRng,
    frame: Option<Frame>,
    sound: bool,
    frames: usize,
}

impl HeadlessContext {
    pub fn new(keys: [bool; 16]) -> Self {
        Self::with_rng(keys, StdRng::from_entropy())
    }

    /// Context with reproducible random numbers
    pub fn with_seed(keys: [bool; 16], seed: u64) -> Self {
        Self::with_rng(keys, StdRng::seed_from_u64(seed))
    }

    fn with_rng(keys: [bool; 16], rng: StdRng) -> Self {
        Self {
            keys,
            rng,
            frame: None,
            sound: false,
            frames: 0,
        }
    }

    pub fn set_keys(&mut self, keys: [bool; 16]) {
        self.keys = keys;
    }

    pub fn last_frame(&self) -> Option<FrameView<'_>> {
        self.frame.as_ref().map(Frame::view)
    }

    pub fn is_sound_on(&self) -> bool {
        self.sound
    }

    pub fn frames_received(&self) -> usize {
        self.frames
    }
}

impl Context for HeadlessContext {
    fn on_frame(&mut self, frame: FrameView<'_>) {
        self.frame = Some(frame.copy_frame());
        self.frames += 1;
    }

    fn sound_on(&mut self) {
        debug!("beep");
        self.sound = true;
    }

    fn sound_off(&mut self) {
        self.sound = false;
    }

    fn get_keys(&mut self) -> &[bool; 16] {
        &self.keys
    }

    fn gen_random(&mut self) -> u8 {
        self.rng.gen::<u8>()
    }
}
