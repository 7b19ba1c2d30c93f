use log::info;

use crate::context::Context;
use crate::ember::Ember8;
use crate::error::Error;
use crate::pacer::DEFAULT_RATE;

/// Step-by-step construction of an `Ember8`
///
/// ```
/// # use ember8::{Builder, Context, FrameView};
/// # struct Headless([bool; 16]);
/// # impl Context for Headless {
/// #     fn on_frame(&mut self, _: FrameView<'_>) {}
/// #     fn sound_on(&mut self) {}
/// #     fn sound_off(&mut self) {}
/// #     fn get_keys(&mut self) -> &[bool; 16] { &self.0 }
/// #     fn gen_random(&mut self) -> u8 { 4 }
/// # }
/// let chip = Builder::new()
///     .with_context(Headless([false; 16]))
///     .with_program(&[0x12, 0x00])
///     .with_rate(500.0)
///     .build()
///     .unwrap();
/// assert_eq!(chip.rate(), 500.0);
/// ```
pub struct Builder<'a, C: Context> {
    context: Option<C>,
    program: Option<&'a [u8]>,
    rate: f64,
}

impl<'a, C: Context> Builder<'a, C> {
    pub fn new() -> Self {
        Self {
            context: None,
            program: None,
            rate: DEFAULT_RATE,
        }
    }

    pub fn with_context(mut self, ctx: C) -> Self {
        self.context = Some(ctx);
        self
    }

    pub fn with_program(mut self, prog: &'a [u8]) -> Self {
        self.program = Some(prog);
        self
    }

    /// Instructions per second, 700 if not set
    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    pub fn build(self) -> Result<Ember8<C>, Error> {
        let context = self.context.ok_or(Error::MissingContext)?;
        let program = self.program.ok_or(Error::MissingProgram)?;
        let mut chip = Ember8::load(context, program)?;
        chip.set_rate(self.rate);
        info!("interpreter ready, {} instructions/s", self.rate);
        Ok(chip)
    }
}

impl<'a, C: Context> Default for Builder<'a, C> {
    fn default() -> Self {
        Self::new()
    }
}
