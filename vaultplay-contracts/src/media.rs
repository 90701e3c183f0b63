use std::fmt;
use vaultplay_model::GateView;

/// Command surface of the native media-playback primitive.
///
/// The engine only issues commands; the primitive reports back through
/// [`vaultplay_model::MediaEvent`]s fed to the playback machine.
pub trait MediaPrimitive: Send + fmt::Debug {
    fn play(&mut self);

    fn pause(&mut self);

    fn seek(&mut self, offset_seconds: f64);
}

/// Presentation surface for the gate overlay and playback errors.
pub trait GateSurface: Send + fmt::Debug {
    /// Render the overlay stage. [`GateView::Hidden`] closes it.
    fn show(&mut self, view: &GateView);

    /// A media error stopped playback.
    fn playback_failed(&mut self, message: &str);
}
