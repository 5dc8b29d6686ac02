use chrono::{DateTime, Local};
use tracing::{debug, info, instrument, warn};

use crate::spectrometer::acquisition::params::{AcquisitionParams, Capture, Measurement};
use crate::spectrometer::acquisition::timing::{ProcessTimings, Timer};
use crate::spectrometer::brightness::BrightnessNormalizer;
use crate::spectrometer::calibration::{CalibrationAnchors, CalibrationModel};
use crate::spectrometer::camera::{CameraControl, Exposure, Rotation, SessionState};
use crate::spectrometer::common::error::{Result, SpectroError};
use crate::spectrometer::extraction::SpectrumExtractor;
use crate::spectrometer::image::CropBox;
use crate::spectrometer::overlay::{status_text, OverlayFields, OverlayRenderer};
use crate::spectrometer::peripherals::{Indicator, NoDisplay, NoIndicator, PreviewDisplay};
use crate::spectrometer::persistence::{ExperimentMetadata, MeasurementRecord, ResultWriter};

/// Drives the prepare / measure / process workflow over one camera.
///
/// Every failing step leaves a human-readable line in [`status`](Self::status)
/// and returns the error; the camera stays in whatever state the session left
/// it in (streaming after a processing error).
pub struct AcquisitionController<C: CameraControl, W: ResultWriter> {
    camera: C,
    writer: W,
    indicator: Box<dyn Indicator>,
    display: Box<dyn PreviewDisplay>,
    renderer: OverlayRenderer,
    params: AcquisitionParams,
    last_capture: Option<Capture>,
    status: String,
}

impl<C: CameraControl, W: ResultWriter> AcquisitionController<C, W> {
    pub fn new(camera: C, writer: W, params: AcquisitionParams) -> Self {
        let renderer = OverlayRenderer::new(camera.resolution());
        Self {
            camera,
            writer,
            indicator: Box::new(NoIndicator),
            display: Box::new(NoDisplay),
            renderer,
            params,
            last_capture: None,
            status: "Ready".to_string(),
        }
    }

    pub fn with_indicator(mut self, indicator: Box<dyn Indicator>) -> Self {
        self.indicator = indicator;
        self
    }

    pub fn with_display(mut self, display: Box<dyn PreviewDisplay>) -> Self {
        self.display = display;
        self
    }

    pub fn params(&self) -> &AcquisitionParams {
        &self.params
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn camera_state(&self) -> SessionState {
        self.camera.state()
    }

    pub fn last_capture(&self) -> Option<&Capture> {
        self.last_capture.as_ref()
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        debug!(status = %self.status, "Status");
    }

    fn report<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            warn!("Workflow step failed: {}", e);
            self.set_status(e.user_message());
        }
        result
    }

    /// Pushes an overlay for the current parameters. Outside of streaming
    /// there is nothing to draw on, so this is a no-op.
    fn refresh_overlay(&mut self) -> Result<()> {
        if self.camera.state() != SessionState::Streaming {
            return Ok(());
        }
        let status = status_text(self.params.exposure);
        let overlay = self.renderer.render(&self.params.overlay_params(Some(status)));
        self.camera.render_overlay(&overlay)
    }

    /// Starts the preview with the current exposure and rotation.
    #[instrument(skip(self))]
    pub fn prepare(&mut self) -> Result<()> {
        let result = self
            .camera
            .start_streaming(self.params.exposure, self.params.rotation)
            .and_then(|_| self.refresh_overlay());
        self.report(result)?;
        self.set_status(format!("Streaming at {:.1} s exposure", self.params.exposure.seconds()));
        Ok(())
    }

    fn apply_camera_settings(&mut self, exposure: Exposure, rotation: Rotation) -> Result<()> {
        if self.camera.state() == SessionState::Streaming {
            self.camera.update_parameters(exposure, rotation)?;
        }
        self.params.exposure = exposure;
        self.params.rotation = rotation;
        self.refresh_overlay()
    }

    pub fn set_exposure(&mut self, seconds: f64) -> Result<()> {
        let rotation = self.params.rotation;
        let result = Exposure::new(seconds).and_then(|exposure| self.apply_camera_settings(exposure, rotation));
        self.report(result)
    }

    pub fn set_rotation(&mut self, degrees: f64) -> Result<()> {
        let exposure = self.params.exposure;
        let result = Rotation::new(degrees).and_then(|rotation| self.apply_camera_settings(exposure, rotation));
        self.report(result)
    }

    pub fn set_fine_angle(&mut self, degrees: f64) -> Result<()> {
        if !degrees.is_finite() {
            return self.report(Err(SpectroError::invalid_parameter("angle", degrees)));
        }
        self.params.fine_angle = degrees;
        Ok(())
    }

    pub fn set_crop(&mut self, crop: CropBox) -> Result<()> {
        self.params.crop = crop;
        let result = self.refresh_overlay();
        self.report(result)
    }

    pub fn set_calibration(&mut self, calibration: CalibrationAnchors) -> Result<()> {
        self.params.calibration = calibration;
        let result = self.refresh_overlay();
        self.report(result)
    }

    pub fn set_metadata(&mut self, metadata: ExperimentMetadata) {
        self.params.metadata = metadata;
    }

    /// Takes crop and calibration lines from raw text fields. Returns `false`
    /// and changes nothing while any field is incomplete.
    pub fn apply_fields(&mut self, fields: &OverlayFields) -> Result<bool> {
        let status = Some(status_text(self.params.exposure));
        let Some(overlay) = self.renderer.render_fields(fields, status) else {
            return Ok(false);
        };
        let params = fields.parse()?;
        if let Some(crop) = params.crop {
            self.params.crop = crop;
        }
        if let (Some(pixel1), Some(pixel2)) = (params.pixel1, params.pixel2) {
            self.params.calibration.pixel1 = pixel1;
            self.params.calibration.pixel2 = pixel2;
        }
        if self.camera.state() == SessionState::Streaming {
            let result = self.camera.render_overlay(&overlay);
            self.report(result)?;
        }
        Ok(true)
    }

    pub fn measure(&mut self) -> Result<&Capture> {
        self.measure_at(Local::now())
    }

    /// Captures a still. The camera is streaming again when this returns.
    #[instrument(skip(self, taken_at))]
    pub fn measure_at(&mut self, taken_at: DateTime<Local>) -> Result<&Capture> {
        if let Err(e) = self.indicator.set_color(self.params.light_color) {
            warn!("Light indicator not updated: {}", e);
        }

        let still = self.camera.capture_still();
        let still = self.report(still)?;
        let capture = Capture::new(taken_at, still);

        let framing = self.renderer.render(&self.params.overlay_params(None));
        if let Err(e) = self.display.show(&framing.draw_onto(&capture.image)) {
            warn!("Preview display not updated: {}", e);
        }

        info!(stamp = %capture.stamp, width = capture.image.width, height = capture.image.height, "Measurement taken");
        self.set_status(format!("Measurement taken at {}", capture.stamp));
        Ok(self.last_capture.insert(capture))
    }

    /// Crops, normalises and extracts the last capture, then hands the result
    /// to the writer. Does not touch the camera. The light goes off whether or
    /// not processing succeeds.
    #[instrument(skip(self))]
    pub fn process(&mut self) -> Result<Measurement> {
        let result = self.run_processing();
        if let Err(e) = self.indicator.off() {
            warn!("Light indicator not switched off: {}", e);
        }
        let measurement = self.report(result)?;
        self.set_status(format!("Spectrum saved ({})", measurement.stamp));
        Ok(measurement)
    }

    fn run_processing(&mut self) -> Result<Measurement> {
        let capture = self.last_capture.as_ref().ok_or(SpectroError::MissingCapture)?;
        let params = &self.params;
        let mut timings = ProcessTimings::new();

        let calibration = CalibrationModel::new(&params.calibration)?;

        let rotated = {
            let _span = tracing::info_span!("rotate", angle = params.fine_angle).entered();
            let timer = Timer::start("rotate");
            let rotated = if params.fine_angle == 0.0 {
                None
            } else {
                Some(capture.image.rotate(params.fine_angle))
            };
            timings.add_stage(timer.stop());
            rotated
        };
        let source = rotated.as_ref().unwrap_or(&capture.image);

        let cropped = {
            let _span = tracing::info_span!("crop", crop = ?params.crop).entered();
            let timer = Timer::start("crop");
            let cropped = source.crop(&params.crop)?;
            timings.add_stage(timer.stop());
            cropped
        };

        let normalized = {
            let _span = tracing::info_span!("normalize").entered();
            let timer = Timer::start("normalize");
            let normalized = BrightnessNormalizer::normalize(&cropped)?;
            timings.add_stage(timer.stop());
            normalized
        };

        let trace = {
            let _span = tracing::info_span!("extract", columns = normalized.image.width).entered();
            let timer = Timer::start("extract");
            let trace = SpectrumExtractor::extract(&normalized.image, &calibration)?;
            timings.add_stage(timer.stop());
            trace
        };

        if let Err(e) = self.display.show(&cropped) {
            warn!("Preview display not updated: {}", e);
        }

        let metadata = ExperimentMetadata {
            light_source: params.light_description(self.indicator.is_present()),
            ..params.metadata.clone()
        };

        {
            let _span = tracing::info_span!("persist").entered();
            let timer = Timer::start("persist");
            self.writer.persist(&MeasurementRecord {
                stamp: &capture.stamp,
                raw: &capture.image,
                processed: &normalized.image,
                trace: &trace,
                metadata: &metadata,
                exposure: params.exposure,
            })?;
            timings.add_stage(timer.stop());
        }

        timings.log_summary();
        if let Some(peak) = trace.peak() {
            info!(
                stamp = %capture.stamp,
                factor = normalized.factor,
                peak_nm = peak.wavelength,
                peak_intensity = peak.intensity,
                "Spectrum extracted"
            );
        }

        Ok(Measurement {
            stamp: capture.stamp.clone(),
            raw: capture.image.clone(),
            processed: normalized.image,
            trace,
            scale_factor: normalized.factor,
            timings,
        })
    }

    pub fn measure_and_process(&mut self) -> Result<Measurement> {
        self.measure()?;
        self.process()
    }

    /// Switches the light off and closes the camera. Safe to call repeatedly.
    pub fn shutdown(&mut self) -> Result<()> {
        if let Err(e) = self.indicator.off() {
            warn!("Light indicator not switched off: {}", e);
        }
        let result = self.camera.close();
        self.report(result)?;
        self.set_status("Camera closed");
        Ok(())
    }
}
