#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use chrono::{Local, TimeZone};

    use crate::spectrometer::acquisition::{AcquisitionController, AcquisitionParams};
    use crate::spectrometer::calibration::CalibrationAnchors;
    use crate::spectrometer::camera::{
        CameraControl, CameraDevice, CameraSession, CameraSettings, CameraWorker, Exposure, Resolution,
        Rotation, SessionConfig, SessionState, StreamingServer,
    };
    use crate::spectrometer::common::error::{Result, SpectroError};
    use crate::spectrometer::extraction::SpectrumTrace;
    use crate::spectrometer::image::{CropBox, Rgb, RgbImageData};
    use crate::spectrometer::overlay::OverlayFields;
    use crate::spectrometer::peripherals::Indicator;
    use crate::spectrometer::persistence::{ExperimentMetadata, MeasurementRecord, ResultWriter};

    /// Shared record of everything the mocks were asked to do, in call order.
    #[derive(Default)]
    struct HardwareLog {
        events: Vec<String>,
        overlays: Vec<String>,
        configure_failures: u32,
        capture_fails: bool,
        overlay_fails: bool,
    }

    type SharedLog = Arc<Mutex<HardwareLog>>;

    fn push(log: &SharedLog, event: impl Into<String>) {
        log.lock().unwrap().events.push(event.into());
    }

    fn events(log: &SharedLog) -> Vec<String> {
        log.lock().unwrap().events.clone()
    }

    fn position(events: &[String], event: &str) -> usize {
        events.iter().position(|e| e == event).unwrap()
    }

    struct MockCamera {
        frame: RgbImageData,
        log: SharedLog,
    }

    impl CameraDevice for MockCamera {
        fn resolution(&self) -> Resolution {
            Resolution::new(self.frame.width as u32, self.frame.height as u32)
        }

        fn configure(&mut self, settings: &CameraSettings) -> Result<()> {
            let mut log = self.log.lock().unwrap();
            log.events.push(format!("configure {}", settings.shutter_us()));
            if log.configure_failures > 0 {
                log.configure_failures -= 1;
                return Err(SpectroError::CameraFailure("Mock configure error".to_string()));
            }
            Ok(())
        }

        fn capture_still(&mut self) -> Result<RgbImageData> {
            let mut log = self.log.lock().unwrap();
            log.events.push("capture".to_string());
            if log.capture_fails {
                return Err(SpectroError::CameraFailure("Mock capture error".to_string()));
            }
            Ok(self.frame.clone())
        }

        fn close(&mut self) -> Result<()> {
            push(&self.log, "camera close");
            Ok(())
        }
    }

    struct MockStreamer {
        log: SharedLog,
    }

    impl StreamingServer for MockStreamer {
        fn start_recording(&mut self, _camera: &mut dyn CameraDevice, _bitrate: u32) -> Result<()> {
            push(&self.log, "start");
            Ok(())
        }

        fn stop_recording(&mut self, _camera: &mut dyn CameraDevice) -> Result<()> {
            push(&self.log, "stop");
            Ok(())
        }

        fn send_overlay(&mut self, svg: &str) -> Result<()> {
            let mut log = self.log.lock().unwrap();
            log.events.push("overlay".to_string());
            if log.overlay_fails {
                return Err(SpectroError::CameraFailure("Mock overlay error".to_string()));
            }
            log.overlays.push(svg.to_string());
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            push(&self.log, "server close");
            Ok(())
        }
    }

    #[derive(Debug, Clone)]
    struct PersistedRecord {
        stamp: String,
        processed: RgbImageData,
        trace: SpectrumTrace,
        metadata: ExperimentMetadata,
        shutter_us: u32,
    }

    struct MockWriter {
        should_fail: bool,
        log: SharedLog,
        written: Arc<Mutex<Vec<PersistedRecord>>>,
    }

    impl ResultWriter for MockWriter {
        fn persist(&mut self, record: &MeasurementRecord<'_>) -> Result<()> {
            push(&self.log, "persist");
            if self.should_fail {
                return Err(SpectroError::EncodeError("Mock encode error".to_string()));
            }
            self.written.lock().unwrap().push(PersistedRecord {
                stamp: record.stamp.to_string(),
                processed: record.processed.clone(),
                trace: record.trace.clone(),
                metadata: record.metadata.clone(),
                shutter_us: record.exposure.shutter_us(),
            });
            Ok(())
        }
    }

    struct MockIndicator {
        colors: Arc<Mutex<Vec<Rgb>>>,
    }

    impl Indicator for MockIndicator {
        fn set_color(&mut self, color: Rgb) -> Result<()> {
            self.colors.lock().unwrap().push(color);
            Ok(())
        }
    }

    fn test_config() -> SessionConfig {
        SessionConfig::builder().settle_delay(Duration::ZERO).build()
    }

    /// Eight columns getting brighter to the right; every row identical.
    fn gradient_frame() -> RgbImageData {
        RgbImageData::from_fn(8, 4, |x, _| {
            let v = 10 + 10 * x as u8;
            Rgb::new(v, v, v)
        })
    }

    fn session_with(frame: RgbImageData) -> (CameraSession<MockCamera, MockStreamer>, SharedLog) {
        let log = SharedLog::default();
        let camera = MockCamera { frame, log: log.clone() };
        let streamer = MockStreamer { log: log.clone() };
        (CameraSession::new(camera, streamer, test_config()), log)
    }

    fn exposure(seconds: f64) -> Exposure {
        Exposure::new(seconds).unwrap()
    }

    fn rotation(degrees: f64) -> Rotation {
        Rotation::new(degrees).unwrap()
    }

    type TestController = AcquisitionController<CameraSession<MockCamera, MockStreamer>, MockWriter>;

    struct Rig {
        controller: TestController,
        log: SharedLog,
        written: Arc<Mutex<Vec<PersistedRecord>>>,
    }

    fn rig(frame: RgbImageData, writer_fails: bool) -> Rig {
        let (session, log) = session_with(frame.clone());
        let written = Arc::new(Mutex::new(Vec::new()));
        let writer = MockWriter { should_fail: writer_fails, log: log.clone(), written: written.clone() };
        let mut params = AcquisitionParams::for_resolution(session.resolution());
        params.calibration = CalibrationAnchors::new(0, frame.width as i64 - 1, 544.0, 611.0);
        Rig {
            controller: AcquisitionController::new(session, writer, params),
            log,
            written,
        }
    }

    // ---- camera session ----

    #[test]
    fn test_capture_while_idle_is_invalid_state() {
        let (mut session, log) = session_with(gradient_frame());

        let result = session.capture_still();

        assert!(matches!(
            result,
            Err(SpectroError::InvalidState { operation: "capture_still", state: SessionState::Idle })
        ));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(events(&log).is_empty());
    }

    #[test]
    fn test_operations_other_than_start_fail_while_idle() {
        let (mut session, _log) = session_with(gradient_frame());
        let overlay = crate::spectrometer::overlay::OverlayDescription::empty(session.resolution());

        assert!(matches!(
            session.update_parameters(exposure(0.5), rotation(0.0)),
            Err(SpectroError::InvalidState { .. })
        ));
        assert!(matches!(session.render_overlay(&overlay), Err(SpectroError::InvalidState { .. })));
    }

    #[test]
    fn test_capture_while_streaming_returns_to_streaming() {
        let (mut session, log) = session_with(gradient_frame());
        session.start_streaming(exposure(0.2), rotation(0.0)).unwrap();
        log.lock().unwrap().events.clear();

        let still = session.capture_still().unwrap();

        assert_eq!(still, gradient_frame());
        assert_eq!(session.state(), SessionState::Streaming);
        assert_eq!(events(&log), ["stop", "capture", "configure 200000", "start"]);
    }

    #[test]
    fn test_start_streaming_configures_exposure() {
        let (mut session, log) = session_with(gradient_frame());

        session.start_streaming(exposure(0.5), rotation(90.0)).unwrap();

        assert_eq!(session.state(), SessionState::Streaming);
        let settings = session.settings().unwrap();
        assert_eq!(settings.shutter_us(), 500_000);
        assert!((settings.framerate() - 2.0).abs() < 1e-12);
        assert_eq!(settings.iso, 800);
        assert_eq!(settings.rotation.degrees(), 90.0);
        assert_eq!(events(&log), ["configure 500000", "start", "overlay"]);
    }

    #[test]
    fn test_start_streaming_is_idempotent_for_same_settings() {
        let (mut session, log) = session_with(gradient_frame());
        session.start_streaming(exposure(0.2), rotation(0.0)).unwrap();
        let before = events(&log).len();

        session.start_streaming(exposure(0.2), rotation(0.0)).unwrap();

        assert_eq!(events(&log).len(), before);
    }

    #[test]
    fn test_start_streaming_with_new_settings_restarts() {
        let (mut session, log) = session_with(gradient_frame());
        session.start_streaming(exposure(0.2), rotation(0.0)).unwrap();
        log.lock().unwrap().events.clear();

        session.start_streaming(exposure(1.0), rotation(0.0)).unwrap();

        assert_eq!(events(&log), ["stop", "configure 1000000", "start", "overlay"]);
        assert_eq!(session.settings().unwrap().shutter_us(), 1_000_000);
    }

    #[test]
    fn test_update_parameters_rerenders_status_before_returning() {
        let (mut session, log) = session_with(gradient_frame());
        session.start_streaming(exposure(0.2), rotation(0.0)).unwrap();

        session.update_parameters(exposure(0.5), rotation(0.0)).unwrap();

        let log = log.lock().unwrap();
        let last = log.overlays.last().unwrap();
        assert!(last.contains("Exposure 0.5 sec - Framerate 2.00 fps"));
        assert_eq!(log.events.last().map(String::as_str), Some("overlay"));
    }

    #[test]
    fn test_update_parameters_keeps_rendered_shapes() {
        let (mut session, log) = session_with(gradient_frame());
        session.start_streaming(exposure(0.2), rotation(0.0)).unwrap();
        let renderer = crate::spectrometer::overlay::OverlayRenderer::new(session.resolution());
        let overlay = renderer.render(&crate::spectrometer::overlay::OverlayParams {
            crop: Some(CropBox::new(1, 1, 5, 3)),
            ..Default::default()
        });
        session.render_overlay(&overlay).unwrap();

        session.update_parameters(exposure(0.3), rotation(0.0)).unwrap();

        let log = log.lock().unwrap();
        let last = log.overlays.last().unwrap();
        assert!(last.contains("<rect"));
        assert!(last.contains("Exposure 0.3 sec"));
    }

    #[test]
    fn test_update_parameters_retries_once() {
        let (mut session, log) = session_with(gradient_frame());
        session.start_streaming(exposure(0.2), rotation(0.0)).unwrap();
        log.lock().unwrap().configure_failures = 1;

        session.update_parameters(exposure(0.4), rotation(0.0)).unwrap();

        assert_eq!(session.state(), SessionState::Streaming);
        let configures = events(&log).iter().filter(|e| *e == "configure 400000").count();
        assert_eq!(configures, 2);
    }

    #[test]
    fn test_update_parameters_gives_up_after_retry() {
        let (mut session, log) = session_with(gradient_frame());
        session.start_streaming(exposure(0.2), rotation(0.0)).unwrap();
        log.lock().unwrap().configure_failures = 2;

        let result = session.update_parameters(exposure(0.4), rotation(0.0));

        assert!(matches!(result, Err(SpectroError::CameraFailure(_))));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.settings().is_none());
    }

    #[test]
    fn test_lost_overlay_does_not_fail_start() {
        let (mut session, log) = session_with(gradient_frame());
        log.lock().unwrap().overlay_fails = true;

        session.start_streaming(exposure(0.5), rotation(0.0)).unwrap();

        assert_eq!(session.state(), SessionState::Streaming);
        assert!(events(&log).contains(&"overlay".to_string()));
    }

    #[test]
    fn test_failed_start_rolls_back_to_idle() {
        let (mut session, log) = session_with(gradient_frame());
        log.lock().unwrap().configure_failures = 1;

        let result = session.start_streaming(exposure(0.2), rotation(0.0));

        assert!(matches!(result, Err(SpectroError::CameraFailure(_))));
        assert_eq!(session.state(), SessionState::Idle);

        // the session is still usable afterwards
        session.start_streaming(exposure(0.2), rotation(0.0)).unwrap();
        assert_eq!(session.state(), SessionState::Streaming);
    }

    #[test]
    fn test_failed_capture_restores_stream() {
        let (mut session, log) = session_with(gradient_frame());
        session.start_streaming(exposure(0.2), rotation(0.0)).unwrap();
        log.lock().unwrap().capture_fails = true;

        let result = session.capture_still();

        assert!(matches!(result, Err(SpectroError::CameraFailure(_))));
        assert_eq!(session.state(), SessionState::Streaming);
        assert_eq!(events(&log).last().map(String::as_str), Some("start"));
    }

    #[test]
    fn test_close_makes_session_unusable() {
        let (mut session, log) = session_with(gradient_frame());
        session.start_streaming(exposure(0.2), rotation(0.0)).unwrap();

        session.close().unwrap();
        session.close().unwrap();

        assert_eq!(session.state(), SessionState::Closed);
        assert!(matches!(
            session.start_streaming(exposure(0.2), rotation(0.0)),
            Err(SpectroError::InvalidState { state: SessionState::Closed, .. })
        ));
        assert!(matches!(session.capture_still(), Err(SpectroError::InvalidState { .. })));

        let events = events(&log);
        assert_eq!(events.iter().filter(|e| *e == "camera close").count(), 1);
        assert_eq!(events.iter().filter(|e| *e == "server close").count(), 1);
        assert!(position(&events, "server close") < position(&events, "camera close"));
    }

    #[test]
    fn test_drop_releases_camera() {
        let (session, log) = session_with(gradient_frame());
        drop(session);
        assert!(events(&log).contains(&"camera close".to_string()));
    }

    // ---- worker ----

    #[test]
    fn test_worker_serialises_commands_in_order() {
        let (session, log) = session_with(gradient_frame());
        let mut handle = CameraWorker::spawn(session).unwrap();

        handle.start_streaming(exposure(0.2), rotation(0.0)).unwrap();
        handle.update_parameters(exposure(0.5), rotation(0.0)).unwrap();
        let still = handle.capture_still().unwrap();
        assert_eq!(handle.state(), SessionState::Streaming);
        handle.close().unwrap();

        assert_eq!(still.width, 8);
        assert_eq!(handle.state(), SessionState::Closed);
        assert!(matches!(handle.capture_still(), Err(SpectroError::InvalidState { .. })));

        let events = events(&log);
        let update = position(&events, "configure 500000");
        let capture = position(&events, "capture");
        assert!(update < capture);
        assert_eq!(events.last().map(String::as_str), Some("camera close"));
    }

    #[test]
    fn test_worker_closes_session_when_handle_dropped() {
        let (session, log) = session_with(gradient_frame());
        let mut handle = CameraWorker::spawn(session).unwrap();
        handle.start_streaming(exposure(0.2), rotation(0.0)).unwrap();

        drop(handle);

        assert!(events(&log).contains(&"camera close".to_string()));
    }

    // ---- controller ----

    #[test]
    fn test_end_to_end_measurement() {
        let mut rig = rig(gradient_frame(), false);
        rig.controller.prepare().unwrap();
        let taken_at = Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();

        rig.controller.measure_at(taken_at).unwrap();
        let measurement = rig.controller.process().unwrap();

        assert_eq!(measurement.stamp, "20240506-070809");
        assert_eq!(measurement.trace.len(), 8);
        let wavelengths = measurement.trace.wavelengths();
        assert!((wavelengths[0] - 544.0).abs() < 1e-9);
        assert!((wavelengths[7] - 611.0).abs() < 1e-9);
        assert_eq!(measurement.scale_factor, 255 / 80);
        assert_eq!(rig.controller.camera_state(), SessionState::Streaming);

        let written = rig.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].stamp, "20240506-070809");
        assert_eq!(written[0].trace, measurement.trace);
        assert_eq!(written[0].processed, measurement.processed);
        assert_eq!(written[0].shutter_us, 200_000);
    }

    #[test]
    fn test_descending_wavelengths_give_same_trace() {
        let mut rig = rig(gradient_frame(), false);
        rig.controller.prepare().unwrap();
        rig.controller.set_calibration(CalibrationAnchors::new(0, 7, 611.0, 544.0)).unwrap();

        rig.controller.measure().unwrap();
        let measurement = rig.controller.process().unwrap();

        let wavelengths = measurement.trace.wavelengths();
        assert!((wavelengths[0] - 544.0).abs() < 1e-9);
        assert!((wavelengths[7] - 611.0).abs() < 1e-9);
    }

    #[test]
    fn test_stream_resumes_before_processing() {
        let mut rig = rig(gradient_frame(), false);
        rig.controller.prepare().unwrap();

        rig.controller.measure_and_process().unwrap();

        let events = events(&rig.log);
        let capture = position(&events, "capture");
        let resumed = capture + events[capture..].iter().position(|e| e == "start").unwrap();
        assert!(resumed < position(&events, "persist"));
        // processing never touches the camera
        assert_eq!(events.last().map(String::as_str), Some("persist"));
    }

    #[test]
    fn test_processing_stages_run_in_order() {
        let mut rig = rig(gradient_frame(), false);
        rig.controller.prepare().unwrap();
        rig.controller.measure().unwrap();

        let measurement = rig.controller.process().unwrap();

        assert_eq!(
            measurement.timings.stage_names(),
            ["rotate", "crop", "normalize", "extract", "persist"]
        );
    }

    #[test]
    fn test_crop_applies_before_normalisation() {
        let mut rig = rig(gradient_frame(), false);
        rig.controller.prepare().unwrap();
        // columns 0..2 have levels 10 and 20
        rig.controller.set_crop(CropBox::new(0, 0, 2, 4)).unwrap();
        rig.controller.set_calibration(CalibrationAnchors::new(0, 1, 544.0, 611.0)).unwrap();
        rig.controller.measure().unwrap();

        let measurement = rig.controller.process().unwrap();

        // factor from the cropped maximum, not the full frame
        assert_eq!(measurement.scale_factor, 255 / 20);
        assert_eq!(measurement.processed.width, 2);
        assert_eq!(measurement.trace.len(), 2);
    }

    #[test]
    fn test_process_without_measure() {
        let mut rig = rig(gradient_frame(), false);
        rig.controller.prepare().unwrap();

        let result = rig.controller.process();

        assert!(matches!(result, Err(SpectroError::MissingCapture)));
        assert_eq!(rig.controller.status(), "Take a measurement before processing.");
    }

    #[test]
    fn test_invalid_crop_halts_processing_and_keeps_streaming() {
        let mut rig = rig(gradient_frame(), false);
        rig.controller.prepare().unwrap();
        rig.controller.set_crop(CropBox::new(5, 0, 3, 4)).unwrap();
        rig.controller.measure().unwrap();

        let result = rig.controller.process();

        assert!(matches!(result, Err(SpectroError::InvalidCropBox { .. })));
        assert!(rig.controller.status().starts_with("Check the crop area"));
        assert_eq!(rig.controller.camera_state(), SessionState::Streaming);
        assert!(rig.written.lock().unwrap().is_empty());
    }

    #[test]
    fn test_black_still_is_invalid_image() {
        let mut rig = rig(RgbImageData::filled(8, 4, Rgb::BLACK), false);
        rig.controller.prepare().unwrap();
        rig.controller.measure().unwrap();

        assert!(matches!(rig.controller.process(), Err(SpectroError::InvalidImage(_))));
        assert_eq!(rig.controller.camera_state(), SessionState::Streaming);
    }

    #[test]
    fn test_equal_calibration_lines_rejected() {
        let mut rig = rig(gradient_frame(), false);
        rig.controller.prepare().unwrap();
        rig.controller.set_calibration(CalibrationAnchors::new(3, 3, 544.0, 611.0)).unwrap();
        rig.controller.measure().unwrap();

        assert!(matches!(rig.controller.process(), Err(SpectroError::InvalidCalibration(_))));
    }

    #[test]
    fn test_writer_failure_is_reported() {
        let mut rig = rig(gradient_frame(), true);
        rig.controller.prepare().unwrap();
        rig.controller.measure().unwrap();

        assert!(matches!(rig.controller.process(), Err(SpectroError::EncodeError(_))));
        assert_eq!(rig.controller.status(), "Saving results failed. Check the output directory.");
    }

    #[test]
    fn test_measure_before_prepare_fails() {
        let mut rig = rig(gradient_frame(), false);

        let result = rig.controller.measure();

        assert!(matches!(result, Err(SpectroError::InvalidState { .. })));
        assert_eq!(rig.controller.status(), "Cannot capture still while the camera is idle.");
    }

    #[test]
    fn test_exposure_change_updates_stream_and_overlay() {
        let mut rig = rig(gradient_frame(), false);
        rig.controller.prepare().unwrap();

        rig.controller.set_exposure(1.0).unwrap();

        assert_eq!(rig.controller.params().exposure.seconds(), 1.0);
        assert!(events(&rig.log).contains(&"configure 1000000".to_string()));
        let log = rig.log.lock().unwrap();
        assert!(log.overlays.last().unwrap().contains("Exposure 1.0 sec"));
    }

    #[test]
    fn test_out_of_range_exposure_is_rejected() {
        let mut rig = rig(gradient_frame(), false);
        rig.controller.prepare().unwrap();

        let result = rig.controller.set_exposure(9.0);

        assert!(matches!(result, Err(SpectroError::InvalidParameter { .. })));
        assert_eq!(rig.controller.params().exposure.seconds(), 0.2);
        assert_eq!(rig.controller.camera_state(), SessionState::Streaming);
    }

    #[test]
    fn test_partial_fields_leave_overlay_alone() {
        let mut rig = rig(gradient_frame(), false);
        rig.controller.prepare().unwrap();
        let sent = rig.log.lock().unwrap().overlays.len();
        let before = rig.controller.params().clone();

        let fields = OverlayFields {
            crop: ["1".into(), "0".into(), "".into(), "4".into()],
            pixel1: "2".into(),
            pixel2: "6".into(),
        };
        assert!(!rig.controller.apply_fields(&fields).unwrap());

        assert_eq!(rig.log.lock().unwrap().overlays.len(), sent);
        assert_eq!(rig.controller.params(), &before);
    }

    #[test]
    fn test_complete_fields_update_parameters() {
        let mut rig = rig(gradient_frame(), false);
        rig.controller.prepare().unwrap();

        let fields = OverlayFields {
            crop: ["1".into(), "0".into(), "7".into(), "4".into()],
            pixel1: "2".into(),
            pixel2: "6".into(),
        };
        assert!(rig.controller.apply_fields(&fields).unwrap());

        let params = rig.controller.params();
        assert_eq!(params.crop, CropBox::new(1, 0, 7, 4));
        assert_eq!((params.calibration.pixel1, params.calibration.pixel2), (2, 6));
        assert_eq!(params.calibration.wavelength1, 544.0);
        let log = rig.log.lock().unwrap();
        assert!(log.overlays.last().unwrap().contains(r#"<line x1="6""#));
    }

    #[test]
    fn test_indicator_lit_for_measurement_and_off_after_processing() {
        let colors = Arc::new(Mutex::new(Vec::new()));
        let Rig { controller, written, .. } = rig(gradient_frame(), false);
        let mut controller = controller.with_indicator(Box::new(MockIndicator { colors: colors.clone() }));
        controller.prepare().unwrap();

        controller.measure_and_process().unwrap();

        assert_eq!(*colors.lock().unwrap(), [Rgb::new(255, 255, 255), Rgb::BLACK]);
        let written = written.lock().unwrap();
        assert_eq!(written[0].metadata.light_source, "NeoPixel - #ffffff");
    }

    #[test]
    fn test_indicator_off_after_failed_processing() {
        let colors = Arc::new(Mutex::new(Vec::new()));
        let Rig { controller, .. } = rig(gradient_frame(), false);
        let mut controller = controller.with_indicator(Box::new(MockIndicator { colors: colors.clone() }));
        controller.prepare().unwrap();
        controller.set_crop(CropBox::new(5, 0, 3, 4)).unwrap();
        controller.measure().unwrap();

        assert!(controller.process().is_err());

        assert_eq!(colors.lock().unwrap().last(), Some(&Rgb::BLACK));
        assert!(controller.status().starts_with("Check the crop area"));
    }

    #[test]
    fn test_shutdown_closes_camera() {
        let mut rig = rig(gradient_frame(), false);
        rig.controller.prepare().unwrap();

        rig.controller.shutdown().unwrap();
        rig.controller.shutdown().unwrap();

        assert_eq!(rig.controller.camera_state(), SessionState::Closed);
        assert!(matches!(rig.controller.measure(), Err(SpectroError::InvalidState { .. })));
    }
}
