use std::ops::Range;
use std::rc::Rc;

use crate::shared::constants::MAX_PROBED_DEVICES;

use super::camera_device::{CameraBackend, CaptureError, DeviceDescriptor};

/// Probes a fixed range of device indices and reports the ones that open.
pub struct DeviceEnumerator {
    backend: Rc<dyn CameraBackend>,
    probe_range: Range<u32>,
}

impl DeviceEnumerator {
    pub fn new(backend: Rc<dyn CameraBackend>) -> Self {
        Self::with_probe_range(backend, 0..MAX_PROBED_DEVICES)
    }

    pub fn with_probe_range(backend: Rc<dyn CameraBackend>, probe_range: Range<u32>) -> Self {
        Self {
            backend,
            probe_range,
        }
    }

    /// Opens and immediately releases each candidate index, ascending.
    ///
    /// Indices that fail to open are skipped; absence is expected.
    pub fn scan(&self) -> Vec<DeviceDescriptor> {
        self.scan_excluding(None)
    }

    /// Like [`scan`](Self::scan) but never touches `skip`, so a device held
    /// elsewhere is not opened a second time.
    pub fn scan_excluding(&self, skip: Option<u32>) -> Vec<DeviceDescriptor> {
        let mut found = Vec::new();
        for index in self.probe_range.clone() {
            if Some(index) == skip {
                continue;
            }
            match self.backend.open(index) {
                Ok(device) => {
                    drop(device);
                    found.push(DeviceDescriptor::new(index));
                }
                Err(e) => log::debug!("Probe of device {index} failed: {e}"),
            }
        }
        log::debug!("Device scan found {} device(s)", found.len());
        found
    }

    /// Startup variant of [`scan`](Self::scan): an empty result is fatal.
    pub fn scan_required(&self) -> Result<Vec<DeviceDescriptor>, CaptureError> {
        let found = self.scan();
        if found.is_empty() {
            return Err(CaptureError::NoDevicesFound);
        }
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;

    fn enumerator(openable: &[u32]) -> (DeviceEnumerator, Rc<crate::testing::DeviceLedger>) {
        let backend = MockBackend::new(openable);
        let ledger = backend.ledger();
        (DeviceEnumerator::new(Rc::new(backend)), ledger)
    }

    #[test]
    fn test_scan_returns_only_openable_indices() {
        let (enumerator, _) = enumerator(&[0, 3]);
        let found = enumerator.scan();
        assert_eq!(found, vec![DeviceDescriptor::new(0), DeviceDescriptor::new(3)]);
        assert_eq!(found[0].display_name(), "Webcam 0");
        assert_eq!(found[1].display_name(), "Webcam 3");
    }

    #[test]
    fn test_scan_probes_every_index_in_ascending_order() {
        let (enumerator, ledger) = enumerator(&[0, 3]);
        enumerator.scan();
        assert_eq!(ledger.open_calls(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_scan_releases_every_probed_device() {
        let (enumerator, ledger) = enumerator(&[1, 2, 5]);
        enumerator.scan();
        assert_eq!(ledger.open_now(), 0);
        assert_eq!(ledger.max_open(), 1);
    }

    #[test]
    fn test_scan_is_deterministic() {
        let (enumerator, _) = enumerator(&[7, 2, 9, 4]);
        let first = enumerator.scan();
        let second = enumerator.scan();
        assert_eq!(first, second);
        let indices: Vec<u32> = first.iter().map(|d| d.index()).collect();
        assert_eq!(indices, vec![2, 4, 7, 9]);
    }

    #[test]
    fn test_indices_outside_probe_range_are_ignored() {
        let (enumerator, _) = enumerator(&[4, 12]);
        let indices: Vec<u32> = enumerator.scan().iter().map(|d| d.index()).collect();
        assert_eq!(indices, vec![4]);
    }

    #[test]
    fn test_scan_empty_when_nothing_opens() {
        let (enumerator, _) = enumerator(&[]);
        assert!(enumerator.scan().is_empty());
    }

    #[test]
    fn test_scan_required_fails_when_nothing_opens() {
        let (enumerator, _) = enumerator(&[]);
        assert!(matches!(
            enumerator.scan_required(),
            Err(CaptureError::NoDevicesFound)
        ));
    }

    #[test]
    fn test_scan_excluding_never_opens_skipped_index() {
        let (enumerator, ledger) = enumerator(&[0, 2, 3]);

        let found = enumerator.scan_excluding(Some(2));

        assert_eq!(found, vec![DeviceDescriptor::new(0), DeviceDescriptor::new(3)]);
        assert!(!ledger.open_calls().contains(&2));
        assert_eq!(ledger.open_calls().len(), 9);
    }

    #[test]
    fn test_custom_probe_range() {
        let backend = MockBackend::new(&[0, 1, 2]);
        let enumerator = DeviceEnumerator::with_probe_range(Rc::new(backend), 1..2);
        assert_eq!(enumerator.scan(), vec![DeviceDescriptor::new(1)]);
    }
}
